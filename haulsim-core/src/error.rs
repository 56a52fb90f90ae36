//! Module containing the typed errors raised by the modeling API.

use thiserror::Error;

/// Errors raised synchronously by cycle resolution and the energy
/// calculators. Serialization helpers report [`anyhow::Error`] instead; only
/// the modeling surface uses this taxonomy.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Unresolvable cycle name or invalid cycle input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Parameter tensor or series not alignable with the model's shapes.
    #[error("shape mismatch for `{name}`: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Physical coefficient outside its documented range.
    #[error("`{name}` out of range: got {value}, allowed {allowed}")]
    Domain {
        name: String,
        value: f64,
        allowed: String,
    },
}
