#[cfg(feature = "resources")]
pub use crate::cycle::BUILTIN_CYCLES;
pub use crate::cycle::{
    CycleElement, CycleInput, CycleRegistry, CycleSource, DriveCycle, GradientSource,
};
pub use crate::energy::{EnergyModel, MotivePowerSeries};
pub use crate::error::ModelError;
pub use crate::params::{PhysicalProperties, CUSTOM_CYCLE_NAME};
pub use crate::tensor::{ParamTensor, VariantAxes};
pub use crate::traits::SerdeAPI;
