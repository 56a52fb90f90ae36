pub use anyhow::{anyhow, bail, ensure, Context};
pub use log;
pub use ndarray::{array, s, Array, Array1, Array3, Array4, Axis, Zip};
pub use serde::{Deserialize, Serialize};
pub use std::ffi::OsStr;
pub use std::fs::File;
pub use std::path::{Path, PathBuf};

pub use crate::error::ModelError;
pub use crate::traits::*;
