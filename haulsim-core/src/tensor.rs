//! Module containing the labeled vehicle-variant tensors consumed by the
//! energy model.
//!
//! Parameters such as driving mass or drag coefficient vary over scenario
//! year, powertrain, and size class. [`ParamTensor`] pairs the numeric data
//! with explicit [`VariantAxes`] so that dimension alignment is checked
//! against labels at the call boundary instead of by positional convention.

use crate::imports::*;

/// Named coordinates of the vehicle-variant dimensions, in storage order
/// (year, powertrain, size).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct VariantAxes {
    /// scenario years
    pub years: Vec<u32>,
    /// powertrain labels, e.g. "ICEV-d", "BEV"
    pub powertrains: Vec<String>,
    /// size-class labels, e.g. "18t", "40t"
    pub sizes: Vec<String>,
}

impl VariantAxes {
    pub fn new(
        years: Vec<u32>,
        powertrains: Vec<String>,
        sizes: Vec<String>,
    ) -> Result<Self, ModelError> {
        if years.is_empty() || powertrains.is_empty() || sizes.is_empty() {
            return Err(ModelError::Configuration(
                "variant axes must each carry at least one coordinate".to_string(),
            ));
        }
        Ok(Self {
            years,
            powertrains,
            sizes,
        })
    }

    /// Convenience constructor from label slices.
    pub fn from_labels(
        years: &[u32],
        powertrains: &[&str],
        sizes: &[&str],
    ) -> Result<Self, ModelError> {
        Self::new(
            years.to_vec(),
            powertrains.iter().map(|s| s.to_string()).collect(),
            sizes.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.years.len(), self.powertrains.len(), self.sizes.len()]
    }

    pub(crate) fn dim(&self) -> (usize, usize, usize) {
        (self.years.len(), self.powertrains.len(), self.sizes.len())
    }

    /// Storage index of the given coordinate labels, if all are present.
    pub fn index_of(&self, year: u32, powertrain: &str, size: &str) -> Option<(usize, usize, usize)> {
        let iy = self.years.iter().position(|y| *y == year)?;
        let ip = self.powertrains.iter().position(|p| p == powertrain)?;
        let is = self.sizes.iter().position(|s| s == size)?;
        Some((iy, ip, is))
    }
}

impl SerdeAPI for VariantAxes {}

/// A scalar vehicle parameter laid out over [`VariantAxes`].
///
/// Value object: the energy model never mutates tensors handed to it and
/// returns freshly allocated ones.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParamTensor {
    axes: VariantAxes,
    data: Array3<f64>,
}

impl SerdeAPI for ParamTensor {
    fn init(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.data.dim() == self.axes.dim(),
            "tensor data shape {:?} disagrees with axes shape {:?}",
            self.data.shape(),
            self.axes.shape()
        );
        Ok(())
    }
}

impl ParamTensor {
    pub fn new(axes: VariantAxes, data: Array3<f64>) -> Result<Self, ModelError> {
        if data.dim() != axes.dim() {
            return Err(ModelError::ShapeMismatch {
                name: "tensor data".to_string(),
                expected: axes.shape().to_vec(),
                got: data.shape().to_vec(),
            });
        }
        Ok(Self { axes, data })
    }

    /// Tensor holding `value` at every coordinate of `axes`.
    pub fn filled(axes: &VariantAxes, value: f64) -> Self {
        Self {
            axes: axes.clone(),
            data: Array3::from_elem(axes.dim(), value),
        }
    }

    /// Construct from data known to match `axes` (engine outputs).
    pub(crate) fn from_raw(axes: VariantAxes, data: Array3<f64>) -> Self {
        Self { axes, data }
    }

    pub fn axes(&self) -> &VariantAxes {
        &self.axes
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn shape(&self) -> [usize; 3] {
        self.axes.shape()
    }

    /// Value at the given coordinate labels, if all are present.
    pub fn get(&self, year: u32, powertrain: &str, size: &str) -> Option<f64> {
        let (iy, ip, is) = self.axes.index_of(year, powertrain, size)?;
        Some(self.data[[iy, ip, is]])
    }

    pub(crate) fn check_axes(&self, name: &str, expected: &VariantAxes) -> Result<(), ModelError> {
        if self.axes != *expected {
            return Err(ModelError::ShapeMismatch {
                name: name.to_string(),
                expected: expected.shape().to_vec(),
                got: self.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Every element finite and within `min..=max`; `min_exclusive` makes the
    /// lower bound open, e.g. for efficiencies in (0, 1].
    pub(crate) fn check_range(
        &self,
        name: &str,
        min: f64,
        max: f64,
        min_exclusive: bool,
    ) -> Result<(), ModelError> {
        for &v in self.data.iter() {
            let below = if min_exclusive { v <= min } else { v < min };
            if !v.is_finite() || below || v > max {
                let allowed = if min_exclusive {
                    format!("({min}, {max}]")
                } else {
                    format!("[{min}, {max}]")
                };
                return Err(ModelError::Domain {
                    name: name.to_string(),
                    value: v,
                    allowed,
                });
            }
        }
        Ok(())
    }

    /// Every element finite and at least `min`.
    pub(crate) fn check_min(&self, name: &str, min: f64) -> Result<(), ModelError> {
        for &v in self.data.iter() {
            if !v.is_finite() || v < min {
                return Err(ModelError::Domain {
                    name: name.to_string(),
                    value: v,
                    allowed: format!(">= {min}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_axes() -> VariantAxes {
        VariantAxes::from_labels(&[2020, 2030], &["ICEV-d", "BEV"], &["18t", "40t"]).unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_data() {
        let err = ParamTensor::new(test_axes(), Array3::zeros((2, 2, 3))).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_label_lookup() {
        let mut data = Array3::zeros((2, 2, 2));
        data[[1, 0, 1]] = 16_000.0;
        let mass = ParamTensor::new(test_axes(), data).unwrap();
        assert_eq!(mass.get(2030, "ICEV-d", "40t"), Some(16_000.0));
        assert_eq!(mass.get(2030, "ICEV-d", "26t"), None);
        assert_eq!(mass.get(2031, "ICEV-d", "40t"), None);
    }

    #[test]
    fn test_empty_axis_rejected() {
        let err = VariantAxes::from_labels(&[], &["BEV"], &["40t"]).unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn test_check_range_open_lower_bound() {
        let axes = test_axes();
        let eff = ParamTensor::filled(&axes, 0.0);
        assert!(eff.check_range("ttw_efficiency", 0.0, 1.0, true).is_err());
        assert!(eff.check_range("rr_coef", 0.0, 1.0, false).is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let tensor = ParamTensor::filled(&test_axes(), 0.006);
        let json = tensor.to_json().unwrap();
        assert_eq!(ParamTensor::from_json(json).unwrap(), tensor);
    }

    #[test]
    fn test_init_rejects_corrupt_serialization() {
        let axes = VariantAxes::from_labels(&[2020], &["BEV"], &["40t"]).unwrap();
        let good = ParamTensor::filled(&axes, 1.0).to_json().unwrap();
        // axes claim one size class; hand the data a second one
        let bad = good.replace("\"40t\"", "\"40t\",\"60t\"");
        assert!(ParamTensor::from_json(bad).is_err());
    }
}
