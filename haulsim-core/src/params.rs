//! Module containing unit conversions and ambient physical properties.

use crate::imports::*;

/// Unit conversions that should NEVER change
pub const MPS_PER_KPH: f64 = 1000.0 / 3600.0;
pub const M_PER_KM: f64 = 1000.0;
pub const J_PER_KJ: f64 = 1000.0;
pub const W_PER_KW: f64 = 1000.0;

/// Identity assigned to explicit (caller-supplied) speed traces.
pub const CUSTOM_CYCLE_NAME: &str = "custom";

/// Ambient physical properties entering the force balance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhysicalProperties {
    /// air density [kg/m^3]; 1.204 at 23 C, the WLTC test temperature
    pub air_density_kg_per_m3: f64,
    /// gravitational acceleration [m/s^2]
    pub a_grav_mps2: f64,
}

impl Default for PhysicalProperties {
    fn default() -> Self {
        Self {
            air_density_kg_per_m3: 1.204,
            a_grav_mps2: 9.81,
        }
    }
}

impl SerdeAPI for PhysicalProperties {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kph_conversion() {
        // 72 km/h is exactly 20 m/s
        assert_eq!(72.0 * MPS_PER_KPH, 20.0);
    }

    #[test]
    fn test_default_props() {
        let props = PhysicalProperties::default();
        assert_eq!(props.air_density_kg_per_m3, 1.204);
        assert_eq!(props.a_grav_mps2, 9.81);
    }

    #[test]
    fn test_props_yaml_round_trip() {
        let props = PhysicalProperties::default();
        let yaml = props.to_yaml().unwrap();
        assert_eq!(PhysicalProperties::from_yaml(yaml).unwrap(), props);
    }
}
