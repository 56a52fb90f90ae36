//! Module containing the per-kilometer energy consumption model.
//!
//! [`EnergyModel`] fixes the velocity, acceleration, and road-gradient
//! series of a driving cycle at construction and exposes two calculators:
//! [`EnergyModel::aux_energy_per_km`] for non-motive loads and
//! [`EnergyModel::motive_energy_per_km`] for the traction energy balance
//! with braking-loss recuperation. Both broadcast the time series against
//! labeled vehicle-variant tensors and return energy in kJ/km.

#[cfg(feature = "resources")]
use crate::cycle::BUILTIN_CYCLES;
use crate::cycle::{CycleInput, CycleRegistry, CycleSource, GradientSource};
use crate::imports::*;
use crate::params::*;
use crate::tensor::{ParamTensor, VariantAxes};
use crate::utils::*;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnergyModel {
    /// identity of the resolved cycle
    cycle_name: String,
    /// speed [m/s] per second of cycle
    velocity: Array1<f64>,
    /// acceleration [m/s^2]; centered difference of velocity over the 1 s
    /// step, zero at both ends
    acceleration: Array1<f64>,
    /// road gradient [rad], positive uphill
    grade: Array1<f64>,
    props: PhysicalProperties,
}

/// Per-second force terms of the traction balance [N], broadcast over
/// (time, year, powertrain, size). `braking` is the magnitude of the
/// decelerating share of `inertia`; it is the recoverable channel and is
/// never part of the net resistance.
struct MotiveTerms {
    rolling: Array4<f64>,
    air: Array4<f64>,
    gradient: Array4<f64>,
    inertia: Array4<f64>,
    braking: Array4<f64>,
}

/// Per-second decomposition of the traction power balance, for diagnostics.
/// Same physics as [`EnergyModel::motive_energy_per_km`], but without time
/// aggregation or distance normalization, and without recuperation.
#[derive(Debug, Clone, PartialEq)]
pub struct MotivePowerSeries {
    pub axes: VariantAxes,
    /// power against rolling resistance [W]
    pub rolling_resistance: Array4<f64>,
    /// power against aerodynamic drag [W]
    pub air_resistance: Array4<f64>,
    /// power against the gravity component of road grade [W]
    pub gradient_resistance: Array4<f64>,
    /// power into (or out of) vehicle inertia [W]
    pub inertia: Array4<f64>,
    /// recoverable braking power [W]
    pub braking_loss: Array4<f64>,
    /// net traction power, clipped at zero [W]
    pub total_power: Array4<f64>,
    /// engine-side power demand [kW]
    pub energy: Array4<f64>,
}

impl EnergyModel {
    /// Model over the builtin cycle registry with default physical
    /// properties; `rho_air` [kg/m^3] overrides the default air density.
    #[cfg(feature = "resources")]
    pub fn new(cycle: CycleInput, rho_air: Option<f64>) -> Result<Self, ModelError> {
        Self::from_registry(cycle, &BUILTIN_CYCLES, rho_air)
    }

    /// Model over a caller-supplied registry acting as both cycle and
    /// gradient resolver.
    pub fn from_registry(
        cycle: CycleInput,
        registry: &CycleRegistry,
        rho_air: Option<f64>,
    ) -> Result<Self, ModelError> {
        let mut props = PhysicalProperties::default();
        if let Some(rho_air) = rho_air {
            props.air_density_kg_per_m3 = rho_air;
        }
        Self::from_sources(cycle, registry, registry, props)
    }

    /// Resolves the cycle, validates it, and derives the velocity [m/s],
    /// acceleration [m/s^2], and gradient [rad] series.
    ///
    /// Explicit speed traces resolve under the identity
    /// [`CUSTOM_CYCLE_NAME`]; a gradient table registered for that identity
    /// must match the trace length, and flat roads are assumed when none is
    /// registered.
    pub fn from_sources(
        cycle: CycleInput,
        cycles: &dyn CycleSource,
        gradients: &dyn GradientSource,
        props: PhysicalProperties,
    ) -> Result<Self, ModelError> {
        let (kph, cycle_name) = match cycle {
            CycleInput::Named(name) => {
                let kph = cycles.resolve(&name).map_err(|err| {
                    ModelError::Configuration(format!(
                        "driving cycle `{name}` could not be resolved: {err}"
                    ))
                })?;
                (kph, name)
            }
            CycleInput::Explicit(kph) => (kph, CUSTOM_CYCLE_NAME.to_string()),
        };
        if kph.is_empty() {
            return Err(ModelError::Configuration(format!(
                "driving cycle `{cycle_name}` is empty"
            )));
        }
        if let Some(bad) = kph.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ModelError::Configuration(format!(
                "invalid speed sample {bad} km/h in driving cycle `{cycle_name}`"
            )));
        }
        let grade_deg = match gradients.resolve_gradient(&cycle_name).map_err(|err| {
            ModelError::Configuration(format!(
                "gradient for cycle `{cycle_name}` could not be resolved: {err}"
            ))
        })? {
            Some(grade) => {
                if grade.len() != kph.len() {
                    return Err(ModelError::ShapeMismatch {
                        name: "gradient".to_string(),
                        expected: vec![kph.len()],
                        got: vec![grade.len()],
                    });
                }
                grade
            }
            None => Array1::zeros(kph.len()),
        };

        let velocity = kph.mapv(|v| v * MPS_PER_KPH);
        let acceleration = centered_diff(&velocity);
        let grade = deg_to_rad(&grade_deg);
        log::debug!(
            "resolved cycle `{}`: {} s, {:.0} m",
            cycle_name,
            velocity.len(),
            velocity.sum()
        );
        Ok(Self {
            cycle_name,
            velocity,
            acceleration,
            grade,
            props,
        })
    }

    pub fn cycle_name(&self) -> &str {
        &self.cycle_name
    }

    /// speed [m/s] per second of cycle
    pub fn velocity(&self) -> &Array1<f64> {
        &self.velocity
    }

    /// acceleration [m/s^2] per second of cycle
    pub fn acceleration(&self) -> &Array1<f64> {
        &self.acceleration
    }

    /// road gradient [rad] per second of cycle
    pub fn grade(&self) -> &Array1<f64> {
        &self.grade
    }

    pub fn props(&self) -> &PhysicalProperties {
        &self.props
    }

    /// cycle duration [s]
    pub fn seconds(&self) -> usize {
        self.velocity.len()
    }

    /// distance covered by the cycle [m]
    pub fn distance_m(&self) -> f64 {
        self.velocity.sum()
    }

    /// Energy for non-motive loads (HVAC, electronics) per km driven, in
    /// kJ/km over the axes of `aux_power`.
    ///
    /// # Arguments
    /// - `aux_power`: total auxiliary power draw [W]
    /// - `efficiency`: generation efficiency in (0, 1], defaults to 1.
    ///   Battery-electric vehicles should pass 1 here; battery losses are
    ///   accounted elsewhere.
    ///
    /// The draw is treated as constant over the cycle duration and
    /// normalized by the distance traveled. A zero-distance cycle yields
    /// non-finite values, which propagate to the caller.
    pub fn aux_energy_per_km(
        &self,
        aux_power: &ParamTensor,
        efficiency: Option<&ParamTensor>,
    ) -> Result<ParamTensor, ModelError> {
        if let Some(eff) = efficiency {
            eff.check_axes("efficiency", aux_power.axes())?;
            eff.check_range("efficiency", 0.0, 1.0, true)?;
        }
        let distance_m = self.distance_m();
        if distance_m == 0.0 {
            log::warn!(
                "cycle `{}` covers zero distance; auxiliary energy per km is not finite",
                self.cycle_name
            );
        }
        let seconds = self.velocity.len() as f64;
        // W * s -> J, J/m -> J/km -> kJ/km
        let mut energy = aux_power.data() * (seconds / distance_m * M_PER_KM / J_PER_KJ);
        if let Some(eff) = efficiency {
            energy = energy / eff.data();
        }
        Ok(ParamTensor::from_raw(aux_power.axes().clone(), energy))
    }

    /// Net energy demand at the engine per km driven, in kJ/km over the
    /// shared axes of the parameter tensors.
    ///
    /// # Arguments
    /// - `driving_mass`: mass of vehicle plus payload [kg]
    /// - `rr_coef`: rolling resistance coefficient, in [0, 1]
    /// - `drag_coef`: aerodynamic drag coefficient, in [0, 1]
    /// - `frontal_area`: frontal area [m^2]
    /// - `ttw_efficiency`: tank-to-wheel efficiency, in (0, 1]
    /// - `recuperation_efficiency`: recoverable fraction of braking power,
    ///   in [0, 1], defaults to 0
    /// - `motor_power_kw`: electric motor rating [kW] bounding recuperation,
    ///   defaults to 0
    ///
    /// Per second, net traction power is clipped at zero (deceleration is
    /// no negative draw at the engine), recuperated braking power is
    /// clipped to the motor rating and subtracted, and the result is
    /// aggregated over the cycle, then divided by distance [km], by
    /// `ttw_efficiency`, and by 1000 (J -> kJ), in that order. The net
    /// value is not clipped again after the recuperation subtraction.
    pub fn motive_energy_per_km(
        &self,
        driving_mass: &ParamTensor,
        rr_coef: &ParamTensor,
        drag_coef: &ParamTensor,
        frontal_area: &ParamTensor,
        ttw_efficiency: &ParamTensor,
        recuperation_efficiency: Option<&ParamTensor>,
        motor_power_kw: Option<&ParamTensor>,
    ) -> Result<ParamTensor, ModelError> {
        self.check_motive_params(driving_mass, rr_coef, drag_coef, frontal_area, ttw_efficiency)?;
        let axes = driving_mass.axes();
        if let Some(recup) = recuperation_efficiency {
            recup.check_axes("recuperation_efficiency", axes)?;
            recup.check_range("recuperation_efficiency", 0.0, 1.0, false)?;
        }
        if let Some(motor) = motor_power_kw {
            motor.check_axes("motor_power_kw", axes)?;
            motor.check_min("motor_power_kw", 0.0)?;
        }

        let terms = self.motive_terms(driving_mass, rr_coef, drag_coef, frontal_area);
        // force -> power at the wheels, no negative draw at the engine
        let mut total_power = &terms.rolling + &terms.air + &terms.gradient + &terms.inertia;
        for (i, mut lane) in total_power.outer_iter_mut().enumerate() {
            let v = self.velocity[i];
            lane.mapv_inplace(|f| (f * v).max(0.0));
        }

        let recup = match recuperation_efficiency {
            Some(tensor) => tensor.data().clone(),
            None => Array3::zeros(axes.dim()),
        };
        let cap_w = match motor_power_kw {
            Some(tensor) => tensor.data() * W_PER_KW,
            None => Array3::zeros(axes.dim()),
        };
        for (i, braking) in terms.braking.outer_iter().enumerate() {
            let v = self.velocity[i];
            let recuperated = Zip::from(braking)
                .and(&recup)
                .and(&cap_w)
                .map_collect(|&b, &r, &cap| (b * r * v).clamp(0.0, cap));
            let mut lane = total_power.index_axis_mut(Axis(0), i);
            lane -= &recuperated;
        }

        let distance_km = self.distance_m() / M_PER_KM;
        let mut energy = total_power.sum_axis(Axis(0));
        energy /= distance_km;
        energy = energy / ttw_efficiency.data();
        energy /= J_PER_KJ;
        Ok(ParamTensor::from_raw(axes.clone(), energy))
    }

    /// Per-second decomposition of the traction power balance; see
    /// [`MotivePowerSeries`].
    pub fn motive_power_series(
        &self,
        driving_mass: &ParamTensor,
        rr_coef: &ParamTensor,
        drag_coef: &ParamTensor,
        frontal_area: &ParamTensor,
        ttw_efficiency: &ParamTensor,
    ) -> Result<MotivePowerSeries, ModelError> {
        self.check_motive_params(driving_mass, rr_coef, drag_coef, frontal_area, ttw_efficiency)?;
        let axes = driving_mass.axes();

        let terms = self.motive_terms(driving_mass, rr_coef, drag_coef, frontal_area);
        let mut total_power = &terms.rolling + &terms.air + &terms.gradient + &terms.inertia;
        let MotiveTerms {
            mut rolling,
            mut air,
            mut gradient,
            mut inertia,
            mut braking,
        } = terms;
        for i in 0..self.velocity.len() {
            let v = self.velocity[i];
            rolling.index_axis_mut(Axis(0), i).mapv_inplace(|f| f * v);
            air.index_axis_mut(Axis(0), i).mapv_inplace(|f| f * v);
            gradient.index_axis_mut(Axis(0), i).mapv_inplace(|f| f * v);
            inertia.index_axis_mut(Axis(0), i).mapv_inplace(|f| f * v);
            braking.index_axis_mut(Axis(0), i).mapv_inplace(|f| f * v);
            total_power
                .index_axis_mut(Axis(0), i)
                .mapv_inplace(|f| (f * v).max(0.0));
        }

        let mut energy = total_power.clone();
        for mut lane in energy.outer_iter_mut() {
            lane /= ttw_efficiency.data();
        }
        energy /= J_PER_KJ;

        Ok(MotivePowerSeries {
            axes: axes.clone(),
            rolling_resistance: rolling,
            air_resistance: air,
            gradient_resistance: gradient,
            inertia,
            braking_loss: braking,
            total_power,
            energy,
        })
    }

    fn check_motive_params(
        &self,
        driving_mass: &ParamTensor,
        rr_coef: &ParamTensor,
        drag_coef: &ParamTensor,
        frontal_area: &ParamTensor,
        ttw_efficiency: &ParamTensor,
    ) -> Result<(), ModelError> {
        let axes = driving_mass.axes();
        rr_coef.check_axes("rr_coef", axes)?;
        rr_coef.check_range("rr_coef", 0.0, 1.0, false)?;
        drag_coef.check_axes("drag_coef", axes)?;
        drag_coef.check_range("drag_coef", 0.0, 1.0, false)?;
        frontal_area.check_axes("frontal_area", axes)?;
        ttw_efficiency.check_axes("ttw_efficiency", axes)?;
        ttw_efficiency.check_range("ttw_efficiency", 0.0, 1.0, true)?;
        Ok(())
    }

    /// Force terms per second [N] over (time, year, powertrain, size).
    fn motive_terms(
        &self,
        driving_mass: &ParamTensor,
        rr_coef: &ParamTensor,
        drag_coef: &ParamTensor,
        frontal_area: &ParamTensor,
    ) -> MotiveTerms {
        let mass = driving_mass.data();
        let g = self.props.a_grav_mps2;
        let (ny, np, ns) = driving_mass.axes().dim();
        let dim = (self.velocity.len(), ny, np, ns);

        // time-invariant factors
        let rolling_n = mass * rr_coef.data() * g;
        let drag_factor =
            frontal_area.data() * drag_coef.data() * (self.props.air_density_kg_per_m3 / 2.0);

        let mut terms = MotiveTerms {
            rolling: Array4::zeros(dim),
            air: Array4::zeros(dim),
            gradient: Array4::zeros(dim),
            inertia: Array4::zeros(dim),
            braking: Array4::zeros(dim),
        };
        for i in 0..self.velocity.len() {
            let v = self.velocity[i];
            terms.rolling.index_axis_mut(Axis(0), i).assign(&rolling_n);
            terms
                .air
                .index_axis_mut(Axis(0), i)
                .assign(&(&drag_factor * (v * v)));
            terms
                .gradient
                .index_axis_mut(Axis(0), i)
                .assign(&(mass * (g * self.grade[i].sin())));
            let inertia = mass * self.acceleration[i];
            terms
                .braking
                .index_axis_mut(Axis(0), i)
                .assign(&inertia.mapv(|f| (-f).max(0.0)));
            terms.inertia.index_axis_mut(Axis(0), i).assign(&inertia);
        }
        terms
    }
}
