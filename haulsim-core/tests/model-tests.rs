use haulsim_core::prelude::*;
use ndarray::{array, Array3};

fn demo_axes() -> VariantAxes {
    VariantAxes::from_labels(
        &[2020, 2030],
        &["ICEV-d", "HEV-d", "BEV"],
        &["18t", "40t"],
    )
    .unwrap()
}

fn demo_masses(axes: &VariantAxes) -> ParamTensor {
    let mut data = Array3::zeros((2, 3, 2));
    for iy in 0..2 {
        for ip in 0..3 {
            data[[iy, ip, 0]] = 14_000.0 + 500.0 * ip as f64;
            data[[iy, ip, 1]] = 28_000.0 + 500.0 * ip as f64;
        }
    }
    ParamTensor::new(axes.clone(), data).unwrap()
}

#[test]
#[cfg(feature = "resources")]
fn test_standard_cycle_end_to_end() {
    let axes = demo_axes();
    let mass = demo_masses(&axes);
    let rr = ParamTensor::filled(&axes, 0.0055);
    let drag = ParamTensor::filled(&axes, 0.55);
    let area = ParamTensor::filled(&axes, 7.5);
    let ttw = ParamTensor::filled(&axes, 0.4);
    let aux = ParamTensor::filled(&axes, 2_200.0);

    for cycle in ["Urban delivery", "Regional delivery", "Long haul"] {
        let model = EnergyModel::new(CycleInput::from(cycle), None).unwrap();
        assert!(model.distance_m() > 0.0);

        let aux_energy = model.aux_energy_per_km(&aux, None).unwrap();
        let motive_energy = model
            .motive_energy_per_km(&mass, &rr, &drag, &area, &ttw, None, None)
            .unwrap();
        assert_eq!(aux_energy.shape(), axes.shape());
        assert_eq!(motive_energy.shape(), axes.shape());
        for &value in aux_energy.data().iter().chain(motive_energy.data().iter()) {
            assert!(value.is_finite());
            assert!(value > 0.0);
        }
    }
}

#[test]
#[cfg(feature = "resources")]
fn test_recuperation_lowers_urban_energy() {
    let axes = demo_axes();
    let mass = demo_masses(&axes);
    let rr = ParamTensor::filled(&axes, 0.0055);
    let drag = ParamTensor::filled(&axes, 0.55);
    let area = ParamTensor::filled(&axes, 7.5);
    let ttw = ParamTensor::filled(&axes, 0.4);
    let recup = ParamTensor::filled(&axes, 0.55);
    let motor = ParamTensor::filled(&axes, 240.0);

    let model = EnergyModel::new(CycleInput::from("Urban delivery"), None).unwrap();
    let without = model
        .motive_energy_per_km(&mass, &rr, &drag, &area, &ttw, None, None)
        .unwrap();
    let with = model
        .motive_energy_per_km(&mass, &rr, &drag, &area, &ttw, Some(&recup), Some(&motor))
        .unwrap();
    for (w, wo) in with.data().iter().zip(without.data().iter()) {
        assert!(w < wo);
    }
    assert!(with.get(2030, "BEV", "40t").unwrap() > 0.0);
}

#[test]
#[cfg(feature = "resources")]
fn test_denser_air_costs_more() {
    let axes = demo_axes();
    let mass = demo_masses(&axes);
    let rr = ParamTensor::filled(&axes, 0.0055);
    let drag = ParamTensor::filled(&axes, 0.55);
    let area = ParamTensor::filled(&axes, 7.5);
    let ttw = ParamTensor::filled(&axes, 0.4);

    let mild = EnergyModel::new(CycleInput::from("Long haul"), None).unwrap();
    let cold = EnergyModel::new(CycleInput::from("Long haul"), Some(1.34)).unwrap();
    let mild_energy = mild
        .motive_energy_per_km(&mass, &rr, &drag, &area, &ttw, None, None)
        .unwrap();
    let cold_energy = cold
        .motive_energy_per_km(&mass, &rr, &drag, &area, &ttw, None, None)
        .unwrap();
    for (c, m) in cold_energy.data().iter().zip(mild_energy.data().iter()) {
        assert!(c > m);
    }
}

#[test]
fn test_custom_cycle_with_registered_gradient() {
    let mut registry = CycleRegistry::new();
    registry
        .register(DriveCycle {
            name: String::from("depot-loop"),
            kph: array![0.0, 15.0, 30.0, 40.0, 30.0, 15.0, 0.0],
            grade_deg: array![0.0, 0.0, 1.5, 1.5, -1.5, -1.5, 0.0],
        })
        .unwrap();
    registry.register_gradient(CUSTOM_CYCLE_NAME, ndarray::Array1::from_elem(7, 1.0));

    let named =
        EnergyModel::from_registry(CycleInput::from("depot-loop"), &registry, None).unwrap();
    assert_eq!(named.cycle_name(), "depot-loop");
    assert!(named.grade().iter().any(|g| *g != 0.0));

    let custom = EnergyModel::from_registry(
        CycleInput::from(vec![0.0, 15.0, 30.0, 40.0, 30.0, 15.0, 0.0]),
        &registry,
        None,
    )
    .unwrap();
    assert_eq!(custom.cycle_name(), CUSTOM_CYCLE_NAME);
    assert!(custom.grade().iter().all(|g| *g > 0.0));
}

#[test]
fn test_value_objects_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();

    let cycle = DriveCycle {
        name: String::from("depot-loop"),
        kph: array![0.0, 20.0, 40.0, 20.0, 0.0],
        grade_deg: array![0.0, 0.5, 0.0, -0.5, 0.0],
    };
    let cycle_path = dir.path().join("depot-loop.yaml");
    cycle.to_file(&cycle_path).unwrap();
    assert_eq!(DriveCycle::from_file(&cycle_path).unwrap(), cycle);

    let csv_path = dir.path().join("depot-loop.csv");
    cycle.to_file(&csv_path).unwrap();
    let from_csv = DriveCycle::from_csv_file(&csv_path).unwrap();
    assert_eq!(from_csv.name, "depot-loop");
    assert_eq!(from_csv.kph, cycle.kph);

    let tensor = ParamTensor::filled(&demo_axes(), 0.0055);
    let tensor_path = dir.path().join("rr_coef.json");
    tensor.to_file(&tensor_path).unwrap();
    assert_eq!(ParamTensor::from_file(&tensor_path).unwrap(), tensor);
}
