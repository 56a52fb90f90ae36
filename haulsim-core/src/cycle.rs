//! Module containing drive cycle structs, input resolution, and the cycle
//! registry.

use std::collections::HashMap;

#[cfg(feature = "resources")]
use lazy_static::lazy_static;

// local
use crate::imports::*;

/// One second of a drive cycle. Used for vec-like operations and CSV rows.
#[derive(Default, PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct CycleElement {
    /// speed [km/h]
    pub kph: f64,
    /// road gradient [deg], positive uphill
    #[serde(default)]
    pub grade_deg: Option<f64>,
}

/// Second-by-second heavy-truck speed trace with an aligned road-gradient
/// table. Sampling is uniform at 1 s.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DriveCycle {
    pub name: String,
    /// array of speed [km/h]
    pub kph: Array1<f64>,
    /// array of road gradient [deg], positive uphill
    #[serde(default)]
    pub grade_deg: Array1<f64>,
}

impl SerdeAPI for DriveCycle {
    const ACCEPTED_BYTE_FORMATS: &'static [&'static str] = &["yaml", "json", "bin", "csv"];
    const ACCEPTED_STR_FORMATS: &'static [&'static str] = &["yaml", "json", "csv"];

    fn init(&mut self) -> anyhow::Result<()> {
        ensure!(!self.kph.is_empty(), "drive cycle `{}` is empty", self.name);
        if self.grade_deg.is_empty() {
            self.grade_deg = Array1::zeros(self.kph.len());
        }
        ensure!(
            self.kph.len() == self.grade_deg.len(),
            "drive cycle `{}` has unequal field lengths\nkph: {}\ngrade_deg: {}",
            self.name,
            self.kph.len(),
            self.grade_deg.len(),
        );
        ensure!(
            self.kph.iter().all(|v| v.is_finite() && *v >= 0.0),
            format_dbg!(self.kph.iter().all(|v| v.is_finite() && *v >= 0.0))
        );
        ensure!(
            self.grade_deg.iter().all(|g| g.is_finite()),
            format_dbg!(self.grade_deg.iter().all(|g| g.is_finite()))
        );
        Ok(())
    }

    fn to_writer<W: std::io::Write>(&self, wtr: W, format: &str) -> anyhow::Result<()> {
        match format.trim_start_matches('.').to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::to_writer(wtr, self)?,
            "json" => serde_json::to_writer(wtr, self)?,
            "bin" => bincode::serialize_into(wtr, self)?,
            "csv" => {
                let mut wtr = csv::Writer::from_writer(wtr);
                for i in 0..self.len() {
                    wtr.serialize(CycleElement {
                        kph: self.kph[i],
                        grade_deg: Some(self.grade_deg[i]),
                    })?;
                }
                wtr.flush()?
            }
            _ => bail!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_BYTE_FORMATS
            ),
        }
        Ok(())
    }

    fn to_str(&self, format: &str) -> anyhow::Result<String> {
        Ok(
            match format.trim_start_matches('.').to_lowercase().as_str() {
                "yaml" | "yml" => self.to_yaml()?,
                "json" => self.to_json()?,
                "csv" => self.to_csv()?,
                _ => {
                    bail!(
                        "Unsupported format {format:?}, must be one of {:?}",
                        Self::ACCEPTED_STR_FORMATS
                    )
                }
            },
        )
    }

    /// Note that using this method to instantiate a DriveCycle from CSV,
    /// rather than the `from_csv_str` method, leaves the cycle name empty
    fn from_str<S: AsRef<str>>(contents: S, format: &str) -> anyhow::Result<Self> {
        Ok(
            match format.trim_start_matches('.').to_lowercase().as_str() {
                "yaml" | "yml" => Self::from_yaml(contents)?,
                "json" => Self::from_json(contents)?,
                "csv" => Self::from_reader(contents.as_ref().as_bytes(), "csv")?,
                _ => bail!(
                    "Unsupported format {format:?}, must be one of {:?}",
                    Self::ACCEPTED_STR_FORMATS
                ),
            },
        )
    }

    fn from_reader<R: std::io::Read>(rdr: R, format: &str) -> anyhow::Result<Self> {
        let mut deserialized = match format.trim_start_matches('.').to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::from_reader(rdr)?,
            "json" => serde_json::from_reader(rdr)?,
            "bin" => bincode::deserialize_from(rdr)?,
            "csv" => {
                // Create empty cycle to be populated
                let mut cyc = Self::default();
                let mut rdr = csv::Reader::from_reader(rdr);
                for result in rdr.deserialize() {
                    cyc.push(result?)?;
                }
                cyc
            }
            _ => {
                bail!(
                    "Unsupported format {format:?}, must be one of {:?}",
                    Self::ACCEPTED_BYTE_FORMATS
                )
            }
        };
        deserialized.init()?;
        Ok(deserialized)
    }
}

impl DriveCycle {
    /// Load cycle from CSV file, parsing name from filepath
    pub fn from_csv_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let name = filepath
            .file_stem()
            .and_then(OsStr::to_str)
            .with_context(|| format!("Could not parse cycle name from filepath: {filepath:?}"))?
            .to_string();
        let mut cyc = Self::from_file(filepath)?;
        cyc.name = name;
        Ok(cyc)
    }

    /// Load cycle from CSV string
    pub fn from_csv_str<S: AsRef<str>>(csv_str: S, name: String) -> anyhow::Result<Self> {
        let mut cyc = Self::from_str(csv_str, "csv")?;
        cyc.name = name;
        Ok(cyc)
    }

    /// Write (serialize) cycle to a CSV string
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut buf = Vec::with_capacity(self.len());
        self.to_writer(&mut buf, "csv")?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn push(&mut self, element: CycleElement) -> anyhow::Result<()> {
        self.kph.append(Axis(0), array![element.kph].view())?;
        self.grade_deg
            .append(Axis(0), array![element.grade_deg.unwrap_or(0.0)].view())?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.kph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Driving-cycle input: either the name of a registered cycle or an explicit
/// second-by-second speed trace [km/h]. Resolved once, at model construction.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleInput {
    Named(String),
    Explicit(Array1<f64>),
}

impl From<&str> for CycleInput {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for CycleInput {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Array1<f64>> for CycleInput {
    fn from(kph: Array1<f64>) -> Self {
        Self::Explicit(kph)
    }
}

impl From<Vec<f64>> for CycleInput {
    fn from(kph: Vec<f64>) -> Self {
        Self::Explicit(Array1::from_vec(kph))
    }
}

/// Resolver of cycle names to speed traces [km/h].
pub trait CycleSource {
    fn resolve(&self, name: &str) -> anyhow::Result<Array1<f64>>;
}

/// Resolver of cycle identities to aligned road-gradient tables [deg].
/// `Ok(None)` means no table is registered for the identity; the energy
/// model then assumes flat roads.
pub trait GradientSource {
    fn resolve_gradient(&self, identity: &str) -> anyhow::Result<Option<Array1<f64>>>;
}

/// In-memory store of drive cycles and standalone gradient tables, keyed by
/// cycle name. Acts as both [`CycleSource`] and [`GradientSource`].
#[derive(Debug, Clone, Default)]
pub struct CycleRegistry {
    cycles: HashMap<String, DriveCycle>,
    gradients: HashMap<String, Array1<f64>>,
}

/// Standard heavy-truck cycles shipped as embedded resources.
#[cfg(feature = "resources")]
pub const STANDARD_CYCLES: [(&str, &str); 3] = [
    ("Urban delivery", "cycles/urban_delivery.csv"),
    ("Regional delivery", "cycles/regional_delivery.csv"),
    ("Long haul", "cycles/long_haul.csv"),
];

impl CycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the standard heavy-truck cycles.
    #[cfg(feature = "resources")]
    pub fn builtin() -> anyhow::Result<Self> {
        let mut registry = Self::new();
        for (name, path) in STANDARD_CYCLES {
            let mut cycle = DriveCycle::from_resource(path)
                .with_context(|| format!("loading embedded cycle `{name}`"))?;
            cycle.name = name.to_string();
            registry.register(cycle)?;
        }
        Ok(registry)
    }

    /// Validates and stores `cycle` under its name, replacing any previous
    /// entry.
    pub fn register(&mut self, mut cycle: DriveCycle) -> anyhow::Result<()> {
        cycle.init()?;
        ensure!(!cycle.name.is_empty(), "cannot register an unnamed cycle");
        log::debug!("registering cycle `{}` ({} s)", cycle.name, cycle.len());
        self.cycles.insert(cycle.name.clone(), cycle);
        Ok(())
    }

    /// Stores a standalone gradient table [deg] for `identity`, e.g. for
    /// explicit speed traces resolved under [`crate::params::CUSTOM_CYCLE_NAME`].
    pub fn register_gradient(&mut self, identity: &str, grade_deg: Array1<f64>) {
        self.gradients.insert(identity.to_string(), grade_deg);
    }

    pub fn get(&self, name: &str) -> Option<&DriveCycle> {
        self.cycles.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cycles.keys().cloned().collect();
        names.sort();
        names
    }
}

impl CycleSource for CycleRegistry {
    fn resolve(&self, name: &str) -> anyhow::Result<Array1<f64>> {
        let cycle = self
            .cycles
            .get(name)
            .with_context(|| format!("driving cycle `{name}` could not be found"))?;
        Ok(cycle.kph.clone())
    }
}

impl GradientSource for CycleRegistry {
    fn resolve_gradient(&self, identity: &str) -> anyhow::Result<Option<Array1<f64>>> {
        if let Some(grade) = self.gradients.get(identity) {
            return Ok(Some(grade.clone()));
        }
        Ok(self.cycles.get(identity).map(|cyc| cyc.grade_deg.clone()))
    }
}

#[cfg(feature = "resources")]
lazy_static! {
    /// Registry of the standard heavy-truck cycles, loaded once from the
    /// embedded resources.
    pub static ref BUILTIN_CYCLES: CycleRegistry =
        CycleRegistry::builtin().expect("embedded standard cycles failed to load");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cyc() -> DriveCycle {
        DriveCycle {
            name: String::from("test"),
            kph: array![0.0, 18.0, 36.0, 18.0, 0.0],
            grade_deg: array![0.0, 0.5, 1.0, 0.5, 0.0],
        }
    }

    #[test]
    fn test_csv_round_trip() {
        let cyc = test_cyc();
        let csv_str = cyc.to_csv().unwrap();
        let parsed = DriveCycle::from_csv_str(&csv_str, String::from("test")).unwrap();
        assert_eq!(parsed, cyc);
    }

    #[test]
    fn test_str_serde() {
        let cyc = test_cyc();
        for format in DriveCycle::ACCEPTED_STR_FORMATS {
            let s = cyc.to_str(format).unwrap();
            DriveCycle::from_str(&s, format).unwrap();
        }
    }

    #[test]
    fn test_grade_defaults_to_flat() {
        let mut cyc = DriveCycle {
            name: String::from("flat"),
            kph: array![10.0, 20.0, 30.0],
            grade_deg: Array1::zeros(0),
        };
        cyc.init().unwrap();
        assert_eq!(cyc.grade_deg, Array1::<f64>::zeros(3));
    }

    #[test]
    fn test_register_rejects_invalid_speeds() {
        let mut registry = CycleRegistry::new();
        let cyc = DriveCycle {
            name: String::from("bogus"),
            kph: array![10.0, -3.0],
            grade_deg: Array1::zeros(0),
        };
        assert!(registry.register(cyc).is_err());
    }

    #[test]
    fn test_unknown_cycle_is_err() {
        let registry = CycleRegistry::new();
        assert!(registry.resolve("nonexistent-cycle-xyz").is_err());
    }

    #[test]
    fn test_standalone_gradient_wins_over_cycle_table() {
        let mut registry = CycleRegistry::new();
        registry.register(test_cyc()).unwrap();
        registry.register_gradient("test", Array1::zeros(5));
        let grade = registry.resolve_gradient("test").unwrap().unwrap();
        assert_eq!(grade, Array1::<f64>::zeros(5));
    }

    #[test]
    #[cfg(feature = "resources")]
    fn test_builtin_cycles() {
        let names = BUILTIN_CYCLES.names();
        assert_eq!(
            names,
            vec!["Long haul", "Regional delivery", "Urban delivery"]
        );
        for name in names {
            let kph = BUILTIN_CYCLES.resolve(&name).unwrap();
            let grade = BUILTIN_CYCLES.resolve_gradient(&name).unwrap().unwrap();
            assert!(!kph.is_empty());
            assert_eq!(kph.len(), grade.len());
        }
    }
}
