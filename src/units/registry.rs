//! Unit table
//!
//! The registry maps unit names, symbols and aliases to their dimension and
//! scale. It is assembled once through [`UnitRegistryBuilder`] and is
//! read-only afterwards, so a single instance can be shared by reference
//! between any number of threads.
//!
//! Extra units can be loaded from TOML or JSON:
//!
//! ```toml
//! [[unit]]
//! name = "fathom"
//! symbol = "ftm"
//! scale = 1.8288
//! dimension = { length = 1 }
//! ```

use std::f64::consts::PI;
use std::path::Path;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::dimension::Dimension;
use super::quantity::Unit;
use super::si::prefixes::{self, Prefix};
use crate::error::{QuantityError, QuantityResult, RegistryError};

/// Definition of one unit in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    /// Canonical name, used on the wire
    pub name: String,

    #[serde(default)]
    pub symbol: Option<String>,

    /// Alternative spellings; never combined with prefixes
    #[serde(default)]
    pub aliases: Vec<String>,

    pub dimension: Dimension,

    /// Multiplier to the base unit of the dimension
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Accepts SI prefixes (`centi` + `meter`, `m` + `m`)
    #[serde(default)]
    pub prefixable: bool,
}

fn default_scale() -> f64 {
    1.0
}

impl UnitDef {
    pub fn new(name: &str, symbol: Option<&str>, dimension: Dimension, scale: f64) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.map(str::to_string),
            aliases: Vec::new(),
            dimension,
            scale,
            prefixable: false,
        }
    }

    pub fn prefixable(mut self) -> Self {
        self.prefixable = true;
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    fn to_unit(&self) -> Unit {
        Unit::new(self.name.clone(), self.dimension, self.scale)
    }

    fn to_prefixed_unit(&self, prefix: &Prefix) -> Unit {
        Unit::new(
            format!("{}{}", prefix.name, self.name),
            self.dimension,
            prefix.factor * self.scale,
        )
    }
}

/// On-disk layout of a unit definition file
#[derive(Debug, Default, Serialize, Deserialize)]
struct UnitFile {
    #[serde(default, rename = "unit")]
    units: Vec<UnitDef>,
}

fn standard_defs() -> Vec<UnitDef> {
    use Dimension as D;
    vec![
        // Length
        UnitDef::new("meter", Some("m"), D::LENGTH, 1.0)
            .prefixable()
            .alias("metre"),
        UnitDef::new("angstrom", Some("Å"), D::LENGTH, 1e-10)
            .alias("\u{212B}")
            .alias("angstroem"),
        UnitDef::new("micron", None, D::LENGTH, 1e-6),
        UnitDef::new("inch", Some("in"), D::LENGTH, 0.0254),
        UnitDef::new("foot", Some("ft"), D::LENGTH, 0.3048).alias("feet"),
        // Angle
        UnitDef::new("radian", Some("rad"), D::ANGLE, 1.0).prefixable(),
        UnitDef::new("degree", Some("deg"), D::ANGLE, PI / 180.0).alias("°"),
        UnitDef::new("arcminute", Some("arcmin"), D::ANGLE, PI / 10_800.0),
        UnitDef::new("arcsecond", Some("arcsec"), D::ANGLE, PI / 648_000.0),
        UnitDef::new("turn", None, D::ANGLE, 2.0 * PI).alias("revolution"),
        // Pixel count
        UnitDef::new("pixel", Some("px"), D::PIXEL, 1.0).alias("dot"),
        // Dimensionless
        UnitDef::new("dimensionless", Some(""), D::DIMENSIONLESS, 1.0),
        UnitDef::new("percent", Some("%"), D::DIMENSIONLESS, 0.01),
        // Time
        UnitDef::new("second", Some("s"), D::TIME, 1.0)
            .prefixable()
            .alias("sec"),
        UnitDef::new("minute", Some("min"), D::TIME, 60.0),
        UnitDef::new("hour", Some("h"), D::TIME, 3600.0).alias("hr"),
        // Remaining SI base quantities
        UnitDef::new("gram", Some("g"), D::MASS, 1e-3).prefixable(),
        UnitDef::new("kelvin", Some("K"), D::TEMPERATURE, 1.0).prefixable(),
        UnitDef::new("ampere", Some("A"), D::CURRENT, 1.0)
            .prefixable()
            .alias("amp"),
        UnitDef::new("mole", Some("mol"), D::AMOUNT, 1.0).prefixable(),
        UnitDef::new("candela", Some("cd"), D::LUMINOSITY, 1.0).prefixable(),
        // Derived
        UnitDef::new("electron_volt", Some("eV"), D::ENERGY, 1.602176634e-19)
            .prefixable()
            .alias("electronvolt"),
        UnitDef::new("volt", Some("V"), D::VOLTAGE, 1.0).prefixable(),
        UnitDef::new("hertz", Some("Hz"), D::FREQUENCY, 1.0).prefixable(),
    ]
}

/// Builder for a [`UnitRegistry`]
#[derive(Debug, Clone, Default)]
pub struct UnitRegistryBuilder {
    defs: Vec<UnitDef>,
}

impl UnitRegistryBuilder {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with the standard units
    pub fn standard() -> Self {
        Self {
            defs: standard_defs(),
        }
    }

    /// Add a unit, rejecting invalid scales and clashing spellings
    pub fn define(mut self, def: UnitDef) -> Result<Self, RegistryError> {
        if !def.scale.is_finite() || def.scale <= 0.0 {
            return Err(RegistryError::InvalidScale {
                name: def.name,
                scale: def.scale,
            });
        }

        let spellings = |d: &UnitDef| -> Vec<String> {
            let mut all = vec![d.name.clone()];
            all.extend(d.symbol.clone());
            all.extend(d.aliases.iter().cloned());
            all
        };
        let taken: Vec<String> = self.defs.iter().flat_map(spellings).collect();
        if let Some(clash) = spellings(&def).into_iter().find(|s| taken.contains(s)) {
            return Err(RegistryError::Duplicate { name: clash });
        }

        tracing::debug!(unit = %def.name, dimension = %def.dimension, "defining unit");
        self.defs.push(def);
        Ok(self)
    }

    /// Add every unit from a TOML document
    pub fn extend_from_toml(self, content: &str) -> Result<Self, RegistryError> {
        let file: UnitFile =
            toml::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))?;
        file.units.into_iter().try_fold(self, Self::define)
    }

    /// Add every unit from a JSON document
    pub fn extend_from_json(self, content: &str) -> Result<Self, RegistryError> {
        let file: UnitFile =
            serde_json::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))?;
        file.units.into_iter().try_fold(self, Self::define)
    }

    /// Load unit definitions from a `.toml` or `.json` file
    pub fn extend_from_file(self, path: &Path) -> Result<Self, RegistryError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RegistryError::Io(e.to_string()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => self.extend_from_toml(&content),
            Some("json") => self.extend_from_json(&content),
            _ => Err(RegistryError::Parse(format!(
                "Unknown unit file format: {}",
                path.display()
            ))),
        }
    }

    pub fn build(self) -> UnitRegistry {
        let mut names = FxHashMap::default();
        let mut symbols = FxHashMap::default();
        let mut aliases = FxHashMap::default();
        for (i, def) in self.defs.iter().enumerate() {
            names.insert(def.name.clone(), i);
            if let Some(symbol) = &def.symbol {
                symbols.insert(symbol.clone(), i);
            }
            for alias in &def.aliases {
                aliases.insert(alias.clone(), i);
            }
        }
        UnitRegistry {
            defs: self.defs,
            names,
            symbols,
            aliases,
        }
    }
}

static GLOBAL: OnceLock<UnitRegistry> = OnceLock::new();

/// Immutable unit table
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    defs: Vec<UnitDef>,
    names: FxHashMap<String, usize>,
    symbols: FxHashMap<String, usize>,
    aliases: FxHashMap<String, usize>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl UnitRegistry {
    /// Registry with the standard units
    pub fn standard() -> Self {
        UnitRegistryBuilder::standard().build()
    }

    /// Process-wide registry backing the serde impls of quantity types
    ///
    /// Falls back to the standard table unless [`UnitRegistry::install_global`]
    /// ran first.
    pub fn global() -> &'static UnitRegistry {
        GLOBAL.get_or_init(Self::standard)
    }

    /// Install the process-wide registry; fails if one is already in use
    pub fn install_global(registry: UnitRegistry) -> Result<(), UnitRegistry> {
        GLOBAL.set(registry)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// All unit definitions, in definition order
    pub fn definitions(&self) -> &[UnitDef] {
        &self.defs
    }

    /// Resolve a unit string to its canonical unit
    ///
    /// Tries, in order: exact name, symbol or alias; SI prefix name plus a
    /// prefixable name; SI prefix symbol plus a prefixable symbol; and the
    /// same again for a regular plural (`meters`, `centimeters`).
    pub fn resolve(&self, unit: &str) -> QuantityResult<Unit> {
        let resolved = self.lookup(unit).or_else(|| {
            unit.strip_suffix('s')
                .filter(|stem| !stem.is_empty())
                .and_then(|stem| self.lookup_name(stem))
        });

        match resolved {
            Some(u) => {
                tracing::trace!(input = unit, unit = %u, "resolved unit");
                Ok(u)
            }
            None => Err(QuantityError::UnknownUnit {
                unit: unit.to_string(),
            }),
        }
    }

    /// Check that a unit string resolves
    pub fn contains(&self, unit: &str) -> bool {
        self.resolve(unit).is_ok()
    }

    fn lookup(&self, unit: &str) -> Option<Unit> {
        if let Some(&i) = self.symbols.get(unit).or_else(|| self.aliases.get(unit)) {
            return Some(self.defs[i].to_unit());
        }
        if let Some(u) = self.lookup_name(unit) {
            return Some(u);
        }
        prefixes::split_symbol(unit).find_map(|(prefix, rest)| {
            let &i = self.symbols.get(rest)?;
            let def = &self.defs[i];
            def.prefixable.then(|| def.to_prefixed_unit(prefix))
        })
    }

    fn lookup_name(&self, name: &str) -> Option<Unit> {
        if let Some(&i) = self.names.get(name) {
            return Some(self.defs[i].to_unit());
        }
        prefixes::split_name(name).find_map(|(prefix, rest)| {
            let &i = self.names.get(rest)?;
            let def = &self.defs[i];
            def.prefixable.then(|| def.to_prefixed_unit(prefix))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::si::base::ReferenceUnit;
    use crate::units::si;
    use approx::assert_relative_eq;

    fn assert_marker<R: ReferenceUnit>(registry: &UnitRegistry) {
        for spelling in [R::NAME, R::SYMBOL] {
            let unit = registry.resolve(spelling).unwrap();
            assert_eq!(unit.name(), R::NAME, "{} resolves to another name", spelling);
            assert_eq!(unit.dimension(), R::DIMENSION);
            assert_relative_eq!(unit.scale(), R::SCALE, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_markers_agree_with_standard_table() {
        let reg = UnitRegistry::standard();
        assert_marker::<si::Meter>(&reg);
        assert_marker::<si::Angstrom>(&reg);
        assert_marker::<si::Radian>(&reg);
        assert_marker::<si::Degree>(&reg);
        assert_marker::<si::Pixel>(&reg);
        assert_marker::<si::Dimensionless>(&reg);
        assert_marker::<si::Second>(&reg);
        assert_marker::<si::ElectronVolt>(&reg);
        assert_marker::<si::Centimeter>(&reg);
        assert_marker::<si::Millimeter>(&reg);
        assert_marker::<si::Micrometer>(&reg);
        assert_marker::<si::Nanometer>(&reg);
        assert_marker::<si::Milliradian>(&reg);
        assert_marker::<si::Kiloelectronvolt>(&reg);
    }

    #[test]
    fn test_resolution_forms() {
        let reg = UnitRegistry::standard();
        assert_eq!(reg.resolve("m").unwrap().name(), "meter");
        assert_eq!(reg.resolve("metre").unwrap().name(), "meter");
        assert_eq!(reg.resolve("mm").unwrap().name(), "millimeter");
        assert_eq!(reg.resolve("µrad").unwrap().name(), "microradian");
        assert_eq!(reg.resolve("meters").unwrap().name(), "meter");
        assert_eq!(reg.resolve("centimeters").unwrap().name(), "centimeter");
        assert_eq!(reg.resolve("°").unwrap().name(), "degree");
        assert_eq!(reg.resolve("dot").unwrap().name(), "pixel");
        assert_eq!(reg.resolve("").unwrap().name(), "dimensionless");
        assert_eq!(reg.resolve("min").unwrap().name(), "minute");
        assert_eq!(reg.resolve("ms").unwrap().name(), "millisecond");
        assert_relative_eq!(reg.resolve("kg").unwrap().scale(), 1.0);
    }

    #[test]
    fn test_resolution_is_case_sensitive() {
        let reg = UnitRegistry::standard();
        assert!(reg.resolve("Meter").is_err());
        assert!(reg.resolve("PX").is_err());
    }

    #[test]
    fn test_non_prefixable_units_reject_prefixes() {
        let reg = UnitRegistry::standard();
        assert!(reg.resolve("kilodegree").is_err());
        assert!(reg.resolve("mpx").is_err());
        // Aliases never take a prefix
        assert!(reg.resolve("kilometre").is_err());
    }

    #[test]
    fn test_unknown_unit() {
        let reg = UnitRegistry::standard();
        assert_eq!(
            reg.resolve("furlong"),
            Err(QuantityError::UnknownUnit {
                unit: "furlong".to_string()
            })
        );
        assert!(reg.resolve("s").is_ok());
    }

    #[test]
    fn test_define_rejects_duplicates_and_bad_scale() {
        let err = UnitRegistryBuilder::standard()
            .define(UnitDef::new("meter", None, Dimension::LENGTH, 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                name: "meter".to_string()
            }
        );

        let err = UnitRegistryBuilder::new()
            .define(UnitDef::new("void", None, Dimension::LENGTH, 0.0))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidScale { .. }));
    }

    #[test]
    fn test_extend_from_toml() {
        let reg = UnitRegistryBuilder::standard()
            .extend_from_toml(
                r#"
                [[unit]]
                name = "fathom"
                symbol = "ftm"
                scale = 1.8288
                dimension = { length = 1 }
                "#,
            )
            .unwrap()
            .build();
        let unit = reg.resolve("ftm").unwrap();
        assert_eq!(unit.name(), "fathom");
        assert_eq!(unit.dimension(), Dimension::LENGTH);
        assert!(reg.contains("fathoms"));
    }

    #[test]
    fn test_extend_from_json() {
        let reg = UnitRegistryBuilder::new()
            .extend_from_json(
                r#"{"unit": [{"name": "count", "dimension": {}, "prefixable": true}]}"#,
            )
            .unwrap()
            .build();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.resolve("kilocount").unwrap().scale(), 1e3);
    }

    #[test]
    fn test_parse_error() {
        let err = UnitRegistryBuilder::new()
            .extend_from_toml("[[unit]]\nname = 3")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }

    #[test]
    fn test_registry_is_sync() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<UnitRegistry>();
    }
}
