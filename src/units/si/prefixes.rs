//! SI Prefixes and Prefixed Reference Units
//!
//! The prefix table drives resolution of names like "centimeter" and symbols
//! like "mm" in the unit registry. The marker types below are the prefixed
//! units commonly declared as references.

use super::base::ReferenceUnit;
use crate::units::dimension::Dimension;

/// An SI prefix: full name, symbols and multiplier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prefix {
    pub name: &'static str,
    pub symbols: &'static [&'static str],
    pub factor: f64,
}

const fn prefix(name: &'static str, symbols: &'static [&'static str], factor: f64) -> Prefix {
    Prefix {
        name,
        symbols,
        factor,
    }
}

/// All supported prefixes
///
/// Both the micro sign (U+00B5) and the Greek mu (U+03BC) spell micro,
/// with `u` as the ASCII fallback.
pub const PREFIXES: &[Prefix] = &[
    prefix("exa", &["E"], 1e18),
    prefix("peta", &["P"], 1e15),
    prefix("tera", &["T"], 1e12),
    prefix("giga", &["G"], 1e9),
    prefix("mega", &["M"], 1e6),
    prefix("kilo", &["k"], 1e3),
    prefix("hecto", &["h"], 1e2),
    prefix("deca", &["da"], 1e1),
    prefix("deci", &["d"], 1e-1),
    prefix("centi", &["c"], 1e-2),
    prefix("milli", &["m"], 1e-3),
    prefix("micro", &["µ", "μ", "u"], 1e-6),
    prefix("nano", &["n"], 1e-9),
    prefix("pico", &["p"], 1e-12),
    prefix("femto", &["f"], 1e-15),
    prefix("atto", &["a"], 1e-18),
];

/// Find a prefix by full name
pub fn by_name(name: &str) -> Option<&'static Prefix> {
    PREFIXES.iter().find(|p| p.name == name)
}

/// Split a prefixed name into its prefix and the remainder
pub fn split_name(name: &str) -> impl Iterator<Item = (&'static Prefix, &str)> {
    PREFIXES
        .iter()
        .filter_map(move |p| name.strip_prefix(p.name).map(|rest| (p, rest)))
        .filter(|(_, rest)| !rest.is_empty())
}

/// Split a prefixed symbol into its prefix and the remainder
pub fn split_symbol(symbol: &str) -> impl Iterator<Item = (&'static Prefix, &str)> {
    PREFIXES
        .iter()
        .flat_map(|p| p.symbols.iter().map(move |s| (p, *s)))
        .filter_map(move |(p, s)| symbol.strip_prefix(s).map(|rest| (p, rest)))
        .filter(|(_, rest)| !rest.is_empty())
}

// =============================================================================
// Length Units with Prefixes
// =============================================================================

/// Centimeter (cm) - 10⁻² m
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Centimeter;

impl ReferenceUnit for Centimeter {
    const DIMENSION: Dimension = Dimension::LENGTH;
    const SCALE: f64 = 1e-2;
    const SYMBOL: &'static str = "cm";
    const NAME: &'static str = "centimeter";
}

/// Millimeter (mm) - 10⁻³ m
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Millimeter;

impl ReferenceUnit for Millimeter {
    const DIMENSION: Dimension = Dimension::LENGTH;
    const SCALE: f64 = 1e-3;
    const SYMBOL: &'static str = "mm";
    const NAME: &'static str = "millimeter";
}

/// Micrometer (µm) - 10⁻⁶ m
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Micrometer;

impl ReferenceUnit for Micrometer {
    const DIMENSION: Dimension = Dimension::LENGTH;
    const SCALE: f64 = 1e-6;
    const SYMBOL: &'static str = "µm";
    const NAME: &'static str = "micrometer";
}

/// Nanometer (nm) - 10⁻⁹ m
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Nanometer;

impl ReferenceUnit for Nanometer {
    const DIMENSION: Dimension = Dimension::LENGTH;
    const SCALE: f64 = 1e-9;
    const SYMBOL: &'static str = "nm";
    const NAME: &'static str = "nanometer";
}

// =============================================================================
// Angle Units with Prefixes
// =============================================================================

/// Milliradian (mrad) - 10⁻³ rad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Milliradian;

impl ReferenceUnit for Milliradian {
    const DIMENSION: Dimension = Dimension::ANGLE;
    const SCALE: f64 = 1e-3;
    const SYMBOL: &'static str = "mrad";
    const NAME: &'static str = "milliradian";
}

// =============================================================================
// Energy Units with Prefixes
// =============================================================================

/// Kiloelectronvolt (keV) - 10³ eV
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Kiloelectronvolt;

impl ReferenceUnit for Kiloelectronvolt {
    const DIMENSION: Dimension = Dimension::ENERGY;
    const SCALE: f64 = 1.602176634e-16;
    const SYMBOL: &'static str = "keV";
    const NAME: &'static str = "kiloelectron_volt";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        let splits: Vec<_> = split_name("centimeter").map(|(p, r)| (p.name, r)).collect();
        assert_eq!(splits, vec![("centi", "meter")]);
        assert_eq!(split_name("milli").count(), 0);
    }

    #[test]
    fn test_split_symbol_micro_spellings() {
        for symbol in ["µm", "μm", "um"] {
            assert!(
                split_symbol(symbol).any(|(p, rest)| p.name == "micro" && rest == "m"),
                "{} should split as micro + m",
                symbol
            );
        }
    }

    #[test]
    fn test_deca_and_deci_both_offered() {
        let names: Vec<_> = split_symbol("dam").map(|(p, _)| p.name).collect();
        assert!(names.contains(&"deca"));
        assert!(names.contains(&"deci"));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("kilo").map(|p| p.factor), Some(1e3));
        assert!(by_name("kibi").is_none());
    }
}
