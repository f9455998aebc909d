//! Reference units known at compile time
//!
//! A quantity type declares its reference unit through a marker type. The
//! marker carries the dimension, scale, symbol and canonical name as
//! associated constants, so declaring `ScalarQuantity<Meter, f64>` costs no
//! runtime lookup.

use crate::units::dimension::Dimension;
use crate::units::quantity::Unit;

/// Trait for units usable as the reference of a quantity type
///
/// Every unit has:
/// - A dimension (what physical quantity it measures)
/// - A scale factor (relative to the base unit of that dimension)
/// - A symbol and a canonical name; the name is what goes on the wire
pub trait ReferenceUnit: Copy + Clone + Default + std::fmt::Debug + Send + Sync + 'static {
    /// The dimension of this unit
    const DIMENSION: Dimension;

    /// Scale factor relative to the base unit,
    /// e.g. Centimeter has scale 0.01 (relative to meter)
    const SCALE: f64;

    /// Unit symbol (e.g., "m", "rad", "px")
    const SYMBOL: &'static str;

    /// Canonical name (e.g., "meter", "radian", "pixel")
    const NAME: &'static str;

    /// Runtime unit value for this marker
    fn unit() -> Unit {
        Unit::from_static(Self::NAME, Self::DIMENSION, Self::SCALE)
    }
}

/// Meter (m) - base unit of length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Meter;

impl ReferenceUnit for Meter {
    const DIMENSION: Dimension = Dimension::LENGTH;
    const SCALE: f64 = 1.0;
    const SYMBOL: &'static str = "m";
    const NAME: &'static str = "meter";
}

/// Ångström (Å) - 10⁻¹⁰ m
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Angstrom;

impl ReferenceUnit for Angstrom {
    const DIMENSION: Dimension = Dimension::LENGTH;
    const SCALE: f64 = 1e-10;
    const SYMBOL: &'static str = "Å";
    const NAME: &'static str = "angstrom";
}

/// Radian (rad) - base unit of plane angle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Radian;

impl ReferenceUnit for Radian {
    const DIMENSION: Dimension = Dimension::ANGLE;
    const SCALE: f64 = 1.0;
    const SYMBOL: &'static str = "rad";
    const NAME: &'static str = "radian";
}

/// Degree (deg) - π/180 rad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Degree;

impl ReferenceUnit for Degree {
    const DIMENSION: Dimension = Dimension::ANGLE;
    const SCALE: f64 = std::f64::consts::PI / 180.0;
    const SYMBOL: &'static str = "deg";
    const NAME: &'static str = "degree";
}

/// Pixel (px) - base unit of pixel count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pixel;

impl ReferenceUnit for Pixel {
    const DIMENSION: Dimension = Dimension::PIXEL;
    const SCALE: f64 = 1.0;
    const SYMBOL: &'static str = "px";
    const NAME: &'static str = "pixel";
}

/// Dimensionless unit (pure number)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimensionless;

impl ReferenceUnit for Dimensionless {
    const DIMENSION: Dimension = Dimension::DIMENSIONLESS;
    const SCALE: f64 = 1.0;
    const SYMBOL: &'static str = "";
    const NAME: &'static str = "dimensionless";
}

/// Second (s) - base unit of time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Second;

impl ReferenceUnit for Second {
    const DIMENSION: Dimension = Dimension::TIME;
    const SCALE: f64 = 1.0;
    const SYMBOL: &'static str = "s";
    const NAME: &'static str = "second";
}

/// Electron volt (eV) - 1.602176634 × 10⁻¹⁹ J
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ElectronVolt;

impl ReferenceUnit for ElectronVolt {
    const DIMENSION: Dimension = Dimension::ENERGY;
    const SCALE: f64 = 1.602176634e-19;
    const SYMBOL: &'static str = "eV";
    const NAME: &'static str = "electron_volt";
}
