//! Runtime dimensional analysis
//!
//! Every unit carries a dimension: a vector of exponents over the seven SI
//! base quantities plus two pseudo-dimensions, angle and pixel count. Angles
//! and pixels are physically dimensionless, but keeping them apart means an
//! angle can never satisfy a length or pixel requirement and vice versa.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exponent vector describing the physical dimension of a unit
///
/// - M: Mass (kilogram)
/// - L: Length (meter)
/// - T: Time (second)
/// - I: Electric current (ampere)
/// - Θ: Thermodynamic temperature (kelvin)
/// - N: Amount of substance (mole)
/// - J: Luminous intensity (candela)
/// - Ang: Plane angle (radian)
/// - Px: Pixel count (pixel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub current: i8,
    pub temperature: i8,
    pub amount: i8,
    pub luminosity: i8,
    pub angle: i8,
    pub pixel: i8,
}

impl Dimension {
    /// Pure number
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0, 0, 0, 0, 0, 0, 0);

    pub const MASS: Self = Self::new(1, 0, 0, 0, 0, 0, 0, 0, 0);
    pub const LENGTH: Self = Self::new(0, 1, 0, 0, 0, 0, 0, 0, 0);
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0, 0, 0, 0);
    pub const CURRENT: Self = Self::new(0, 0, 0, 1, 0, 0, 0, 0, 0);
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1, 0, 0, 0, 0);
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 0, 1, 0, 0, 0);
    pub const LUMINOSITY: Self = Self::new(0, 0, 0, 0, 0, 0, 1, 0, 0);

    /// Plane angle, tracked separately from dimensionless
    pub const ANGLE: Self = Self::new(0, 0, 0, 0, 0, 0, 0, 1, 0);

    /// Pixel count (the printing unit), tracked separately from dimensionless
    pub const PIXEL: Self = Self::new(0, 0, 0, 0, 0, 0, 0, 0, 1);

    /// Energy [M L² T⁻²] - joule, electron volt
    pub const ENERGY: Self = Self::new(1, 2, -2, 0, 0, 0, 0, 0, 0);

    /// Voltage [M L² T⁻³ I⁻¹] - volt
    pub const VOLTAGE: Self = Self::new(1, 2, -3, -1, 0, 0, 0, 0, 0);

    /// Frequency [T⁻¹] - hertz
    pub const FREQUENCY: Self = Self::new(0, 0, -1, 0, 0, 0, 0, 0, 0);

    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        mass: i8,
        length: i8,
        time: i8,
        current: i8,
        temperature: i8,
        amount: i8,
        luminosity: i8,
        angle: i8,
        pixel: i8,
    ) -> Self {
        Self {
            mass,
            length,
            time,
            current,
            temperature,
            amount,
            luminosity,
            angle,
            pixel,
        }
    }

    /// Exponents in display order, paired with their symbols
    const fn exponents(&self) -> [(&'static str, i8); 9] {
        [
            ("M", self.mass),
            ("L", self.length),
            ("T", self.time),
            ("I", self.current),
            ("Θ", self.temperature),
            ("N", self.amount),
            ("J", self.luminosity),
            ("Ang", self.angle),
            ("Px", self.pixel),
        ]
    }

    pub const fn is_dimensionless(&self) -> bool {
        self.equals(&Self::DIMENSIONLESS)
    }

    /// Check if dimensions are equal (usable in const context)
    pub const fn equals(&self, other: &Dimension) -> bool {
        self.mass == other.mass
            && self.length == other.length
            && self.time == other.time
            && self.current == other.current
            && self.temperature == other.temperature
            && self.amount == other.amount
            && self.luminosity == other.luminosity
            && self.angle == other.angle
            && self.pixel == other.pixel
    }

    /// Get the name of this dimension if it matches a known type
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::DIMENSIONLESS => Some("dimensionless"),
            Self::MASS => Some("mass"),
            Self::LENGTH => Some("length"),
            Self::TIME => Some("time"),
            Self::CURRENT => Some("electric current"),
            Self::TEMPERATURE => Some("temperature"),
            Self::AMOUNT => Some("amount of substance"),
            Self::LUMINOSITY => Some("luminous intensity"),
            Self::ANGLE => Some("angle"),
            Self::PIXEL => Some("pixel count"),
            Self::ENERGY => Some("energy"),
            Self::VOLTAGE => Some("voltage"),
            Self::FREQUENCY => Some("frequency"),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }

        let mut num: Vec<String> = Vec::new();
        let mut den: Vec<String> = Vec::new();

        for (symbol, exp) in self.exponents() {
            let (parts, exp) = match exp {
                0 => continue,
                e if e > 0 => (&mut num, e),
                e => (&mut den, -e),
            };
            if exp == 1 {
                parts.push(symbol.to_string());
            } else {
                parts.push(format!("{}{}", symbol, superscript(exp)));
            }
        }

        let num_str = if num.is_empty() {
            "1".to_string()
        } else {
            num.join(" ")
        };

        if den.is_empty() {
            write!(f, "{}", num_str)
        } else {
            write!(f, "{} / {}", num_str, den.join(" "))
        }
    }
}

/// Convert integer to superscript string
fn superscript(n: i8) -> String {
    let digits: String = n
        .unsigned_abs()
        .to_string()
        .chars()
        .map(|d| match d {
            '0' => '⁰',
            '1' => '¹',
            '2' => '²',
            '3' => '³',
            '4' => '⁴',
            '5' => '⁵',
            '6' => '⁶',
            '7' => '⁷',
            '8' => '⁸',
            '9' => '⁹',
            _ => d,
        })
        .collect();

    if n < 0 {
        format!("⁻{}", digits)
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudo_dimensions_are_distinct() {
        assert_ne!(Dimension::ANGLE, Dimension::DIMENSIONLESS);
        assert_ne!(Dimension::PIXEL, Dimension::DIMENSIONLESS);
        assert_ne!(Dimension::ANGLE, Dimension::PIXEL);
        assert!(!Dimension::ANGLE.is_dimensionless());
    }

    #[test]
    fn test_equals_matches_partial_eq() {
        assert!(Dimension::LENGTH.equals(&Dimension::new(0, 1, 0, 0, 0, 0, 0, 0, 0)));
        assert!(!Dimension::LENGTH.equals(&Dimension::ANGLE));
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimension::LENGTH.to_string(), "L");
        assert_eq!(Dimension::ENERGY.to_string(), "M L² / T²");
        assert_eq!(Dimension::DIMENSIONLESS.to_string(), "1");
        assert_eq!(Dimension::ANGLE.to_string(), "Ang");
        assert_eq!(Dimension::FREQUENCY.to_string(), "1 / T");
    }

    #[test]
    fn test_named() {
        assert_eq!(Dimension::LENGTH.name(), Some("length"));
        assert_eq!(Dimension::PIXEL.name(), Some("pixel count"));
        assert_eq!(Dimension::new(0, 3, -1, 0, 0, 0, 0, 0, 0).name(), None);
    }

    #[test]
    fn test_deserialize_sparse_exponents() {
        let dim: Dimension = serde_json::from_str(r#"{"length": 1}"#).unwrap();
        assert_eq!(dim, Dimension::LENGTH);
    }
}
