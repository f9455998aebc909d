//! Runtime units and quantities
//!
//! `Quantity` pairs a [`Magnitude`] with a resolved [`Unit`]. It is immutable:
//! conversion returns a new value and nothing can change a quantity in place,
//! so quantities can be shared freely across threads.

use std::borrow::Cow;
use std::fmt;

use super::convert::conversion_factor;
use super::dimension::Dimension;
use super::registry::UnitRegistry;
use crate::error::QuantityResult;
use crate::magnitude::Magnitude;

/// A resolved unit: canonical name, dimension and scale to the base unit
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    name: Cow<'static, str>,
    dimension: Dimension,
    scale: f64,
}

impl Unit {
    pub const fn from_static(name: &'static str, dimension: Dimension, scale: f64) -> Self {
        Self {
            name: Cow::Borrowed(name),
            dimension,
            scale,
        }
    }

    pub fn new(name: impl Into<String>, dimension: Dimension, scale: f64) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            dimension,
            scale,
        }
    }

    /// Canonical name, as written on the wire
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Multiplier to the base unit of this dimension
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Check if compatible with another unit (same dimension)
    #[inline]
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A magnitude with a unit
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    magnitude: Magnitude,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: Magnitude, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Resolve `unit` in the registry and pair it with `magnitude`
    pub fn from_pair(
        registry: &UnitRegistry,
        magnitude: Magnitude,
        unit: &str,
    ) -> QuantityResult<Self> {
        let unit = registry.resolve(unit)?;
        Ok(Self { magnitude, unit })
    }

    #[inline]
    pub fn magnitude(&self) -> &Magnitude {
        &self.magnitude
    }

    #[inline]
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.unit.dimension
    }

    pub fn into_parts(self) -> (Magnitude, Unit) {
        (self.magnitude, self.unit)
    }

    #[inline]
    pub fn check_dimension(&self, expected: Dimension) -> bool {
        self.unit.dimension == expected
    }

    /// Express this quantity in `target`
    ///
    /// Converting to a unit of the same name is exact and keeps the
    /// magnitude untouched.
    pub fn convert_to(&self, target: &Unit) -> QuantityResult<Quantity> {
        if self.unit.name == target.name && self.unit.dimension == target.dimension {
            return Ok(Quantity {
                magnitude: self.magnitude.clone(),
                unit: target.clone(),
            });
        }
        let factor = conversion_factor(&self.unit, target)?;
        Ok(Quantity {
            magnitude: self.magnitude.scaled(factor),
            unit: target.clone(),
        })
    }

    /// Resolve `target` in the registry, then convert
    pub fn convert_to_named(
        &self,
        registry: &UnitRegistry,
        target: &str,
    ) -> QuantityResult<Quantity> {
        let unit = registry.resolve(target)?;
        self.convert_to(&unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}
