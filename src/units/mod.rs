//! Units of Measure
//!
//! Runtime dimensional analysis for physical quantities. Units are resolved
//! by name or symbol through a [`UnitRegistry`]; a [`Quantity`] pairs a
//! magnitude with its resolved unit and converts only between units of one
//! [`Dimension`].
//!
//! # Example
//!
//! ```
//! use libertem_schema::magnitude::Magnitude;
//! use libertem_schema::units::{Quantity, UnitRegistry};
//!
//! let registry = UnitRegistry::standard();
//! let length = Quantity::from_pair(&registry, Magnitude::scalar(1.5f64), "mm").unwrap();
//! let meters = length.convert_to_named(&registry, "meter").unwrap();
//! assert_eq!(meters.unit().name(), "meter");
//! ```

pub mod convert;
pub mod dimension;
pub mod quantity;
pub mod registry;
pub mod si;

// Re-exports
pub use convert::{are_compatible, conversion_factor, convert_value};
pub use dimension::Dimension;
pub use quantity::{Quantity, Unit};
pub use registry::{UnitDef, UnitRegistry, UnitRegistryBuilder};
pub use si::base::ReferenceUnit;

/// Prelude for common imports
pub mod prelude {
    pub use super::dimension::Dimension;
    pub use super::quantity::{Quantity, Unit};
    pub use super::registry::UnitRegistry;
    pub use super::si::base::ReferenceUnit;

    // Reference units
    pub use super::si::base::{
        Angstrom, Degree, Dimensionless, ElectronVolt, Meter, Pixel, Radian, Second,
    };
    pub use super::si::prefixes::{
        Centimeter, Kiloelectronvolt, Micrometer, Millimeter, Milliradian, Nanometer,
    };
}
