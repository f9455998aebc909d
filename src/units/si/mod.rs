//! SI units, prefixes and reference unit markers

pub mod base;
pub mod prefixes;

pub use base::*;
pub use prefixes::{
    Centimeter, Kiloelectronvolt, Micrometer, Millimeter, Milliradian, Nanometer, PREFIXES, Prefix,
};
