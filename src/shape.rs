//! Array shape specifications
//!
//! A shape spec is a comma-separated list of axes:
//!
//! | Axis       | Meaning                                          |
//! |------------|--------------------------------------------------|
//! | `2`        | exactly two entries                              |
//! | `2 rows`   | exactly two entries, labelled for messages       |
//! | `*`        | any number of entries                            |
//! | `N`        | any number, but equal on every axis named `N`    |
//! | `...`      | any number of further axes (last position only)  |
//!
//! The empty spec describes a rank-0 array.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::error::{QuantityError, QuantityResult, ShapeSpecError};

/// One axis constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    Size {
        len: usize,
        label: Option<Cow<'static, str>>,
    },
    Any,
    Var(Cow<'static, str>),
    Rest,
}

impl Axis {
    pub const fn size(len: usize) -> Self {
        Self::Size { len, label: None }
    }

    pub const fn labelled(len: usize, label: &'static str) -> Self {
        Self::Size {
            len,
            label: Some(Cow::Borrowed(label)),
        }
    }

    pub const fn var(name: &'static str) -> Self {
        Self::Var(Cow::Borrowed(name))
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Size { len, label: None } => write!(f, "{}", len),
            Axis::Size {
                len,
                label: Some(label),
            } => write!(f, "{} {}", len, label),
            Axis::Any => f.write_str("*"),
            Axis::Var(name) => f.write_str(name),
            Axis::Rest => f.write_str("..."),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Ordered axis constraints for an array magnitude
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ShapeSpec {
    axes: Vec<Axis>,
}

impl ShapeSpec {
    /// Rank-0 spec
    pub const SCALAR: ShapeSpec = ShapeSpec { axes: Vec::new() };

    /// Build from axes; `...` is only allowed last
    pub fn new(axes: Vec<Axis>) -> Result<Self, ShapeSpecError> {
        let spec = Self { axes };
        if let Some(pos) = spec.axes.iter().position(|a| *a == Axis::Rest)
            && pos + 1 != spec.axes.len()
        {
            return Err(ShapeSpecError::MisplacedEllipsis {
                spec: spec.to_string(),
            });
        }
        Ok(spec)
    }

    /// Parse a spec string such as `"2 rows, 2 cols"` or `"N, N, ..."`
    pub fn parse(spec: &str) -> Result<Self, ShapeSpecError> {
        if spec.trim().is_empty() {
            return Ok(Self::SCALAR);
        }

        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        let mut axes = Vec::with_capacity(parts.len());

        for (position, part) in parts.iter().enumerate() {
            let invalid = || ShapeSpecError::InvalidAxis {
                spec: spec.to_string(),
                axis: part.to_string(),
            };

            let axis = match *part {
                "" => {
                    return Err(ShapeSpecError::EmptyAxis {
                        spec: spec.to_string(),
                        position,
                    });
                }
                "..." if position + 1 != parts.len() => {
                    return Err(ShapeSpecError::MisplacedEllipsis {
                        spec: spec.to_string(),
                    });
                }
                "..." => Axis::Rest,
                "*" => Axis::Any,
                _ => {
                    let tokens: Vec<&str> = part.split_whitespace().collect();
                    match tokens.as_slice() {
                        [len] if len.chars().all(|c| c.is_ascii_digit()) => {
                            Axis::size(len.parse().map_err(|_| invalid())?)
                        }
                        [len, label] if is_identifier(label) => Axis::Size {
                            len: len.parse().map_err(|_| invalid())?,
                            label: Some(Cow::Owned(label.to_string())),
                        },
                        [name] if is_identifier(name) => Axis::Var(Cow::Owned(name.to_string())),
                        _ => return Err(invalid()),
                    }
                }
            };
            axes.push(axis);
        }

        Ok(Self { axes })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Whether a trailing `...` admits extra axes
    pub fn is_open(&self) -> bool {
        self.axes.last() == Some(&Axis::Rest)
    }

    /// Axes before any trailing `...`
    pub fn fixed_axes(&self) -> &[Axis] {
        match self.axes.split_last() {
            Some((Axis::Rest, head)) => head,
            _ => &self.axes,
        }
    }

    /// Exact rank, if there is no trailing `...`
    pub fn rank(&self) -> Option<usize> {
        (!self.is_open()).then_some(self.axes.len())
    }

    pub fn matches(&self, shape: &[usize]) -> bool {
        let fixed = self.fixed_axes();
        if shape.len() < fixed.len() || (!self.is_open() && shape.len() != fixed.len()) {
            return false;
        }

        let mut bound: FxHashMap<&str, usize> = FxHashMap::default();
        fixed.iter().zip(shape).all(|(axis, &n)| match axis {
            Axis::Size { len, .. } => *len == n,
            Axis::Var(name) => *bound.entry(name.as_ref()).or_insert(n) == n,
            Axis::Any | Axis::Rest => true,
        })
    }

    /// Check a concrete array shape against this spec
    pub fn check(&self, shape: &[usize]) -> QuantityResult<()> {
        if self.matches(shape) {
            Ok(())
        } else {
            Err(QuantityError::ShapeMismatch {
                expected: self.to_string(),
                actual: shape.to_vec(),
            })
        }
    }
}

impl fmt::Display for ShapeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", axis)?;
        }
        Ok(())
    }
}

impl FromStr for ShapeSpec {
    type Err = ShapeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
