#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Records whether a value is known to be exactly zero or exactly one.
///
/// Simplification in this crate never inspects floating-point values. Instead, every
/// [`Constant`] is tagged when it is created, and the zero / one shortcuts of the
/// differentiation passes branch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Simplification {
    /// The value is exactly zero.
    Zero,

    /// The value is exactly one.
    One,

    /// Nothing is known about the value.
    Neither,
}

/// A numeric constant together with its [`Simplification`] tag.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Constant {
    /// The value of the constant.
    pub value: f64,

    /// What the differentiation passes are allowed to assume about the value.
    pub tag: Simplification,
}

impl Constant {
    /// The zero constant.
    pub const ZERO: Self = Self { value: 0.0, tag: Simplification::Zero };

    /// The one constant.
    pub const ONE: Self = Self { value: 1.0, tag: Simplification::One };

    /// Creates a constant from a literal value. Literals that are exactly `0` or `1` are tagged
    /// accordingly; every other value is tagged [`Simplification::Neither`].
    pub fn new(value: f64) -> Self {
        let tag = if value == 0.0 {
            Simplification::Zero
        } else if value == 1.0 {
            Simplification::One
        } else {
            Simplification::Neither
        };
        Self { value, tag }
    }

    /// Creates a constant with an explicit tag.
    ///
    /// The tag is trusted as given. Tagging a value other than `0` as [`Simplification::Zero`]
    /// (or other than `1` as [`Simplification::One`]) makes every derivative computed through it
    /// wrong.
    pub fn tagged(value: f64, tag: Simplification) -> Self {
        Self { value, tag }
    }
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
