pub mod cost;
pub mod energy;
pub mod power;
pub mod rate;
pub mod time;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Scalar tagged with its dimensions, so that kilowatts never get added to kilowatt-hours.
#[derive(
    Clone,
    Copy,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
#[from(f64, OrderedFloat<f64>)]
#[must_use]
pub struct Quantity<const POWER: isize, const TIME: isize, const COST: isize>(
    pub OrderedFloat<f64>,
);

impl<const POWER: isize, const TIME: isize, const COST: isize> Quantity<POWER, TIME, COST> {
    pub const ZERO: Self = Self(OrderedFloat(0.0));

    pub const fn new(value: f64) -> Self {
        Self(OrderedFloat(value))
    }

    pub const fn into_inner(self) -> f64 {
        self.0.0
    }

    /// Finite and strictly above zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0.is_finite() && self > Self::ZERO
    }
}

impl<const POWER: isize, const TIME: isize, const COST: isize> Default
    for Quantity<POWER, TIME, COST>
{
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::{Debug, Formatter};

    use super::*;

    pub type Bare = Quantity<0, 0, 0>;

    impl Debug for Bare {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    #[test]
    fn test_max() {
        assert_eq!(Bare::new(1.0).max(Bare::new(2.0)), Bare::new(2.0));
        assert_eq!(Bare::new(2.0).max(Bare::new(1.0)), Bare::new(2.0));
    }

    #[test]
    fn test_is_positive() {
        assert!(Bare::new(0.5).is_positive());
        assert!(!Bare::ZERO.is_positive());
        assert!(!Bare::new(-1.0).is_positive());
        assert!(!Bare::new(f64::INFINITY).is_positive());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("0.263".parse::<Bare>().unwrap(), Bare::new(0.263));
        assert!("abc".parse::<Bare>().is_err());
    }
}
