//! This module defines the unit types used for floor space and energy quantities.
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Div, Mul};

/// Represents a dimensionless quantity (e.g. a rate or a growth factor).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Default,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct Dimensionless(pub f64);

impl Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// The magnitude of the quantity
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            /// Whether the underlying value is neither infinite nor NaN
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Round to the given number of decimal places (half away from zero)
            pub fn round_to(self, decimals: i32) -> Self {
                let factor = 10f64.powi(decimals);
                Self((self.0 * factor).round() / factor)
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> Sum<&'a $name> for $name {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                iter.copied().sum()
            }
        }

        impl Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Area);
unit_struct!(Energy);

// Derived quantities
unit_struct!(EnergyPerArea);

impl_mul!(Area, EnergyPerArea, Energy);
impl_div!(Energy, Area, EnergyPerArea);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(Area(298.791_173_5).round_to(2), Area(298.79));
        assert_eq!(Area(-1.005_1).round_to(2), Area(-1.01));
        assert_eq!(Area(0.125).round_to(0), Area(0.0));
    }

    #[test]
    fn test_area_times_eui() {
        let energy = Area(200.0) * EnergyPerArea(0.5);
        assert_eq!(energy, Energy(100.0));
        assert_eq!(energy / Area(50.0), EnergyPerArea(2.0));
    }

    #[test]
    fn test_sum() {
        let areas = [Area(1.0), Area(2.5), Area(3.5)];
        assert_eq!(areas.iter().sum::<Area>(), Area(7.0));
    }
}
