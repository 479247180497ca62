use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

/// Exact coefficient type. Every weight is a sum of powers of one half, so
/// denominators stay powers of two however deep the pedigree goes.
pub type Coefficient = BigRational;

/// Order (topological level) of an individual. Leaves are `0`.
pub type Order = u32;

pub fn zero() -> Coefficient {
    Coefficient::zero()
}

pub fn one() -> Coefficient {
    Coefficient::one()
}

/// `value / 2`.
pub fn halve(value: &Coefficient) -> Coefficient {
    Coefficient::new(value.numer().clone(), value.denom() * BigInt::from(2))
}

/// Lossy conversion for display and float cross-checks.
pub fn to_f64(value: &Coefficient) -> f64 {
    match (value.numer().to_f64(), value.denom().to_f64()) {
        (Some(n), Some(d)) if d != 0.0 => n / d,
        _ => f64::NAN,
    }
}

/// Render as `numer/denom`, or a bare integer when the denominator is one.
pub fn format_exact(value: &Coefficient) -> String {
    if value.denom().is_one() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}
