use std::collections::HashMap;

use crate::types::{zero, Coefficient};

/// Per-individual consanguinity input of the kinship engine.
///
/// It scales the re-convergence correction of a resolved ancestor. The
/// engine's default, [`NoConsanguinity`], is zero for everyone.
pub trait Consanguinity {
    fn consanguinity(&self, xref: &str) -> Coefficient;
}

/// Zero for every individual.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConsanguinity;

impl Consanguinity for NoConsanguinity {
    fn consanguinity(&self, _xref: &str) -> Coefficient {
        zero()
    }
}

/// Explicit values for some individuals, zero for the rest.
#[derive(Debug, Clone, Default)]
pub struct FixedConsanguinity {
    values: HashMap<String, Coefficient>,
}

impl FixedConsanguinity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, xref: impl Into<String>, value: Coefficient) -> Self {
        self.values.insert(xref.into(), value);
        self
    }

    pub fn insert(&mut self, xref: impl Into<String>, value: Coefficient) {
        self.values.insert(xref.into(), value);
    }
}

impl FromIterator<(String, Coefficient)> for FixedConsanguinity {
    fn from_iter<I: IntoIterator<Item = (String, Coefficient)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Consanguinity for FixedConsanguinity {
    fn consanguinity(&self, xref: &str) -> Coefficient {
        self.values.get(xref).cloned().unwrap_or_else(zero)
    }
}

impl<C: Consanguinity + ?Sized> Consanguinity for &C {
    fn consanguinity(&self, xref: &str) -> Coefficient {
        (**self).consanguinity(xref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_traits::Zero;

    #[test]
    fn test_default_is_zero() {
        assert!(NoConsanguinity.consanguinity("anyone").is_zero());
    }

    #[test]
    fn test_fixed_values_fall_back_to_zero() {
        let quarter = Coefficient::new(BigInt::from(1), BigInt::from(4));
        let table = FixedConsanguinity::new().with("X", quarter.clone());
        assert_eq!(table.consanguinity("X"), quarter);
        assert!(table.consanguinity("Y").is_zero());
    }
}
