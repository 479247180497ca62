use crate::types::{halve, one, zero, Coefficient, Order};

use super::path::{merge_path, LineagePath};

/// Branch seeded at the first query individual.
pub const FIRST: usize = 0;
/// Branch seeded at the second query individual.
pub const SECOND: usize = 1;

/// Per-query-individual state of one node.
#[derive(Debug, Clone)]
pub struct KinshipInfoBranch {
    /// Share of the query individual's genetic material reaching this node:
    /// `1` at the query individual, halved at each generation.
    pub weight: Coefficient,
    /// Set once the branch reached this node; the node then counts towards
    /// the live frontier until it is resolved.
    pub is_ancestor: bool,
    /// Coalesced lineage paths, kept only when paths are reconstructed.
    pub paths: Vec<LineagePath>,
}

impl KinshipInfoBranch {
    pub fn empty() -> Self {
        Self {
            weight: zero(),
            is_ancestor: false,
            paths: Vec::new(),
        }
    }

    /// State of a query individual on its own branch.
    pub fn seed(with_paths: bool) -> Self {
        Self {
            weight: one(),
            is_ancestor: true,
            paths: if with_paths {
                vec![LineagePath::origin()]
            } else {
                Vec::new()
            },
        }
    }

    /// Half of the weight, as transmitted to a parent. `None` if the branch
    /// never reached this node.
    pub fn transmitted(&self) -> Option<Coefficient> {
        self.is_ancestor.then(|| halve(&self.weight))
    }

    pub fn merge_path(&mut self, path: LineagePath) {
        merge_path(&mut self.paths, path);
    }
}

/// Working state of one individual during one kinship query.
#[derive(Debug, Clone)]
pub struct KinshipInfo {
    pub xref: String,
    pub order: Order,
    /// Mass already counted through a single child, to subtract on resolve.
    pub coefficient: Coefficient,
    pub branches: [KinshipInfoBranch; 2],
    /// Set while every route reaching this node runs through a reported
    /// common ancestor. Starts set, is cleared by seeding or by any child
    /// without the flag, and is set again once the node itself is reported.
    pub remove_ancestors: bool,
}

impl KinshipInfo {
    pub fn new(xref: impl Into<String>, order: Order) -> Self {
        Self {
            xref: xref.into(),
            order,
            coefficient: zero(),
            branches: [KinshipInfoBranch::empty(), KinshipInfoBranch::empty()],
            remove_ancestors: true,
        }
    }

    /// Contribution of this node to the raw kinship mass.
    pub fn contribution(&self, consanguinity: &Coefficient) -> Coefficient {
        let shared = &self.branches[FIRST].weight * &self.branches[SECOND].weight;
        let correction = &self.coefficient * (one() + consanguinity);
        shared - correction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn ratio(n: i64, d: i64) -> Coefficient {
        Coefficient::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_transmitted_only_when_reached() {
        let empty = KinshipInfoBranch::empty();
        assert!(empty.transmitted().is_none());

        let seeded = KinshipInfoBranch::seed(true);
        assert_eq!(seeded.transmitted(), Some(ratio(1, 2)));
        assert_eq!(seeded.paths, vec![LineagePath::origin()]);
        assert!(KinshipInfoBranch::seed(false).paths.is_empty());
    }

    #[test]
    fn test_contribution_subtracts_correction() {
        let mut info = KinshipInfo::new("G", 2);
        info.branches[FIRST].weight = ratio(1, 4);
        info.branches[SECOND].weight = ratio(1, 4);
        info.coefficient = ratio(1, 16);
        assert_eq!(info.contribution(&zero()), zero());

        info.coefficient = ratio(1, 32);
        assert_eq!(info.contribution(&zero()), ratio(1, 32));
        assert_eq!(info.contribution(&ratio(1, 1)), zero());
    }
}
