use std::collections::BTreeSet;

use num_traits::Zero;

use crate::types::{format_exact, one, to_f64, zero, Coefficient, Order};

use super::path::LineagePath;

/// An ancestor shared by both query individuals that contributes to their
/// kinship.
#[derive(Debug, Clone)]
pub struct CommonAncestor {
    pub xref: String,
    pub order: Order,
    /// This ancestor's share of the final coefficient.
    pub contribution: Coefficient,
    /// Lineage paths from the first query individual.
    pub first_paths: Vec<LineagePath>,
    /// Lineage paths from the second query individual.
    pub second_paths: Vec<LineagePath>,
}

impl CommonAncestor {
    /// Generations between this ancestor and each query individual along the
    /// shortest paths.
    pub fn generations(&self) -> Option<(u32, u32)> {
        let first = self.first_paths.first()?.depth;
        let second = self.second_paths.first()?.depth;
        Some((first, second))
    }
}

/// Outcome of one kinship query.
#[derive(Debug, Clone)]
pub struct KinshipResult {
    /// Exact kinship coefficient.
    pub coefficient: Coefficient,
    /// Closest contributing common ancestors, lowest order first. Only filled
    /// when paths were reconstructed.
    pub common_ancestors: Vec<CommonAncestor>,
    pub paths_reconstructed: bool,
}

impl KinshipResult {
    /// Result for an individual compared with itself.
    pub fn identity(paths_reconstructed: bool) -> Self {
        Self {
            coefficient: one(),
            common_ancestors: Vec::new(),
            paths_reconstructed,
        }
    }

    /// Result for two individuals without shared ancestry.
    pub fn unrelated(paths_reconstructed: bool) -> Self {
        Self {
            coefficient: zero(),
            common_ancestors: Vec::new(),
            paths_reconstructed,
        }
    }

    pub fn coefficient_f64(&self) -> f64 {
        to_f64(&self.coefficient)
    }

    pub fn is_related(&self) -> bool {
        !self.coefficient.is_zero()
    }

    pub fn common_ancestor_ids(&self) -> BTreeSet<&str> {
        self.common_ancestors.iter().map(|a| a.xref.as_str()).collect()
    }

    pub fn common_ancestor(&self, xref: &str) -> Option<&CommonAncestor> {
        self.common_ancestors.iter().find(|a| a.xref == xref)
    }

    /// Print a formatted summary of the query result.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("=== Kinship ===\n\n");
        s.push_str(&format!(
            "Coefficient: {} ({:.6})\n",
            format_exact(&self.coefficient),
            self.coefficient_f64()
        ));

        if !self.paths_reconstructed {
            return s;
        }

        s.push_str(&format!(
            "\n--- Common Ancestors ({}) ---\n",
            self.common_ancestors.len()
        ));
        for ancestor in &self.common_ancestors {
            s.push_str(&format!(
                "  {} (order {}): {} ({:.6})\n",
                ancestor.xref,
                ancestor.order,
                format_exact(&ancestor.contribution),
                to_f64(&ancestor.contribution)
            ));
            for (side, paths) in [("first", &ancestor.first_paths), ("second", &ancestor.second_paths)] {
                for path in paths.iter() {
                    s.push_str(&format!(
                        "    {} side: {} generation(s) x{}",
                        side, path.depth, path.multiplicity
                    ));
                    if !path.intermediates.is_empty() {
                        s.push_str(&format!(" via {}", path.intermediates.join(" > ")));
                    }
                    s.push('\n');
                }
            }
        }

        s
    }
}
