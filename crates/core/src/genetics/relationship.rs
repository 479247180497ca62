use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::error::{KinshipError, Result};
use crate::topology::Topology;

use super::provider::GraphProvider;

/// Additive relationships computed with the recursive tabular rules, in
/// floating point.
///
/// For individuals *p* and *q*, with *q* not older than *p* (its order is not
/// greater, so it cannot be an ancestor of *p*):
///
/// - a(p, p) = 1 + F(p)
/// - F(p)    = a(father_p, mother_p) / 2, or 0 when a parent is unknown
/// - a(p, q) = (a(p, father_q) + a(p, mother_q)) / 2, unknown parents adding 0
///
/// The kinship coefficient is a(p, q) / 2. Parents without an order in the
/// topology (provisional, or outside a partial set) count as unknown.
///
/// Results are memoized per calculator, so reuse one calculator for many
/// pairs of the same tree.
pub struct RelationshipCalculator<'a, P: GraphProvider + ?Sized> {
    provider: &'a P,
    topology: &'a Topology,
    cache: HashMap<(String, String), f64>,
    inbreeding: HashMap<String, f64>,
}

impl<'a, P: GraphProvider + ?Sized> RelationshipCalculator<'a, P> {
    pub fn new(provider: &'a P, topology: &'a Topology) -> Self {
        Self {
            provider,
            topology,
            cache: HashMap::new(),
            inbreeding: HashMap::new(),
        }
    }

    /// Additive relationship a(p, q).
    ///
    /// # Errors
    /// [`KinshipError::NotInTopology`] if either individual has no order;
    /// provider errors are propagated.
    pub fn relationship(&mut self, p: &str, q: &str) -> Result<f64> {
        let p_order = self.order(p)?;
        let q_order = self.order(q)?;

        if p == q {
            return Ok(1.0 + self.inbreeding(p)?);
        }

        let key = if p < q {
            (p.to_string(), q.to_string())
        } else {
            (q.to_string(), p.to_string())
        };
        if let Some(&val) = self.cache.get(&key) {
            return Ok(val);
        }

        // Recurse on the parents of the younger one.
        let (older, younger) = if p_order >= q_order { (p, q) } else { (q, p) };
        let mut sum = 0.0;
        for parent in self.known_parents(younger)? {
            sum += self.relationship(older, &parent)?;
        }
        let result = 0.5 * sum;

        self.cache.insert(key, result);
        Ok(result)
    }

    /// Kinship coefficient a(p, q) / 2.
    pub fn kinship(&mut self, p: &str, q: &str) -> Result<f64> {
        Ok(0.5 * self.relationship(p, q)?)
    }

    /// Inbreeding coefficient F(p).
    pub fn inbreeding(&mut self, p: &str) -> Result<f64> {
        if let Some(&f) = self.inbreeding.get(p) {
            return Ok(f);
        }

        let parents = self.known_parents(p)?;
        let f = match parents.as_slice() {
            [father, mother] => 0.5 * self.relationship(father, mother)?,
            _ => 0.0,
        };

        self.inbreeding.insert(p.to_string(), f);
        Ok(f)
    }

    /// Symmetric additive relationship matrix of `ids`, in the given order.
    pub fn matrix(&mut self, ids: &[&str]) -> Result<DMatrix<f64>> {
        let n = ids.len();
        let mut a = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                let val = self.relationship(ids[i], ids[j])?;
                a[(i, j)] = val;
                a[(j, i)] = val;
            }
        }
        Ok(a)
    }

    fn order(&self, xref: &str) -> Result<u32> {
        self.topology
            .order(xref)
            .ok_or_else(|| KinshipError::NotInTopology(xref.to_string()))
    }

    fn known_parents(&self, xref: &str) -> Result<Vec<String>> {
        let pair = self.provider.primary_parents(xref)?;
        Ok(pair
            .iter()
            .filter(|p| self.topology.contains(p))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::Pedigree;
    use crate::topology::TopologyBuilder;
    use approx::assert_relative_eq;

    /// 3 and 4 are half-sibs through 1; 5 = 4 x 3 is inbred; 6 = 5 x 2.
    fn mrode_pedigree() -> (Pedigree, Topology) {
        let triples = vec![
            ("1".to_string(), None, None),
            ("2".to_string(), None, None),
            ("3".to_string(), Some("1".to_string()), Some("2".to_string())),
            ("4".to_string(), Some("1".to_string()), None),
            ("5".to_string(), Some("4".to_string()), Some("3".to_string())),
            ("6".to_string(), Some("5".to_string()), Some("2".to_string())),
        ];
        let ped = Pedigree::from_records("mrode", &triples).unwrap();
        let topo = TopologyBuilder::new(&ped).build().unwrap();
        (ped, topo)
    }

    #[test]
    fn test_mrode_relationships() {
        let (ped, topo) = mrode_pedigree();
        let mut calc = RelationshipCalculator::new(&ped, &topo);

        assert_relative_eq!(calc.relationship("1", "3").unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(calc.relationship("3", "4").unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(calc.relationship("1", "5").unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(calc.relationship("5", "5").unwrap(), 1.125, epsilon = 1e-12);
        assert_relative_eq!(calc.relationship("2", "6").unwrap(), 0.625, epsilon = 1e-12);
        assert_relative_eq!(calc.inbreeding("6").unwrap(), 0.125, epsilon = 1e-12);
        assert_relative_eq!(calc.kinship("3", "4").unwrap(), 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let (ped, topo) = mrode_pedigree();
        let mut calc = RelationshipCalculator::new(&ped, &topo);
        let ids = ["1", "2", "3", "4", "5", "6"];
        let a = calc.matrix(&ids).unwrap();

        assert_eq!(a.nrows(), 6);
        assert_relative_eq!(a, a.transpose(), epsilon = 1e-12);
        assert_relative_eq!(a[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(a[(5, 5)], 1.125, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_individual() {
        let (ped, topo) = mrode_pedigree();
        let mut calc = RelationshipCalculator::new(&ped, &topo);
        assert!(matches!(
            calc.relationship("1", "99"),
            Err(KinshipError::NotInTopology(_))
        ));
    }
}
