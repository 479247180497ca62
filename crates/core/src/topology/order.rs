use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Order;

/// Topological levels of the individuals of one tree.
///
/// Every parent has a strictly greater order than each of its leveled
/// children, and the assignment is the minimal one: individuals without
/// leveled children are at order `0`. Provisional individuals have no order.
///
/// Serializes as `{tree, orders}`; the per-level index is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TopologyRecord", into = "TopologyRecord")]
pub struct Topology {
    tree: String,
    orders: HashMap<String, Order>,
    /// `levels[L]` lists the individuals of order `L`.
    levels: Vec<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
struct TopologyRecord {
    tree: String,
    orders: HashMap<String, Order>,
}

impl Topology {
    /// Build a topology from an already computed order table.
    ///
    /// No parentage check is made; use
    /// [`TopologyBuilder`](super::TopologyBuilder) to compute orders.
    pub fn from_orders(tree: impl Into<String>, orders: HashMap<String, Order>) -> Self {
        let max = orders.values().copied().max();
        let mut levels: Vec<Vec<String>> = match max {
            Some(m) => vec![Vec::new(); m as usize + 1],
            None => Vec::new(),
        };
        for (xref, &order) in &orders {
            levels[order as usize].push(xref.clone());
        }
        for level in &mut levels {
            level.sort();
        }

        Self {
            tree: tree.into(),
            orders,
            levels,
        }
    }

    pub fn tree(&self) -> &str {
        &self.tree
    }

    /// Order of `xref`, or `None` if it was not leveled.
    pub fn order(&self, xref: &str) -> Option<Order> {
        self.orders.get(xref).copied()
    }

    pub fn contains(&self, xref: &str) -> bool {
        self.orders.contains_key(xref)
    }

    /// Individuals at `order`, sorted by identifier.
    pub fn individuals_at(&self, order: Order) -> &[String] {
        self.levels
            .get(order as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Highest order in the table, `None` when empty.
    pub fn max_order(&self) -> Option<Order> {
        self.levels.len().checked_sub(1).map(|m| m as Order)
    }

    /// Number of leveled individuals.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// `(xref, order)` pairs level by level, youngest generation first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Order)> {
        self.levels.iter().enumerate().flat_map(|(order, xrefs)| {
            xrefs.iter().map(move |x| (x.as_str(), order as Order))
        })
    }
}

impl From<TopologyRecord> for Topology {
    fn from(record: TopologyRecord) -> Self {
        Topology::from_orders(record.tree, record.orders)
    }
}

impl From<Topology> for TopologyRecord {
    fn from(topology: Topology) -> Self {
        TopologyRecord {
            tree: topology.tree,
            orders: topology.orders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Topology {
        let orders = [("C", 0), ("D", 0), ("F", 1), ("G", 2)]
            .iter()
            .map(|(x, o)| (x.to_string(), *o))
            .collect();
        Topology::from_orders("t", orders)
    }

    #[test]
    fn test_reverse_index() {
        let topo = sample();
        assert_eq!(topo.individuals_at(0), &["C".to_string(), "D".to_string()]);
        assert_eq!(topo.individuals_at(2), &["G".to_string()]);
        assert!(topo.individuals_at(7).is_empty());
        assert_eq!(topo.max_order(), Some(2));
        assert_eq!(topo.len(), 4);
        assert_eq!(topo.order("F"), Some(1));
        assert_eq!(topo.order("Z"), None);
    }

    #[test]
    fn test_iter_youngest_first() {
        let orders: Vec<Order> = sample().iter().map(|(_, o)| o).collect();
        assert_eq!(orders, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_empty() {
        let topo = Topology::from_orders("t", HashMap::new());
        assert!(topo.is_empty());
        assert_eq!(topo.max_order(), None);
    }

    #[test]
    fn test_json_round_trip_rebuilds_levels() {
        let topo = sample();
        let json = serde_json::to_string(&topo).unwrap();
        assert!(!json.contains("levels"));
        let back: Topology = serde_json::from_str(&json).unwrap();
        assert_eq!(back, topo);
        assert_eq!(back.individuals_at(1), &["F".to_string()]);
    }
}
