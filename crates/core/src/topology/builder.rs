use std::collections::HashMap;

use log::{debug, trace};

use crate::error::{KinshipError, Result};
use crate::genetics::GraphProvider;
use crate::types::Order;

use super::order::Topology;

/// Computes the minimal topological levels of a tree.
///
/// Works in two passes, like Kahn's algorithm drained level by level:
///
/// 1. *Populate*: every confirmed individual gets a counter of the confirmed
///    children in the dataset that reference it as a father or mother.
/// 2. *Level*: all individuals with a zero counter get order `0`. Leveling an
///    individual at `L` decrements the counters of its parents, and a parent
///    whose counter drops to zero is leveled at `L + 1`.
///
/// Provisional individuals take no part: they get no counter, no order, and
/// never count towards their parents.
pub struct TopologyBuilder<'a, P: GraphProvider + ?Sized> {
    provider: &'a P,
}

/// Dataset prepared by the populate pass.
struct Dependencies {
    ids: Vec<String>,
    /// Father and mother indices inside the dataset.
    parents: Vec<[Option<usize>; 2]>,
    /// Number of not-yet-leveled children referencing each individual.
    pending: Vec<u32>,
}

impl<'a, P: GraphProvider + ?Sized> TopologyBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Level every individual the provider knows.
    ///
    /// # Errors
    /// [`KinshipError::CycleDetected`] if some individual is its own
    /// ancestor; provider errors are propagated.
    pub fn build(&self) -> Result<Topology> {
        let individuals = self.provider.individuals()?;
        self.build_from(individuals)
    }

    /// Level a partial set of individuals.
    ///
    /// Parent links leading outside the set are ignored, so those parents do
    /// not receive an order.
    ///
    /// # Errors
    /// Same as [`TopologyBuilder::build`].
    pub fn build_from<I>(&self, individuals: I) -> Result<Topology>
    where
        I: IntoIterator<Item = String>,
    {
        let deps = self.populate(individuals)?;
        let n = deps.ids.len();
        let orders = level(deps)?;

        debug!(
            "tree '{}': leveled {} of {} individuals into {} orders",
            self.provider.tree(),
            orders.len(),
            n,
            orders.values().max().map_or(0, |m| m + 1)
        );

        Ok(Topology::from_orders(self.provider.tree(), orders))
    }

    fn populate<I>(&self, individuals: I) -> Result<Dependencies>
    where
        I: IntoIterator<Item = String>,
    {
        let mut ids = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for xref in individuals {
            if index.contains_key(&xref) || self.provider.is_provisional(&xref)? {
                continue;
            }
            index.insert(xref.clone(), ids.len());
            ids.push(xref);
        }

        let mut parents = vec![[None, None]; ids.len()];
        let mut pending = vec![0u32; ids.len()];

        for (i, xref) in ids.iter().enumerate() {
            let pair = self.provider.primary_parents(xref)?;
            for (slot, parent) in [pair.father, pair.mother].into_iter().enumerate() {
                let Some(p) = parent.and_then(|p| index.get(&p).copied()) else {
                    continue;
                };
                parents[i][slot] = Some(p);
                pending[p] += 1;
            }
        }

        Ok(Dependencies {
            ids,
            parents,
            pending,
        })
    }
}

/// Level-synchronized drain of the dependency counters.
fn level(deps: Dependencies) -> Result<HashMap<String, Order>> {
    let Dependencies {
        ids,
        parents,
        mut pending,
    } = deps;

    let n = ids.len();
    let mut order_of: Vec<Option<Order>> = vec![None; n];
    let mut current: Vec<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
    let mut order: Order = 0;
    let mut assigned = 0usize;

    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            order_of[i] = Some(order);
            assigned += 1;
            for p in parents[i].iter().flatten().copied() {
                pending[p] -= 1;
                if pending[p] == 0 {
                    next.push(p);
                }
            }
        }
        trace!("order {}: {} individuals", order, current.len());
        current = next;
        order += 1;
    }

    if assigned != n {
        return Err(KinshipError::CycleDetected {
            unresolved: n - assigned,
        });
    }

    Ok(ids
        .into_iter()
        .zip(order_of)
        .filter_map(|(id, o)| o.map(|o| (id, o)))
        .collect())
}
