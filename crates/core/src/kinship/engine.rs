use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};
use num_traits::Zero;
use rayon::prelude::*;

use crate::error::{KinshipError, Result};
use crate::genetics::{Consanguinity, GraphProvider, IndividualRef, NoConsanguinity};
use crate::topology::Topology;
use crate::types::{halve, zero, Coefficient, Order};

use super::info::{KinshipInfo, KinshipInfoBranch, FIRST, SECOND};
use super::path::LineagePath;
use super::result::{CommonAncestor, KinshipResult};

/// Kinship between two individuals of a tree.
///
/// Both query individuals seed a branch with weight `1`. Nodes are resolved
/// level by level in ascending topological order, starting at the lower order
/// of the two. Resolving a node adds `w1 * w2 - coefficient * (1 + c)` to the
/// raw mass, where `coefficient` collects the products of the halves it
/// received through each single child, then passes half of each weight on to
/// its father and mother. Parents always sit on a higher level, so a node has
/// received everything by the time its level is drained.
///
/// The walk stops once either branch has no unresolved node left. The
/// coefficient is half the raw mass.
///
/// With path reconstruction, a node with a non-zero contribution is reported
/// as a common ancestor unless every child that reached it lies above an
/// already reported ancestor. Such a node only adds the inbreeding of the
/// ancestors below it.
///
/// The engine only reads the provider and the topology; each query owns its
/// working table, so queries may run concurrently.
pub struct KinshipEngine<'a, P: GraphProvider + ?Sized, C = NoConsanguinity> {
    provider: &'a P,
    topology: &'a Topology,
    consanguinity: C,
}

impl<'a, P: GraphProvider + ?Sized> KinshipEngine<'a, P> {
    pub fn new(provider: &'a P, topology: &'a Topology) -> Self {
        Self {
            provider,
            topology,
            consanguinity: NoConsanguinity,
        }
    }
}

impl<'a, P: GraphProvider + ?Sized, C: Consanguinity> KinshipEngine<'a, P, C> {
    /// Replace the consanguinity input.
    pub fn with_consanguinity<D: Consanguinity>(self, consanguinity: D) -> KinshipEngine<'a, P, D> {
        KinshipEngine {
            provider: self.provider,
            topology: self.topology,
            consanguinity,
        }
    }

    pub fn topology(&self) -> &Topology {
        self.topology
    }

    /// Kinship coefficient of `first` and `second`.
    ///
    /// With `reconstruct_paths`, the result also lists the closest
    /// contributing common ancestors with the coalesced lineage paths leading
    /// to them.
    ///
    /// # Errors
    /// - [`KinshipError::SameTreeRequired`] if the individuals belong to
    ///   different trees, or to another tree than the topology.
    /// - [`KinshipError::NotInTopology`] if either individual has no order.
    /// - Provider errors are propagated.
    pub fn compute(
        &self,
        first: &IndividualRef,
        second: &IndividualRef,
        reconstruct_paths: bool,
    ) -> Result<KinshipResult> {
        self.check_trees(first, second)?;
        let first_order = self.order_of(first)?;
        let second_order = self.order_of(second)?;

        if first == second {
            return Ok(KinshipResult::identity(reconstruct_paths));
        }

        let mut table = KinshipTable::new(reconstruct_paths);
        table.seed(FIRST, first.xref(), first_order);
        table.seed(SECOND, second.xref(), second_order);

        let mut query = Query {
            total: zero(),
            common_ancestors: Vec::new(),
        };

        let mut level = first_order.min(second_order);
        while level <= table.max_order && table.live[FIRST] > 0 && table.live[SECOND] > 0 {
            for idx in table.take_level(level) {
                self.resolve(&mut table, &mut query, idx)?;
            }
            level += 1;
        }

        let coefficient = halve(&query.total);
        debug!(
            "kinship {} / {}: {} ({} nodes, stopped before order {})",
            first,
            second,
            coefficient,
            table.nodes.len(),
            level
        );

        if coefficient.is_zero() && query.common_ancestors.is_empty() {
            return Ok(KinshipResult::unrelated(reconstruct_paths));
        }
        Ok(KinshipResult {
            coefficient,
            common_ancestors: query.common_ancestors,
            paths_reconstructed: reconstruct_paths,
        })
    }

    /// Run independent queries in parallel over the shared topology.
    ///
    /// Results are returned in the order of `pairs`.
    pub fn compute_many(
        &self,
        pairs: &[(IndividualRef, IndividualRef)],
        reconstruct_paths: bool,
    ) -> Vec<Result<KinshipResult>>
    where
        P: Sync,
        C: Sync,
    {
        pairs
            .par_iter()
            .map(|(first, second)| self.compute(first, second, reconstruct_paths))
            .collect()
    }

    fn check_trees(&self, first: &IndividualRef, second: &IndividualRef) -> Result<()> {
        if self.provider.tree() != self.topology.tree() {
            return Err(KinshipError::Pedigree(format!(
                "topology of tree '{}' used with a provider for tree '{}'",
                self.topology.tree(),
                self.provider.tree()
            )));
        }
        if first.tree() != second.tree() {
            return Err(KinshipError::SameTreeRequired {
                first: first.to_string(),
                second: second.to_string(),
            });
        }
        if first.tree() != self.topology.tree() {
            return Err(KinshipError::SameTreeRequired {
                first: first.to_string(),
                second: self.topology.tree().to_string(),
            });
        }
        Ok(())
    }

    fn order_of(&self, individual: &IndividualRef) -> Result<Order> {
        self.topology
            .order(individual.xref())
            .ok_or_else(|| KinshipError::NotInTopology(individual.to_string()))
    }

    fn resolve(&self, table: &mut KinshipTable, query: &mut Query, idx: usize) -> Result<()> {
        let node = &table.nodes[idx];
        let consanguinity = self.consanguinity.consanguinity(&node.xref);
        let contribution = node.contribution(&consanguinity);
        trace!("resolve {} (order {}): {}", node.xref, node.order, contribution);

        for branch in [FIRST, SECOND] {
            if node.branches[branch].is_ancestor {
                table.live[branch] -= 1;
            }
        }

        if table.reconstruct_paths && !contribution.is_zero() && !node.remove_ancestors {
            query.common_ancestors.push(CommonAncestor {
                xref: node.xref.clone(),
                order: node.order,
                contribution: halve(&contribution),
                first_paths: node.branches[FIRST].paths.clone(),
                second_paths: node.branches[SECOND].paths.clone(),
            });
            table.nodes[idx].remove_ancestors = true;
        }

        query.total += contribution;
        self.propagate(table, idx)
    }

    fn propagate(&self, table: &mut KinshipTable, idx: usize) -> Result<()> {
        let child = &table.nodes[idx];
        let parents = self.provider.primary_parents(&child.xref)?;
        if parents.is_empty() {
            return Ok(());
        }

        let halves = [
            child.branches[FIRST].transmitted(),
            child.branches[SECOND].transmitted(),
        ];
        let correction = match &halves {
            [Some(a), Some(b)] => Some(a * b),
            _ => None,
        };
        let remove_ancestors = child.remove_ancestors;
        let paths: [Vec<LineagePath>; 2] = if table.reconstruct_paths {
            [FIRST, SECOND].map(|b| {
                child.branches[b]
                    .paths
                    .iter()
                    .map(|p| p.extended(&child.xref))
                    .collect()
            })
        } else {
            [Vec::new(), Vec::new()]
        };
        let child_xref = child.xref.clone();

        for parent in parents.iter() {
            let Some(order) = self.topology.order(parent) else {
                trace!("{}: parent {} has no order, branch ends", child_xref, parent);
                continue;
            };
            debug_assert!(order > table.nodes[idx].order, "parent below its child");

            let p = table.discover(parent, order);
            for branch in [FIRST, SECOND] {
                if let Some(weight) = &halves[branch] {
                    table.reach(p, branch, weight, &paths[branch]);
                }
            }

            let info = &mut table.nodes[p];
            if let Some(correction) = &correction {
                info.coefficient += correction;
            }
            // Any child off a reported ancestor's lineage keeps the parent
            // reportable.
            info.remove_ancestors &= remove_ancestors;
        }

        Ok(())
    }
}

/// Accumulators of one query.
struct Query {
    total: Coefficient,
    common_ancestors: Vec<CommonAncestor>,
}

/// Working state of one query: an arena of [`KinshipInfo`] keyed by
/// identifier, plus the queue of discovered but unresolved nodes per order.
struct KinshipTable {
    reconstruct_paths: bool,
    index: HashMap<String, usize>,
    nodes: Vec<KinshipInfo>,
    pending: BTreeMap<Order, Vec<usize>>,
    /// Unresolved nodes reached by each branch.
    live: [usize; 2],
    max_order: Order,
}

impl KinshipTable {
    fn new(reconstruct_paths: bool) -> Self {
        Self {
            reconstruct_paths,
            index: HashMap::new(),
            nodes: Vec::new(),
            pending: BTreeMap::new(),
            live: [0, 0],
            max_order: 0,
        }
    }

    fn seed(&mut self, branch: usize, xref: &str, order: Order) {
        let idx = self.discover(xref, order);
        let node = &mut self.nodes[idx];
        node.branches[branch] = KinshipInfoBranch::seed(self.reconstruct_paths);
        node.remove_ancestors = false;
        self.live[branch] += 1;
    }

    /// Index of `xref`, creating and queueing its state on first sight.
    fn discover(&mut self, xref: &str, order: Order) -> usize {
        if let Some(&idx) = self.index.get(xref) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(KinshipInfo::new(xref, order));
        self.index.insert(xref.to_string(), idx);
        self.pending.entry(order).or_default().push(idx);
        self.max_order = self.max_order.max(order);
        idx
    }

    /// Add `weight` and `paths` of a child's branch to node `idx`.
    fn reach(&mut self, idx: usize, branch: usize, weight: &Coefficient, paths: &[LineagePath]) {
        let state = &mut self.nodes[idx].branches[branch];
        state.weight += weight;
        for path in paths {
            state.merge_path(path.clone());
        }
        if !state.is_ancestor {
            state.is_ancestor = true;
            self.live[branch] += 1;
        }
    }

    fn take_level(&mut self, order: Order) -> Vec<usize> {
        self.pending.remove(&order).unwrap_or_default()
    }
}
