use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::error::Result;
use crate::genetics::GraphProvider;

use super::builder::TopologyBuilder;
use super::order::Topology;

/// Topologies of several trees, keyed by tree name.
///
/// Rebuilding takes the write lock, so a rebuild never interleaves with a
/// reader fetching the topology of the same registry. Queries keep their own
/// `Arc` and are unaffected by a later rebuild.
#[derive(Debug, Default)]
pub struct TopologyCache {
    topologies: RwLock<HashMap<String, Arc<Topology>>>,
}

impl TopologyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached topology of `tree`, if any.
    pub fn get(&self, tree: &str) -> Option<Arc<Topology>> {
        self.topologies.read().get(tree).cloned()
    }

    /// Return the topology of the provider's tree, building it when missing
    /// or when `force_rebuild` is set.
    ///
    /// # Errors
    /// Build errors are returned and leave any cached topology untouched.
    pub fn get_or_build<P: GraphProvider + ?Sized>(
        &self,
        provider: &P,
        force_rebuild: bool,
    ) -> Result<Arc<Topology>> {
        if !force_rebuild {
            if let Some(topology) = self.get(provider.tree()) {
                return Ok(topology);
            }
        }

        let mut topologies = self.topologies.write();
        if !force_rebuild {
            // Another caller may have built it while we waited for the lock.
            if let Some(topology) = topologies.get(provider.tree()) {
                return Ok(Arc::clone(topology));
            }
        }

        debug!("building topology for tree '{}'", provider.tree());
        let topology = Arc::new(TopologyBuilder::new(provider).build()?);
        topologies.insert(provider.tree().to_string(), Arc::clone(&topology));
        Ok(topology)
    }

    /// Store an externally persisted topology.
    pub fn insert(&self, topology: Topology) -> Arc<Topology> {
        let topology = Arc::new(topology);
        self.topologies
            .write()
            .insert(topology.tree().to_string(), Arc::clone(&topology));
        topology
    }

    /// Drop the cached topology of `tree`. Returns whether one was cached.
    pub fn invalidate(&self, tree: &str) -> bool {
        self.topologies.write().remove(tree).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::Pedigree;

    fn pedigree() -> Pedigree {
        let mut ped = Pedigree::new("family");
        ped.add_individual("F", None, None).unwrap();
        ped.add_individual("C", Some("F"), None).unwrap();
        ped
    }

    #[test]
    fn test_reuses_cached_topology() {
        let cache = TopologyCache::new();
        let ped = pedigree();
        let first = cache.get_or_build(&ped, false).unwrap();
        let second = cache.get_or_build(&ped, false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_force_rebuild_sees_new_parentage() {
        let cache = TopologyCache::new();
        let mut ped = pedigree();
        let before = cache.get_or_build(&ped, false).unwrap();
        assert_eq!(before.order("F"), Some(1));

        ped.add_individual("G", Some("C"), None).unwrap();
        let stale = cache.get_or_build(&ped, false).unwrap();
        assert_eq!(stale.order("G"), None);

        let rebuilt = cache.get_or_build(&ped, true).unwrap();
        assert_eq!(rebuilt.order("F"), Some(2));
        // The previously handed-out topology is unchanged.
        assert_eq!(before.order("F"), Some(1));
    }

    #[test]
    fn test_failed_rebuild_keeps_previous() {
        let cache = TopologyCache::new();
        let good = pedigree();
        cache.get_or_build(&good, false).unwrap();

        let cyclic = Pedigree::from_records(
            "family",
            &[
                ("A".to_string(), Some("B".to_string()), None),
                ("B".to_string(), Some("A".to_string()), None),
            ],
        )
        .unwrap();
        assert!(cache.get_or_build(&cyclic, true).is_err());
        assert_eq!(cache.get("family").unwrap().order("C"), Some(0));
    }

    #[test]
    fn test_insert_and_invalidate() {
        let cache = TopologyCache::new();
        cache.insert(Topology::from_orders("other", HashMap::new()));
        assert!(cache.get("other").is_some());
        assert!(cache.invalidate("other"));
        assert!(!cache.invalidate("other"));
    }
}
