//! Property tests on generated acyclic pedigrees.
//!
//! Individual `i` may only have parents among `0..i`, so every generated
//! pedigree is a DAG, usually with plenty of pedigree collapse.

use std::collections::HashMap;

use num_traits::{One, Zero};
use proptest::prelude::*;
use proptest::sample::Index;

use pedigree_kinship_core::genetics::{GraphProvider, Pedigree, RelationshipCalculator};
use pedigree_kinship_core::kinship::KinshipEngine;
use pedigree_kinship_core::topology::TopologyBuilder;
use pedigree_kinship_core::Coefficient;

type RawPedigree = Vec<(Option<u16>, Option<u16>)>;

fn raw_pedigree() -> impl Strategy<Value = RawPedigree> {
    prop::collection::vec(
        (prop::option::of(any::<u16>()), prop::option::of(any::<u16>())),
        1..40,
    )
}

fn pedigree(raw: &RawPedigree) -> Pedigree {
    let records: Vec<(String, Option<String>, Option<String>)> = raw
        .iter()
        .enumerate()
        .map(|(i, &(f, m))| {
            let pick = |v: Option<u16>| v.filter(|_| i > 0).map(|v| v as usize % i);
            let father = pick(f);
            let mother = pick(m).filter(|&m| Some(m) != father);
            (
                format!("I{}", i),
                father.map(|p| format!("I{}", p)),
                mother.map(|p| format!("I{}", p)),
            )
        })
        .collect();
    Pedigree::from_records("generated", &records).unwrap()
}

proptest! {
    #[test]
    fn topology_orders_are_minimal(raw in raw_pedigree()) {
        let ped = pedigree(&raw);
        let topo = TopologyBuilder::new(&ped).build().unwrap();
        prop_assert_eq!(topo.len(), ped.n_individuals());

        let mut highest_child: HashMap<String, u32> = HashMap::new();
        for id in ped.individuals().unwrap() {
            let child_order = topo.order(&id).unwrap();
            for parent in ped.primary_parents(&id).unwrap().iter() {
                let parent_order = topo.order(parent).unwrap();
                prop_assert!(parent_order > child_order);
                let entry = highest_child.entry(parent.to_string()).or_insert(0);
                *entry = (*entry).max(child_order);
            }
        }

        for (id, order) in topo.iter() {
            match highest_child.get(id) {
                Some(&child) => prop_assert_eq!(order, child + 1),
                None => prop_assert_eq!(order, 0),
            }
        }
    }

    #[test]
    fn kinship_is_symmetric(raw in raw_pedigree(), a in any::<Index>(), b in any::<Index>()) {
        let ped = pedigree(&raw);
        let topo = TopologyBuilder::new(&ped).build().unwrap();
        let engine = KinshipEngine::new(&ped, &topo);

        let ids = ped.individuals().unwrap();
        let a = ped.individual(&ids[a.index(ids.len())]);
        let b = ped.individual(&ids[b.index(ids.len())]);

        let ab = engine.compute(&a, &b, true).unwrap();
        let ba = engine.compute(&b, &a, true).unwrap();
        prop_assert_eq!(&ab.coefficient, &ba.coefficient);
        prop_assert_eq!(ab.common_ancestor_ids(), ba.common_ancestor_ids());
        prop_assert!(!ab.coefficient.is_zero() || ab.common_ancestors.is_empty());
    }

    #[test]
    fn kinship_is_non_negative(raw in raw_pedigree(), a in any::<Index>(), b in any::<Index>()) {
        let ped = pedigree(&raw);
        let topo = TopologyBuilder::new(&ped).build().unwrap();
        let engine = KinshipEngine::new(&ped, &topo);

        let ids = ped.individuals().unwrap();
        let a = ped.individual(&ids[a.index(ids.len())]);
        let b = ped.individual(&ids[b.index(ids.len())]);

        let result = engine.compute(&a, &b, false).unwrap();
        prop_assert!(result.coefficient >= num_rational::BigRational::zero());
        if a == b {
            prop_assert!(result.coefficient.is_one());
        }
    }

    #[test]
    fn common_ancestors_account_for_coefficient(
        raw in raw_pedigree(),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        let ped = pedigree(&raw);
        let topo = TopologyBuilder::new(&ped).build().unwrap();
        let engine = KinshipEngine::new(&ped, &topo);

        let ids = ped.individuals().unwrap();
        let a = ped.individual(&ids[a.index(ids.len())]);
        let b = ped.individual(&ids[b.index(ids.len())]);
        prop_assume!(a != b);

        let result = engine.compute(&a, &b, true).unwrap();
        let reported = result
            .common_ancestors
            .iter()
            .fold(Coefficient::zero(), |acc, c| acc + &c.contribution);

        // Unreported mass is inbreeding of ancestors below a reported one.
        prop_assert!(reported <= result.coefficient);
        let mut calc = RelationshipCalculator::new(&ped, &topo);
        let mut inbred = false;
        for id in &ids {
            inbred |= calc.inbreeding(id).unwrap() > 0.0;
        }
        if !inbred {
            prop_assert_eq!(&reported, &result.coefficient);
        }
    }

    #[test]
    fn founders_are_unrelated(raw in raw_pedigree()) {
        let ped = pedigree(&raw);
        let topo = TopologyBuilder::new(&ped).build().unwrap();
        let engine = KinshipEngine::new(&ped, &topo);

        let founders: Vec<String> = ped
            .individuals()
            .unwrap()
            .into_iter()
            .filter(|id| ped.primary_parents(id).unwrap().is_empty())
            .collect();
        for pair in founders.windows(2) {
            let result = engine
                .compute(&ped.individual(&pair[0]), &ped.individual(&pair[1]), true)
                .unwrap();
            prop_assert!(result.coefficient.is_zero());
            prop_assert!(result.common_ancestors.is_empty());
        }
    }
}
