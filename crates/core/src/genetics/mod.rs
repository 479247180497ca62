// Genetics module: pedigree data access and relationship calculations.

pub mod consanguinity;
pub mod pedigree;
pub mod provider;
pub mod relationship;

pub use consanguinity::{Consanguinity, FixedConsanguinity, NoConsanguinity};
pub use pedigree::Pedigree;
pub use provider::{GraphProvider, IndividualRef, ParentPair};
pub use relationship::RelationshipCalculator;
