pub mod error;
pub mod genetics;
pub mod kinship;
pub mod topology;
pub mod types;

pub use error::{KinshipError, Result};
pub use genetics::{GraphProvider, IndividualRef, Pedigree};
pub use kinship::{KinshipEngine, KinshipResult};
pub use topology::{Topology, TopologyBuilder, TopologyCache};
pub use types::Coefficient;
