// Kinship module: level-synchronized dual-branch aggregation over a topology.

pub mod engine;
pub mod info;
pub mod path;
pub mod result;

pub use engine::KinshipEngine;
pub use info::{KinshipInfo, KinshipInfoBranch};
pub use path::{LineagePath, Multiplicity};
pub use result::{CommonAncestor, KinshipResult};
