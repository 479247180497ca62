// Topology module: minimal generation levels over the ancestor DAG.

pub mod builder;
pub mod cache;
pub mod order;

pub use builder::TopologyBuilder;
pub use cache::TopologyCache;
pub use order::Topology;
