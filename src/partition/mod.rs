//! Context partitioning: cutting a bounded retrieval window into per-piece
//! LLM sub-requests (§4.3).

pub mod partitioner;

pub use partitioner::partition;
