//! Chain access plumbing: endpoint pools, call deadlines and retry policies.

mod deadline;
mod error;
/// Round-robin endpoint pool
pub mod pool;
/// Transport and call level retry policies
pub mod retries;

pub use deadline::with_deadline;
pub use error::RpcPoolError;
pub use pool::{RpcEndpointPool, Shuffle};
