//! Indexing pipelines: event listener, full-scan recorder, valuation engine, presale pool
//! valuation and the daily checkpoint reset.

pub mod context;
pub mod driver;
pub mod listener;
pub mod pool_tvl;
pub mod pricing;
pub mod reader;
pub mod recorder;
pub mod reset;
pub mod task;
pub mod valuation;

#[cfg(test)]
mod testing;

pub use context::{ChainContext, DecimalsCache};
pub use driver::Driver;
pub use reader::{ChainReader, RpcChainReader};
pub use task::Pipeline;
