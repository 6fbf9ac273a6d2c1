pub mod aggregator;
pub mod engine;
pub mod error;
pub mod id;
pub mod invoice;
pub mod overlap;
pub mod report;
pub mod resolved;
pub mod resolver;
