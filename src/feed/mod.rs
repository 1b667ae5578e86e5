pub mod aggregator;
pub mod categorize;
