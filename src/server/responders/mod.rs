pub mod forecast;
pub mod metrics;
pub mod probe;
