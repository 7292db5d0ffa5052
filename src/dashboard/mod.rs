//! Role dashboards
//!
//! Static per-role descriptor tables and the aggregator that turns the home
//! summary payload into display-ready metrics.

mod aggregator;
mod descriptors;

pub use aggregator::{
    summarize, Dashboard, DashboardAggregator, Metric, NormalizedMetrics, SchoolCard, SchoolJoin,
};
pub use descriptors::{descriptors, MetricDescriptor};
