// Domain layer - Plot models and the aggregation algorithms
pub mod aggregation;
pub mod assembly;
pub mod metric;
pub mod plot;
pub mod ranking;
pub mod resolution;
pub mod table;
pub mod time_window;
