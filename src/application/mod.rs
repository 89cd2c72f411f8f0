// Application layer - Use cases and the collaborator traits they depend on
pub mod app_metric_service;
pub mod fan_in;
pub mod field_metric_service;
pub mod metric_repository;
pub mod plot_drawer;

#[cfg(test)]
pub mod fake_repository;
