pub mod config;
pub mod fetch_error;
pub mod fetcher;
pub mod notifier;
pub mod report;
pub mod series;
