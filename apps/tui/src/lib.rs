// Export our modules for use in the binary and tests
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod event;
pub mod fetcher;
pub mod geometry;
pub mod logging;
pub mod messaging;
pub mod terminal;
pub mod ui;

pub use domain::{ScanPoint, ScanSnapshot, UnitScale};
pub use error::FetchError;
