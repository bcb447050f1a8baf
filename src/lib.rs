pub mod aggregator;
pub mod config;
pub mod derive;
pub mod error;
pub mod geometry;
pub mod indicators;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod route;
pub mod summary;
