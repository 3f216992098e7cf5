pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod output;
pub mod sampler;
pub mod store;
