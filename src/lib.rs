pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod output;
pub mod store;
pub mod validate;
