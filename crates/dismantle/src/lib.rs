pub mod agent;
pub mod analysis;
pub mod aws;
pub mod config;
pub mod errors;
pub mod factory;
pub mod models;
pub mod presenter;
pub mod store;
pub mod url_normalizer;
