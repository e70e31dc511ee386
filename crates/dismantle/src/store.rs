//! Read-only access to stored website analyses.
pub mod client;
pub mod object_store;
pub mod s3;

#[cfg(test)]
pub mod mock;
