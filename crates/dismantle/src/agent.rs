pub mod bedrock;
pub mod client;
pub mod envelope;
pub mod runtime;

#[cfg(test)]
pub mod mock;
