pub mod client;

pub use client::{ExecutionHandle, ProviderClient, RawResult};
