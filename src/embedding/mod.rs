//! Remote embedding calls: endpoint boundary, retrying client, test mock.

pub mod client;
pub mod endpoint;
pub mod mock;

pub use client::EmbeddingClient;
pub use endpoint::{HttpEndpoint, InferenceEndpoint};
pub use mock::MockEndpoint;
