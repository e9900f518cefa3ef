pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
pub use tokentrack_api_types;
