//! HTTP client side: cache, retry and envelope validation for every call.

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod session;

pub use cache::{Lookup, RequestCache};
pub use config::{CachePolicy, ClientConfig, ConfigError, RetryPolicy, StalePolicy};
pub use entity::EntityClient;
pub use error::ClientError;
pub use pipeline::{Request, RequestOptions, RequestPipeline, Served, Source};
pub use retry::retry;
pub use session::Session;
