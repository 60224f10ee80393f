//! Implementations of the ports: in-memory store/pool for development and
//! tests, the HTTP publisher, and simple credential providers.

pub mod credentials;
pub mod http_publisher;
pub mod inmem_pool;
pub mod inmem_store;

pub use credentials::{EnvCredentials, StaticCredentials};
pub use http_publisher::HttpPublisher;
pub use inmem_pool::StaticContentPool;
pub use inmem_store::InMemoryTaskStore;
