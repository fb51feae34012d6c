//! HTTP layer: the [`Transport`] trait, retry policies and, behind the
//! `http` feature, the `reqwest` transport.

#[cfg(feature = "http")]
pub mod client;
pub mod mock;
pub mod retry;
pub mod transport;

#[cfg(feature = "http")]
pub use client::ReqwestTransport;
pub use mock::MockTransport;
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::{HttpResponse, Transport};
