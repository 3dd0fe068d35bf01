//! HTTP transport layer.
//!
//! This module provides types and traits for:
//! - Building API requests ([`RequestBuilder`])
//! - Plain HTTP requests and responses ([`HttpRequest`], [`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Backoff configuration and retriability rules ([`BackoffPolicy`])

mod client;
mod error;
mod message;
mod request;
mod retry;


pub use client::ReqwestClient;
pub use error::HttpError;
pub use message::{HttpClient, HttpRequest, HttpResponse};
pub use request::RequestBuilder;
pub use retry::{Backoff, BackoffPolicy, is_method_retriable, is_status_retriable};
