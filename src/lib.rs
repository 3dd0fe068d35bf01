//! Sanity-client: a client for a versioned document-store HTTP API.
//!
//! A library for running GROQ queries, sending mutations, fetching
//! documents by ID, and verifying signed webhooks.
//!
//! ```no_run
//! use sanity_client::{Client, ClientConfig};
//!
//! # async fn example() -> Result<(), sanity_client::Error> {
//! let client = Client::new(ClientConfig::new("abc123", "production").with_token("secret"))?;
//!
//! client
//!     .mutate()
//!     .create_if_not_exists(&serde_json::json!({"_id": "movie-1", "_type": "movie"}))
//!     .patch("movie-1")
//!     .set("title", "Alien")
//!     .end()
//!     .execute()
//!     .await?;
//!
//! let docs = client.get_documents(["movie-1"]).execute().await?;
//! assert_eq!(docs.documents.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod documents;
pub mod error;
pub mod mutation;
pub mod query;
pub mod time;
pub mod transport;
pub mod webhook;

#[cfg(test)]
mod test_fixtures;

pub use client::{Client, ClientConfig};
pub use error::{Error, RequestError};
