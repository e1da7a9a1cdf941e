//! # statuswatch-http
//!
//! State-source adapters over the device hub's REST API.
//!
//! Every monitored concern is one `GET {endpoint}/about?query={concern}`
//! returning a small JSON object. [`HubClient`] wraps the transport and
//! payload parsing; the types in [`sources`] adapt each typed fetcher to
//! the engine's `StateSource` trait.
//!
//! ## Example
//!
//! ```rust,no_run
//! use statuswatch_http::HubClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HubClient::builder()
//!         .endpoint("http://localhost:8000")
//!         .build();
//!
//!     let connection = client.connection().await?;
//!     println!("connected: {}", connection.connected);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod sources;

pub use client::{HubClient, HubClientBuilder};
pub use error::SourceError;
pub use sources::{ConnectionSource, OsSource, StashSource, SystemInfoSource};
