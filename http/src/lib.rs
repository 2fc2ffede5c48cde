//! # Keyslot HTTP
//!
//! [`HttpTransport`]: the production transport client, built on `reqwest`.
//!
//! - Relative URLs containing `api` resolve against the API base URL, all
//!   others against the site base URL; absolute URLs pass through
//! - `Content-Type: application/json` plus any configured default headers
//! - Non-2xx responses become [`TransportError::Rejected`] with
//!   `{"status": <code>, "data": <body>}` as the detail
//!
//! ## Example
//!
//! ```no_run
//! use keyslot_core::transport::{RequestOptions, Transport};
//! use keyslot_http::{HttpTransport, HttpTransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(HttpTransportConfig::from_env()?)?;
//! let agents = transport.get("/api/agents", RequestOptions::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`TransportError::Rejected`]: keyslot_core::transport::TransportError::Rejected

mod client;
mod config;

pub use client::{resolve_url, HttpTransport};
pub use config::{HttpConfigError, HttpTransportConfig};
