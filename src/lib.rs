//! # Nebula Client
//!
//! Client library for the Nebula query service. It turns a loosely-typed
//! query description into the service's strict request, sends it, and
//! reshapes the reply into a flat summary.
//!
//! ## Modules
//!
//! - [`query`]: Query descriptions, time expressions and translation
//! - [`wire`]: Request and reply messages exchanged with the service
//! - [`client`]: The client surface and the transport channel
//! - [`config`]: File and environment configuration
//! - [`log`]: Injected logger and `tracing` setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nebula_client::client::NebulaClient;
//! use nebula_client::config::Config;
//! use nebula_client::query::{FilterNode, QueryDescription};
//! use nebula_client::wire::{Operation, OrderType, Rollup};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::resolve(None)?;
//!     let client = NebulaClient::connect(&config.service)?;
//!
//!     for table in client.list_tables("").await? {
//!         println!("{}", table);
//!     }
//!
//!     // Average age per country over the last three days
//!     let query = QueryDescription::builder("nebula.test")
//!         .start("-3d")
//!         .end("now")
//!         .key("country")
//!         .metric("age", Rollup::Avg)
//!         .filter(FilterNode::and(vec![FilterNode::leaf(
//!             "gender",
//!             Operation::Eq,
//!             vec!["F".into()],
//!         )]))
//!         .sort(OrderType::Desc)
//!         .limit(10)
//!         .build();
//!
//!     let response = client.query("", &query).await?;
//!     println!("{}", String::from_utf8_lossy(&response.data));
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod log;
pub mod query;
pub mod wire;

pub use client::{ClientError, ClientResult, NebulaClient, SimplifiedResponse, TableState};
pub use query::{translate, QueryDescription, QueryError};
