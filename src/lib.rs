//! # Kayako client
//!
//! An object mapper for the Kayako helpdesk REST API.
//!
//! Every remote resource (tickets, posts, notes, staff, users, departments
//! and the rest) is a plain record wrapped in an [`Entity`], which tracks
//! whether the record is new, persisted or deleted and drives the REST
//! round-trips: fetch, list, create, update, delete and refresh.
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error types with security-conscious message sanitization
//! - [`transport`] - The [`Transport`] seam and request payloads
//! - [`rest_client`] - Signed HTTP transport with retry for reads
//! - [`xml`] - XML response decoding into the wire tree
//! - [`codec`] - Conversions between wire values and typed fields
//! - [`entity`] - The [`Resource`] contract, [`Entity`] lifecycle and [`Relation`]
//! - [`models`] - Kayako resources
//!
//! ## Configuration
//!
//! [`Config::from_env`] reads:
//!
//! - `KAYAKO_BASE_URL`: API URL of the helpdesk
//! - `KAYAKO_API_KEY`: REST API key
//! - `KAYAKO_SECRET_KEY`: REST API secret used to sign requests
//!
//! Optional:
//! - `KAYAKO_DATETIME_FORMAT`, `KAYAKO_DATE_FORMAT`, `KAYAKO_URL_STYLE`, `KAYAKO_TIMEOUT_SECS`
//! - `RUST_LOG`: Log level (e.g., `kayako_client=debug`)
//!
//! ## Security Considerations
//!
//! The API and secret keys are stored only in memory and are never logged.
//! Both are sanitized from error messages.
//!
//! ## Example
//!
//! ```ignore
//! use kayako_client::models::{Department, Ticket, TicketCreator};
//! use kayako_client::{Client, Config};
//!
//! async fn example() -> kayako_client::Result<()> {
//!     let client = Client::new(Config::from_env()?)?;
//!
//!     let department = Department::get(&client, 1).await?;
//!     let mut ticket = Ticket::create_new(
//!         &client,
//!         &department,
//!         TicketCreator::Auto {
//!             full_name: "Ann Smith".into(),
//!             email: "ann@example.com".into(),
//!         },
//!         "The printer is on fire.",
//!         "Printer",
//!     );
//!     ticket.create(&client).await?;
//!
//!     for post in ticket.posts(&client, false).await?.iter() {
//!         println!("{}", post.contents().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod codec;
pub mod config;
pub mod entity;
pub mod error;
pub mod identity;
pub mod models;
pub mod rest_client;
pub mod result_set;
pub mod transport;
pub mod xml;

pub use client::{Client, ClientBuilder};
pub use codec::ConstantSet;
pub use config::{Config, TicketDefaults, UrlStyle};
pub use entity::{Entity, Relation, Resource, State};
pub use error::{KayakoError, Operation, Result};
pub use identity::Identity;
pub use rest_client::RestClient;
pub use result_set::{IdSource, ResultSet};
pub use transport::{FilePart, RequestData, Transport, WireData};
