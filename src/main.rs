//! kayako-check - checks a Kayako helpdesk connection
//!
//! Signs a request with the configured keys, then prints the staff groups
//! and a ticket count summary as JSON on stdout.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `KAYAKO_BASE_URL`: API URL of the helpdesk
//! - `KAYAKO_API_KEY`: REST API key
//! - `KAYAKO_SECRET_KEY`: REST API secret key
//!
//! # Usage
//!
//! ```bash
//! KAYAKO_BASE_URL=https://support.example.com/api/ KAYAKO_API_KEY=xxx KAYAKO_SECRET_KEY=yyy ./kayako-check
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use kayako_client::models::{StaffGroup, Ticket};
use kayako_client::{Client, Config, RestClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the JSON report
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kayako_client=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting kayako-check v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!("Configuration loaded, base_url: {}", config.base_url);

    let rest = RestClient::new(config.clone()).context("Failed to create REST client")?;
    rest.test_connection()
        .await
        .context("Connection test failed")?;

    let client = Client::with_transport(config, Arc::new(rest));

    let groups = StaffGroup::get_all(&client)
        .await
        .context("Failed to list staff groups")?;
    let groups: Vec<_> = groups
        .iter()
        .map(|g| {
            json!({
                "id": g.id(),
                "title": g.title(),
                "is_admin": g.is_admin(),
            })
        })
        .collect();

    let stats = Ticket::statistics(&client, false)
        .await
        .context("Failed to load ticket statistics")?;

    let report = json!({
        "staff_groups": groups,
        "total_tickets": stats.total_items(),
        "statistics": &*stats,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );

    Ok(())
}
