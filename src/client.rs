//! The shared client handle.
//!
//! Every network operation takes a `&Client`. The handle owns the
//! configuration, the transport and the client-wide ticket statistics cache,
//! and is cheap to clone.

use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::{KayakoError, Result};
use crate::models::TicketStatistics;
use crate::rest_client::RestClient;
use crate::transport::Transport;

struct ClientInner {
    config: Config,
    transport: Arc<dyn Transport>,
    statistics: Mutex<Option<Arc<TicketStatistics>>>,
}

/// Handle used by every entity operation.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client that talks to the server over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let transport = RestClient::new(config.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over any transport.
    #[must_use]
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                statistics: Mutex::new(None),
            }),
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    /// Cached ticket statistics, if loaded.
    #[must_use]
    pub fn cached_statistics(&self) -> Option<Arc<TicketStatistics>> {
        self.statistics_slot().clone()
    }

    /// Stores ticket statistics for later calls.
    pub fn store_statistics(&self, statistics: Arc<TicketStatistics>) {
        *self.statistics_slot() = Some(statistics);
    }

    /// Drops cached ticket statistics.
    pub fn clear_statistics(&self) {
        *self.statistics_slot() = None;
    }

    fn statistics_slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<TicketStatistics>>> {
        self.inner
            .statistics
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<Config>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets a transport; defaults to [`RestClient`].
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Uninitialized` without a configuration.
    pub fn build(self) -> Result<Client> {
        let config = self.config.ok_or(KayakoError::Uninitialized("config"))?;
        match self.transport {
            Some(transport) => Ok(Client::with_transport(config, transport)),
            None => Client::new(config),
        }
    }
}
