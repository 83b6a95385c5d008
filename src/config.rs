//! Configuration management for the Kayako client.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present.

use crate::error::{KayakoError, Result};
use chrono::format::{Item, StrftimeItems};
use std::env;
use std::fmt;
use std::time::Duration;

/// Default request timeout when `KAYAKO_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default output format for date and time values.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default output format for date-only values.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// How the controller path is passed to `index.php`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlStyle {
    /// `index.php?/Module/Controller/...`
    #[default]
    Standard,
    /// `index.php?e=/Module/Controller/...` for servers that drop bare query paths.
    EParameter,
}

impl UrlStyle {
    /// Prefix placed between `index.php?` and the controller path.
    #[must_use]
    pub fn query_prefix(self) -> &'static str {
        match self {
            UrlStyle::Standard => "",
            UrlStyle::EParameter => "e=",
        }
    }
}

impl std::str::FromStr for UrlStyle {
    type Err = KayakoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "" => Ok(UrlStyle::Standard),
            "e" | "eparameter" | "e-parameter" => Ok(UrlStyle::EParameter),
            other => Err(KayakoError::invalid_config(format!(
                "KAYAKO_URL_STYLE must be 'standard' or 'e', got '{}'",
                other
            ))),
        }
    }
}

/// Values applied to new tickets when the caller does not set them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDefaults {
    /// Ticket status id for new tickets.
    pub status_id: Option<u64>,
    /// Ticket priority id for new tickets.
    pub priority_id: Option<u64>,
    /// Ticket type id for new tickets.
    pub type_id: Option<u64>,
    /// Whether tickets created with a name and email create the user automatically.
    pub auto_create_user: bool,
}

impl Default for TicketDefaults {
    fn default() -> Self {
        Self {
            status_id: None,
            priority_id: None,
            type_id: None,
            auto_create_user: true,
        }
    }
}

/// Configuration for connecting to a Kayako helpdesk.
///
/// The API key and secret key are stored but never logged or exposed in
/// error messages. `Debug` redacts both.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the helpdesk, always ending with `/` (e.g. `https://support.example.com/api/`).
    pub base_url: String,

    /// REST API key.
    pub api_key: String,

    /// REST API secret key used to sign requests.
    pub secret_key: String,

    /// chrono format string for date and time output.
    pub datetime_format: String,

    /// chrono format string for date output.
    pub date_format: String,

    /// How controller paths appear in request URLs.
    pub url_style: UrlStyle,

    /// Request timeout.
    pub timeout: Duration,

    /// Defaults for new tickets.
    pub ticket_defaults: TicketDefaults,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("datetime_format", &self.datetime_format)
            .field("date_format", &self.date_format)
            .field("url_style", &self.url_style)
            .field("timeout", &self.timeout)
            .field("ticket_defaults", &self.ticket_defaults)
            .finish()
    }
}

impl Config {
    /// Creates a configuration with default formats, URL style and timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Helpdesk API URL; a trailing `index.php` and query are stripped
    /// * `api_key` - REST API key
    /// * `secret_key` - REST API secret key
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Config` if the URL is malformed or a key is empty.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Self::validate_base_url(base_url.into())?;
        let api_key = api_key.into();
        let secret_key = secret_key.into();
        if api_key.trim().is_empty() {
            return Err(KayakoError::invalid_config("API key must not be empty"));
        }
        if secret_key.trim().is_empty() {
            return Err(KayakoError::invalid_config("secret key must not be empty"));
        }

        Ok(Config {
            base_url,
            api_key,
            secret_key,
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            url_style: UrlStyle::Standard,
            timeout: DEFAULT_TIMEOUT,
            ticket_defaults: TicketDefaults::default(),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `KAYAKO_BASE_URL`: The helpdesk API URL
    /// - `KAYAKO_API_KEY`: The REST API key
    /// - `KAYAKO_SECRET_KEY`: The REST API secret key
    ///
    /// # Optional Environment Variables
    ///
    /// - `KAYAKO_DATETIME_FORMAT`, `KAYAKO_DATE_FORMAT`: chrono format strings
    /// - `KAYAKO_URL_STYLE`: `standard` or `e`
    /// - `KAYAKO_TIMEOUT_SECS`: request timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Config` if any required variable is missing
    /// or if values fail validation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = Config::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self> {
        let base_url = Self::get_required_env("KAYAKO_BASE_URL")?;
        let api_key = Self::get_required_env("KAYAKO_API_KEY")?;
        let secret_key = Self::get_required_env("KAYAKO_SECRET_KEY")?;

        Self::validate_api_key(&api_key)?;

        let mut config = Config::new(base_url, api_key, secret_key)?;

        if let Some(format) = Self::get_optional_env("KAYAKO_DATETIME_FORMAT") {
            Self::validate_format("KAYAKO_DATETIME_FORMAT", &format)?;
            config.datetime_format = format;
        }
        if let Some(format) = Self::get_optional_env("KAYAKO_DATE_FORMAT") {
            Self::validate_format("KAYAKO_DATE_FORMAT", &format)?;
            config.date_format = format;
        }
        if let Some(style) = Self::get_optional_env("KAYAKO_URL_STYLE") {
            config.url_style = style.parse()?;
        }
        if let Some(secs) = Self::get_optional_env("KAYAKO_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                KayakoError::invalid_config("KAYAKO_TIMEOUT_SECS must be a whole number of seconds")
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets the date and time output format.
    ///
    /// An invalid format makes formatted getters return `None`; see
    /// [`Config::validate_format`].
    #[must_use]
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    /// Sets the date output format.
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Sets the URL style.
    #[must_use]
    pub fn with_url_style(mut self, url_style: UrlStyle) -> Self {
        self.url_style = url_style;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the defaults applied to new tickets.
    #[must_use]
    pub fn with_ticket_defaults(mut self, defaults: TicketDefaults) -> Self {
        self.ticket_defaults = defaults;
        self
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String> {
        env::var(name)
            .map_err(|_| KayakoError::missing_env(name))
            .and_then(|value| {
                if value.trim().is_empty() {
                    Err(KayakoError::missing_env(name))
                } else {
                    Ok(value)
                }
            })
    }

    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Validates and normalizes the base URL.
    ///
    /// The URL can't end with a PHP script and can't carry query parameters;
    /// the result always ends with `/`.
    fn validate_base_url(url: String) -> Result<String> {
        let url = url.trim();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(KayakoError::invalid_config(
                "KAYAKO_BASE_URL must start with http:// or https://",
            ));
        }

        let mut parsed = url::Url::parse(url)
            .map_err(|e| KayakoError::invalid_config(format!("invalid base URL: {}", e)))?;
        parsed.set_query(None);
        parsed.set_fragment(None);

        let path = parsed.path().to_string();
        let path = match path.rsplit_once('/') {
            Some((dir, last)) if last.to_ascii_lowercase().ends_with(".php") => {
                format!("{}/", dir)
            }
            _ => format!("{}/", path.trim_end_matches('/')),
        };
        parsed.set_path(&path);

        Ok(parsed.to_string())
    }

    /// Checks that `format` is a chrono format string.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Config` naming `name` when it has an unknown or
    /// incomplete specifier.
    pub fn validate_format(name: &str, format: &str) -> Result<()> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(KayakoError::invalid_config(format!(
                "{} is not a valid date format: '{}'",
                name, format
            )));
        }
        Ok(())
    }

    /// Validates the API key is not a placeholder value.
    fn validate_api_key(key: &str) -> Result<()> {
        let key_lower = key.to_lowercase();
        let placeholder_patterns = [
            "your_api_key",
            "your_key",
            "placeholder",
            "xxx",
            "changeme",
        ];

        for pattern in placeholder_patterns {
            if key_lower.contains(pattern) {
                return Err(KayakoError::invalid_config(
                    "KAYAKO_API_KEY appears to be a placeholder value",
                ));
            }
        }

        Ok(())
    }
}
