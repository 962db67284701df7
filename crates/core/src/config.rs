//! Client configuration
//!
//! Holds the service URL and account the client talks to. Loading this
//! from files or the environment is left to the application; a TOML
//! document can be parsed directly with [`ClientConfig::from_toml_str`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default `User-Agent` header value
pub fn default_user_agent() -> String {
    format!(
        "manta-rs/{} ({}) rust",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// Settings for a storage client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service base URL, without a trailing slash
    pub url: String,

    /// Account login, used in the signature key id
    pub user: String,

    /// Overrides the default `User-Agent`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Accept invalid TLS certificates
    #[serde(default)]
    pub disable_ssl_certificate_validation: bool,

    /// Log request and response traffic at debug level
    #[serde(default)]
    pub debug: bool,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(s).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// The effective `User-Agent` header value
    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(default_user_agent)
    }

    /// Check the invariants the client relies on
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Config("url cannot be empty".to_string()));
        }
        if self.url.ends_with('/') {
            return Err(Error::Config(format!(
                "url must not have a trailing '/': {}",
                self.url
            )));
        }
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid url {}: {e}", self.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "url must use http or https: {}",
                self.url
            )));
        }
        if self.user.is_empty() {
            return Err(Error::Config("user cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    url: String,
    user: String,
    user_agent: Option<String>,
    disable_ssl_certificate_validation: bool,
    debug: bool,
}

impl ClientConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn disable_ssl_certificate_validation(mut self, disable: bool) -> Self {
        self.disable_ssl_certificate_validation = disable;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let config = ClientConfig {
            url: self.url,
            user: self.user,
            user_agent: self.user_agent,
            disable_ssl_certificate_validation: self.disable_ssl_certificate_validation,
            debug: self.debug,
        };
        config.validate()?;
        Ok(config)
    }
}
