//! Gateway configuration
//!
//! Read from the environment, with builder overrides for the CLI flags.

use std::fmt;
use std::time::Duration;

use super::GatewayError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1400;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Model endpoint configuration
#[derive(Clone, PartialEq)]
pub struct GatewayConfig {
    /// Bearer token for the endpoint
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Endpoint root, without the `/chat/completions` suffix
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Extra attempts after a retryable failure
    pub retries: u32,
    /// Cached responses kept by [`super::CachedGateway`]; 0 disables caching
    pub cache_capacity: usize,
}

// keeps the key out of logs
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl GatewayConfig {
    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        GatewayConfig {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Create config from environment variables
    ///
    /// Fails with [`GatewayError::MissingCredential`] when `OPENAI_API_KEY`
    /// is unset or blank. Unparseable numeric knobs keep their defaults.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// [`Self::from_env`] over an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(GatewayError::MissingCredential)?;

        let mut config = GatewayConfig::new(api_key);
        if let Some(model) = lookup("CHECKMATE_MODEL").filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(url) = lookup("CHECKMATE_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url.trim());
        }
        if let Some(t) = parse_var(&lookup, "CHECKMATE_TEMPERATURE") {
            config.temperature = t;
        }
        if let Some(n) = parse_var(&lookup, "CHECKMATE_MAX_TOKENS") {
            config.max_output_tokens = n;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CHECKMATE_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var(&lookup, "CHECKMATE_RETRIES") {
            config.retries = n;
        }
        if let Some(n) = parse_var(&lookup, "CHECKMATE_CACHE_CAPACITY") {
            config.cache_capacity = n;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint root; a trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    /// Full chat-completions URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
