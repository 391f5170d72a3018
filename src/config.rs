use crate::error::{DalleError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const LIBRARY_VERSION: &str = "1.0.0";
pub const DEFAULT_BASE_URL: &str = "https://labs.openai.com/api/labs";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub fn default_user_agent() -> String {
    format!("dalle/{}", LIBRARY_VERSION)
}

#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

// The key stays out of debug output.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &format!("<{} chars>", self.api_key.len()))
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        ClientConfig {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `DALLE_API_KEY` plus the optional `DALLE_BASE_URL`,
    /// `DALLE_USER_AGENT` and `DALLE_TIMEOUT_SECS` overrides.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("DALLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DalleError::Config("DALLE_API_KEY required".into()))?;

        let mut config = ClientConfig::new(api_key);

        if let Ok(base_url) = env::var("DALLE_BASE_URL") {
            if !base_url.is_empty() {
                config = config.with_base_url(base_url);
            }
        }
        if let Ok(user_agent) = env::var("DALLE_USER_AGENT") {
            if !user_agent.is_empty() {
                config = config.with_user_agent(user_agent);
            }
        }
        if let Ok(secs) = env::var("DALLE_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                DalleError::Config(format!("invalid `DALLE_TIMEOUT_SECS` value: {}", e))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(DalleError::Config("API key must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let mut config = PollConfig::default();

        if let Ok(secs) = env::var("POLL_INTERVAL_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                DalleError::Config(format!("invalid `POLL_INTERVAL_SECS` value: {}", e))
            })?;
            config.interval = Duration::from_secs(secs);
        }
        if let Ok(attempts) = env::var("POLL_MAX_ATTEMPTS") {
            let attempts: u32 = attempts.parse().map_err(|e| {
                DalleError::Config(format!("invalid `POLL_MAX_ATTEMPTS` value: {}", e))
            })?;
            config.max_attempts = Some(attempts);
        }

        Ok(config)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub concurrency: usize,
    pub images_path: PathBuf,
    pub buffer_size: usize,
    pub extension: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            concurrency: 5,
            images_path: PathBuf::from("images"),
            buffer_size: 2048,
            extension: "png".to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `CONCURRENCY` and `IMAGES_PATH`. Empty values fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = DownloadConfig::default();

        if let Ok(concurrency) = env::var("CONCURRENCY") {
            if !concurrency.is_empty() {
                let concurrency: usize = concurrency.parse().map_err(|e| {
                    DalleError::Config(format!("invalid `CONCURRENCY` value: {}", e))
                })?;
                config = config.with_concurrency(concurrency);
            }
        }
        if let Ok(path) = env::var("IMAGES_PATH") {
            if !path.is_empty() {
                config = config.with_images_path(path);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_images_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.images_path = path.into();
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(DalleError::Config("concurrency must be at least 1".into()));
        }
        if self.buffer_size == 0 {
            return Err(DalleError::Config("buffer size must be at least 1".into()));
        }
        Ok(())
    }

    /// Destination file for one generation: `<images_path>/<id>.<extension>`.
    pub fn file_path(&self, generation_id: &str) -> PathBuf {
        self.images_path
            .join(format!("{}.{}", generation_id, self.extension))
    }
}
