//! Application configuration loaded from environment variables.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Azure OpenAI ===
    /// API key for the Azure OpenAI resource.
    #[serde(default)]
    pub azure_api_key: Option<String>,

    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    #[serde(default)]
    pub azure_api_base: Option<String>,

    /// REST API version sent as the `api-version` query parameter.
    #[serde(default = "default_api_version")]
    pub azure_api_version: String,

    /// Chat completion deployment name.
    #[serde(default)]
    pub azure_completion_deployment: Option<String>,

    /// Per-request timeout for LLM calls.
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    /// Sampling temperature for every prompt.
    #[serde(default = "default_temperature")]
    pub llm_temperature: f32,

    // === Crawler ===
    /// Timeout for fetching a product page.
    #[serde(default = "default_crawl_timeout")]
    pub crawl_timeout_secs: u64,

    /// User agent presented to marketplaces.
    #[serde(default = "default_user_agent")]
    pub crawl_user_agent: String,

    /// How long finished crawl jobs stay queryable.
    #[serde(default = "default_crawl_job_ttl")]
    pub crawl_job_ttl_secs: u64,

    // === Workflow ===
    /// Default minimum match score (percent) used when a request omits one.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_version() -> String {
    "2024-02-01".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.2
}

fn default_crawl_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Safari/537.36"
        .to_string()
}

fn default_crawl_job_ttl() -> u64 {
    3600
}

fn default_match_threshold() -> f64 {
    80.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rust_log: default_log_level(),
            azure_api_key: None,
            azure_api_base: None,
            azure_api_version: default_api_version(),
            azure_completion_deployment: None,
            llm_timeout_secs: default_llm_timeout(),
            llm_temperature: default_temperature(),
            crawl_timeout_secs: default_crawl_timeout(),
            crawl_user_agent: default_user_agent(),
            crawl_job_ttl_secs: default_crawl_job_ttl(),
            match_threshold: default_match_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if !(0.0..=100.0).contains(&self.match_threshold) {
            return Err("MATCH_THRESHOLD must be between 0 and 100".to_string());
        }

        let azure = [
            self.azure_api_key.is_some(),
            self.azure_api_base.is_some(),
            self.azure_completion_deployment.is_some(),
        ];
        if azure.iter().any(|set| *set) && !azure.iter().all(|set| *set) {
            return Err(
                "AZURE_API_KEY, AZURE_API_BASE and AZURE_COMPLETION_DEPLOYMENT must be set together"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Whether an LLM backend is fully configured.
    pub fn llm_configured(&self) -> bool {
        self.azure_api_key.is_some()
            && self.azure_api_base.is_some()
            && self.azure_completion_deployment.is_some()
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
