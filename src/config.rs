use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::corpus::builder::DEFAULT_MAX_CHARS;
use crate::inference::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::trends::PipelineSettings;
use crate::source::reddit::{DEFAULT_REDDIT_URL, DEFAULT_USER_AGENT};

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Clone)]
pub struct Config {
    /// Google Generative Language API key (GEMINI_API_KEY)
    pub gemini_api_key: String,
    /// Model used for the analysis (defaults to gemini-2.5-flash)
    pub model: String,
    /// Generative Language API endpoint, overridable for proxies
    pub gemini_base_url: String,
    /// Listing endpoint the posts are fetched from
    pub reddit_url: String,
    /// Non-browser client identification sent to Reddit
    pub user_agent: String,
    /// Corpus character budget
    pub max_chars: usize,
    /// Timeout for the upstream fetch. Zero means no timeout.
    pub fetch_timeout: Duration,
    /// Timeout for each inference attempt. Zero means no timeout.
    pub inference_timeout: Duration,
    /// Total inference attempts (1 = no retry)
    pub inference_attempts: u32,
    /// How long the web server reuses a report. Zero disables the cache.
    pub cache_ttl: Duration,
    /// Address the web server binds to
    pub bind: String,
    /// Port the web server listens on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything except the API key has a default. Malformed numeric
    /// values are an error rather than silently falling back.
    pub fn load() -> Result<Self> {
        Ok(Self {
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: env::var("TREND_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            reddit_url: env::var("REDDIT_URL").unwrap_or_else(|_| DEFAULT_REDDIT_URL.to_string()),
            user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            max_chars: parse_var("TREND_MAX_CHARS", DEFAULT_MAX_CHARS)?,
            fetch_timeout: Duration::from_secs(parse_var("TREND_FETCH_TIMEOUT_SECS", 15)?),
            inference_timeout: Duration::from_secs(parse_var("TREND_INFERENCE_TIMEOUT_SECS", 60)?),
            inference_attempts: parse_var("TREND_INFERENCE_ATTEMPTS", 2)?,
            cache_ttl: Duration::from_secs(parse_var("TREND_CACHE_TTL_SECS", 300)?),
            bind: env::var("TREND_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("TREND_PORT", 3000)?,
        })
    }

    /// Check that the Gemini API key is configured.
    /// Call this before any operation that runs inference.
    pub fn require_gemini(&self) -> Result<()> {
        if self.gemini_api_key.is_empty() {
            anyhow::bail!(
                "GEMINI_API_KEY not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Pipeline tunables derived from this configuration.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_chars: self.max_chars,
            fetch_timeout: non_zero(self.fetch_timeout),
            inference_timeout: non_zero(self.inference_timeout),
            retry: RetryPolicy::new(self.inference_attempts),
        }
    }
}

fn non_zero(limit: Duration) -> Option<Duration> {
    (!limit.is_zero()).then_some(limit)
}

/// Read an env var and parse it, using `default` when the var is unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            gemini_api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            reddit_url: DEFAULT_REDDIT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_chars: 1234,
            fetch_timeout: Duration::from_secs(3),
            inference_timeout: Duration::from_secs(9),
            inference_attempts: 4,
            cache_ttl: Duration::from_secs(300),
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }

    #[test]
    fn missing_api_key_is_reported() {
        let err = config().require_gemini().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn present_api_key_passes() {
        let mut cfg = config();
        cfg.gemini_api_key = "key".to_string();
        assert!(cfg.require_gemini().is_ok());
    }

    #[test]
    fn pipeline_settings_mirror_config() {
        let settings = config().pipeline_settings();
        assert_eq!(settings.max_chars, 1234);
        assert_eq!(settings.fetch_timeout, Some(Duration::from_secs(3)));
        assert_eq!(settings.inference_timeout, Some(Duration::from_secs(9)));
        assert_eq!(settings.retry.max_attempts(), 4);
    }

    #[test]
    fn zero_timeouts_mean_no_limit() {
        let mut cfg = config();
        cfg.fetch_timeout = Duration::ZERO;
        cfg.inference_timeout = Duration::from_secs(0);
        let settings = cfg.pipeline_settings();
        assert_eq!(settings.fetch_timeout, None);
        assert_eq!(settings.inference_timeout, None);
    }

    #[test]
    fn unset_var_uses_default() {
        let value: u64 = parse_var("TREND_TEST_UNSET_VARIABLE_XYZ", 42).unwrap();
        assert_eq!(value, 42);
    }
}
