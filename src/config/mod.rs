/// Application configuration module
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub model: ModelEndpoint,
    pub predictor_url: String,
    pub predictor_timeout: Duration,
    pub synthetic_seed: Option<u64>,
    pub metrics: MetricsConfig,
}

/// Remote recommendation model settings
#[derive(Clone, Debug)]
pub struct ModelEndpoint {
    /// `None` leaves the remote provider unconfigured; synthetic output answers every run.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct MetricsConfig {
    pub tick_seconds: u64,
    pub live: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let model = ModelEndpoint {
            url: env_opt("AI_MODEL_URL"),
            api_key: env_opt("AI_MODEL_API_KEY"),
            timeout: Duration::from_secs(env_u64("AI_MODEL_TIMEOUT_SECONDS", 15)),
        };

        let predictor_url = env::var("PREDICTOR_URL")
            .unwrap_or_else(|_| "http://localhost:5000/predict".to_string());
        let predictor_timeout = Duration::from_secs(env_u64("PREDICTOR_TIMEOUT_SECONDS", 30));

        let synthetic_seed = match env_opt("SYNTHETIC_SEED") {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|e| anyhow::anyhow!("SYNTHETIC_SEED must be a u64: {e}"))?,
            ),
            None => None,
        };

        let metrics = MetricsConfig {
            tick_seconds: env_u64("METRICS_TICK_SECONDS", 10).max(1),
            live: env_bool("LIVE_METRICS", false),
        };

        Ok(Self {
            bind_addr,
            model,
            predictor_url,
            predictor_timeout,
            synthetic_seed,
            metrics,
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key).ok().as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        Some("0") | Some("false") | Some("no") | Some("off") => false,
        _ => default,
    }
}
