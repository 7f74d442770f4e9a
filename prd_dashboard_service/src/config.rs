use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use chrono::NaiveDate;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Fixed parameters of every generation call plus the retry budget.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_attempts: u32,
    /// Delay before retry `n` (0-based) is `backoff_unit * 2^n`.
    pub backoff_unit: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub api_base: String,
    pub api_key_var: String,
    pub request_timeout: Duration,
    pub generator: GeneratorSettings,
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub dashboard_start: NaiveDate,
    pub dashboard_end: NaiveDate,
    pub dashboard_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8501),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_var: API_KEY_VAR.to_string(),
            request_timeout: Duration::from_secs(120),
            generator: GeneratorSettings::default(),
            output_dir: PathBuf::from("generated_prds"),
            max_upload_bytes: 10 * 1024 * 1024,
            dashboard_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            dashboard_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            dashboard_seed: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let listen_addr = env::var("SERVER_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.listen_addr);

        let api_base = env::var("OPENAI_API_BASE").unwrap_or(defaults.api_base);

        let model = env::var("OPENAI_MODEL").unwrap_or(defaults.generator.model);
        let temperature = parsed("TEMPERATURE").unwrap_or(defaults.generator.temperature);
        let max_tokens = parsed("MAX_OUTPUT_TOKENS").unwrap_or(defaults.generator.max_tokens);
        let backoff_unit = parsed("RETRY_BACKOFF_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.generator.backoff_unit);

        let request_timeout = parsed("REQUEST_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let output_dir = env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let max_upload_bytes = parsed("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes);
        let dashboard_start = parsed("DASHBOARD_START").unwrap_or(defaults.dashboard_start);
        let dashboard_end = parsed("DASHBOARD_END").unwrap_or(defaults.dashboard_end);
        let dashboard_seed = parsed("DASHBOARD_SEED");

        if !(0.0..=2.0).contains(&temperature) {
            anyhow::bail!("TEMPERATURE must be between 0.0 and 2.0, got {temperature}");
        }
        if dashboard_start > dashboard_end {
            anyhow::bail!(
                "DASHBOARD_START {dashboard_start} is after DASHBOARD_END {dashboard_end}"
            );
        }

        Ok(Self {
            listen_addr,
            api_base,
            api_key_var: defaults.api_key_var,
            request_timeout,
            generator: GeneratorSettings {
                model,
                temperature,
                max_tokens,
                max_attempts: defaults.generator.max_attempts,
                backoff_unit,
            },
            output_dir,
            max_upload_bytes,
            dashboard_start,
            dashboard_end,
            dashboard_seed,
        })
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_local_development() {
        let config = AppConfig::default();
        assert_eq!(config.listen_addr.port(), 8501);
        assert_eq!(config.generator.model, "gpt-4");
        assert_eq!(config.generator.max_attempts, 3);
        assert_eq!(config.generator.backoff_unit, Duration::from_secs(1));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.api_key_var, API_KEY_VAR);
        assert_eq!(config.dashboard_start.to_string(), "2024-01-01");
        assert_eq!(config.dashboard_end.to_string(), "2024-12-31");
    }
}
