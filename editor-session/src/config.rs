use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the file server
    pub backend_url: String,
    /// Autosave period; `None` disables the timer
    pub autosave_interval: Option<Duration>,
    /// Upper bound on each load/save request
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8080".to_string(),
            autosave_interval: Some(Duration::from_secs(10)),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let autosave_secs: u64 = env_parse("NORA_AUTOSAVE_SECS", 10)?;
        let timeout_secs: u64 = env_parse("NORA_REQUEST_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            anyhow::bail!("NORA_REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            backend_url: env_str("NORA_BACKEND_URL", "http://127.0.0.1:8080"),
            // 0 turns autosave off.
            autosave_interval: (autosave_secs > 0).then(|| Duration::from_secs(autosave_secs)),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_editor() {
        let config = SessionConfig::default();
        assert_eq!(config.backend_url, "http://127.0.0.1:8080");
        assert_eq!(config.autosave_interval, Some(Duration::from_secs(10)));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_env_parse_reports_bad_value() {
        std::env::set_var("EDITOR_SESSION_TEST_BAD_NUMBER", "ten");
        let err = env_parse::<u64>("EDITOR_SESSION_TEST_BAD_NUMBER", 10).unwrap_err();
        assert!(err.to_string().contains("EDITOR_SESSION_TEST_BAD_NUMBER=ten"));

        assert_eq!(env_parse::<u64>("EDITOR_SESSION_TEST_UNSET", 7).unwrap(), 7);
    }
}
