use serde::Deserialize;
use std::env;
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::error;

/// Runtime environment, parsed from `JOBTRACK_ENV`. Anything
/// unrecognized falls back to `Development`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
            Environment::Test => write!(f, "test"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub environment: Environment,
    pub rest_api: RestApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestApiConfig {
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"environment\":\"{}\",\"rest_api\":{}}}",
            self.environment, self.rest_api
        )
    }
}

impl fmt::Display for RestApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"base_url\":\"{}\",\"timeout\":{}}}",
            self.base_url, self.timeout
        )
    }
}

pub fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

/// Base-URL priority: explicit `JOBTRACK_API_URL` override, then the
/// same-origin `/api` prefix in production, else the local development
/// backend.
fn resolve_base_url(environment: Environment) -> String {
    if let Ok(url) = env::var("JOBTRACK_API_URL") {
        if !url.is_empty() {
            return url;
        }
    }
    match environment {
        Environment::Production => String::from("/api"),
        _ => String::from("http://localhost:8000/api"),
    }
}

fn default_timeout(environment: Environment) -> u64 {
    match environment {
        Environment::Development => 30,
        Environment::Production => 60,
        Environment::Test => 5,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        let environment = get_env_or_default("JOBTRACK_ENV", Environment::Development);
        Config {
            environment,
            rest_api: RestApiConfig {
                base_url: resolve_base_url(environment),
                timeout: get_env_or_default("JOBTRACK_API_TIMEOUT", default_timeout(environment)),
            },
        }
    }
}


#[cfg(test)]
mod tests_display {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn test_config_display() {
        let config = Config {
            environment: Environment::Production,
            rest_api: RestApiConfig {
                base_url: "https://api.example.com".to_string(),
                timeout: 60,
            },
        };

        let expected_json = json!({
            "environment": "production",
            "rest_api": {
                "base_url": "https://api.example.com",
                "timeout": 60
            }
        });

        assert_json_eq!(
            serde_json::from_str::<serde_json::Value>(&config.to_string()).unwrap(),
            expected_json
        );
    }
}
