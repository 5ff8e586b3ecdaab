// src/config.rs

use std::env;

use dotenvy::dotenv;

/// Default number of questions when a request does not name a count.
pub const DEFAULT_QUESTION_COUNT: i64 = 20;

/// Inclusive bounds a requested question count is clamped into.
pub const MIN_QUESTION_COUNT: i64 = 1;
pub const MAX_QUESTION_COUNT: i64 = 200;

/// Default and maximum page size for a student's result history.
pub const DEFAULT_RESULTS_LIMIT: i64 = 50;
pub const MAX_RESULTS_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub server_port: u16,
    /// How long an unsubmitted attempt stays valid, in seconds.
    pub attempt_ttl_seconds: u64,
    /// Drop the attempt once a submission has been graded.
    pub attempt_single_use: bool,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let server_port = parse_var("SERVER_PORT", 3000);

        let attempt_ttl_seconds = parse_var("ATTEMPT_TTL_SECONDS", 7200);

        let attempt_single_use = env::var("ATTEMPT_SINGLE_USE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| split_origins(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            database_url,
            jwt_secret,
            rust_log,
            server_port,
            attempt_ttl_seconds,
            attempt_single_use,
            cors_origins,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" YES "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_split_origins_skips_blanks() {
        let origins = split_origins("http://a.test, ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }
}
