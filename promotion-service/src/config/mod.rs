use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;

/// Process configuration, gathered once at startup. Nothing in the request
/// path reads the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub paystack: PaystackConfig,
    pub security: SecurityConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Clone, Debug)]
pub struct PaystackConfig {
    pub secret_key: Secret<String>,
    pub api_base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("PROMOTION_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PROMOTION_SERVICE_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("PROMOTION_SERVICE_PORT must be a port number")?;

        let db_url =
            env::var("PROMOTION_DATABASE_URL").context("PROMOTION_DATABASE_URL must be set")?;
        let db_name =
            env::var("PROMOTION_DATABASE_NAME").unwrap_or_else(|_| "promotion_db".to_string());

        let paystack_secret_key =
            env::var("PAYSTACK_SECRET_KEY").context("PAYSTACK_SECRET_KEY must be set")?;
        let paystack_api_base_url = env::var("PAYSTACK_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.paystack.co".to_string());
        let paystack_timeout_seconds = env::var("PAYSTACK_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("PAYSTACK_TIMEOUT_SECONDS must be a number of seconds")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            paystack: PaystackConfig {
                secret_key: Secret::new(paystack_secret_key),
                api_base_url: paystack_api_base_url,
                timeout_seconds: paystack_timeout_seconds,
            },
            security: SecurityConfig { allowed_origins },
            service_name: "promotion-service".to_string(),
        })
    }
}
