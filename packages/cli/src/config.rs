// ABOUTME: Server configuration loaded from the environment
// ABOUTME: Only the JWT secret is mandatory; everything else has defaults

use std::env;
use std::path::PathBuf;

use anyhow::Context;

pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub token_expire_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(8000);
        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("taskhive.db"));
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let token_expire_minutes = env::var("TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            port,
            cors_origin,
            database_path,
            jwt_secret,
            token_expire_minutes,
        })
    }
}
