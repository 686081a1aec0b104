//! Application configuration from environment variables

use anyhow::Result;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Room directory (C7) backing. `Some` selects the `sqlx::PgPool`
    /// implementation; `None` runs the in-memory fallback, so the crate is
    /// runnable without a Postgres instance.
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()?,
            database_url: std::env::var("DATABASE_URL").ok(),
        })
    }
}
