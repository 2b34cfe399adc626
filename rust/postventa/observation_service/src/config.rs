use std::path::PathBuf;

use anyhow::Context;

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub attachment_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let listen_addr =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let attachment_dir = std::env::var("ATTACHMENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./attachments"));
        Ok(Config {
            database_url,
            listen_addr,
            attachment_dir,
        })
    }
}
