use crate::error::{Error, Result};
use crate::index::embedding::DEFAULT_MODEL_ID;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub dir: PathBuf,
    pub chunk_size: usize,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub external_url: Option<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub users_csv_path: PathBuf,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    env_or(key, default)
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {key} value")))
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            corpus: CorpusConfig {
                path: env_or("CORPUS_PATH", "./data/recipes.csv").into(),
            },
            index: IndexConfig {
                dir: env_or("INDEX_DIR", "./data/recipe_index").into(),
                chunk_size: parse_env("CHUNK_SIZE", "1200")?,
                embedding_model: env_or("EMBEDDING_MODEL", DEFAULT_MODEL_ID),
            },
            search: SearchConfig {
                top_k: parse_env("SEARCH_TOP_K", "5")?,
                timeout_ms: parse_env("SEARCH_TIMEOUT_MS", "10000")?,
            },
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: parse_env("PORT", "3000")?,
                external_url: std::env::var("EXTERNAL_URL").ok(),
                max_request_body_size: parse_env("MAX_REQUEST_BODY_SIZE", "65536")?,
            },
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", "sqlite:./data/users.db"),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "5")?,
                users_csv_path: env_or("USERS_CSV_PATH", "./data/users.csv").into(),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        if self.index.chunk_size == 0 {
            return Err(Error::Config("Chunk size must be non-zero".to_string()));
        }

        if self.search.top_k == 0 {
            return Err(Error::Config("Search top-k must be non-zero".to_string()));
        }

        if self.search.timeout_ms == 0 {
            return Err(Error::Config("Search timeout must be non-zero".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "Database max connections must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Base URL of a running server, for CLI commands that talk to it
    pub fn server_url(&self) -> String {
        self.server
            .external_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }
}
