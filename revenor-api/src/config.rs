use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_LLM_TIMEOUT_MS: u64 = 1_200_000;
pub const DEFAULT_LLM_MAX_RETRIES: u32 = 2;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub database: Option<DatabaseConfig>,
    pub llm: Option<LlmConfig>,
    pub extractor: Option<ExtractorConfig>,
    pub uploads: Option<UploadConfig>,
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub frontend_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database: None,
            llm: None,
            extractor: None,
            uploads: None,
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
            frontend_url: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractorConfig {
    /// Path to the extractor CLI; takes precedence over the HTTP endpoint
    pub path: Option<PathBuf>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    pub max_file_size: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            let default_config = r#"
[database]
# path = "/var/lib/revenor/revenor.db"

[llm]
# api_key = "sk-..."            # or set OPENAI_API_KEY
# model = "gpt-4o"
# timeout_ms = 1200000
# max_retries = 2

[extractor]
# path = "/opt/statement-extractor/cli"
# url = "http://localhost:8000"

[uploads]
# max_file_size = 52428800

[cors]
allowed_origins = ["http://localhost:3000"]

[server]
host = "127.0.0.1"
port = 8080

# frontend_url = "https://office.example.kz"
"#;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .and_then(|d| d.path.clone())
            .unwrap_or_else(default_db_path)
    }

    /// The configured key, falling back to the environment
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm
            .as_ref()
            .and_then(|l| l.api_key.clone())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    pub fn llm_model(&self) -> String {
        self.llm
            .as_ref()
            .and_then(|l| l.model.clone())
            .unwrap_or_else(|| "gpt-4o".to_string())
    }

    pub fn llm_timeout_ms(&self) -> u64 {
        self.llm
            .as_ref()
            .and_then(|l| l.timeout_ms)
            .unwrap_or(DEFAULT_LLM_TIMEOUT_MS)
    }

    pub fn llm_max_retries(&self) -> u32 {
        self.llm
            .as_ref()
            .and_then(|l| l.max_retries)
            .unwrap_or(DEFAULT_LLM_MAX_RETRIES)
    }

    pub fn max_file_size(&self) -> u64 {
        self.uploads
            .as_ref()
            .and_then(|u| u.max_file_size)
            .unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    /// Configured origins plus the frontend URL, deduplicated
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = self
            .cors
            .as_ref()
            .map(|c| c.allowed_origins.clone())
            .unwrap_or_default();
        if let Some(frontend) = &self.frontend_url {
            if !origins.contains(frontend) {
                origins.push(frontend.clone());
            }
        }
        origins
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("revenor").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}

fn default_db_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join("revenor").join("revenor.db")
    } else {
        PathBuf::from("revenor.db")
    }
}
