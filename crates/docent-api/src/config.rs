use config::{Config as ConfigLoader, ConfigError, Environment, File};
use docent_chat::SessionConfig;
use docent_persist::Project;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub mongodb: MongoDbConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub pinecone_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

/// The upstream session layer authenticates the caller and forwards the
/// identity in this header
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
        }
    }
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,
    /// Projects seeded into the in-memory backend at startup
    #[serde(default)]
    pub projects: Vec<SeedProject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProject {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl From<SeedProject> for Project {
    fn from(seed: SeedProject) -> Self {
        let project = Project::new(seed.id, seed.owner_id, seed.name);
        match seed.namespace {
            Some(namespace) => project.with_namespace(namespace),
            None => project,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            database: "docent".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// OpenAI-compatible endpoint; the public API when unset
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Memory,
    Pinecone,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub backend: IndexBackend,
    #[serde(default)]
    pub pinecone_host: String,
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            pinecone_host: String::new(),
            relevance_threshold: default_relevance_threshold(),
            top_k: default_top_k(),
        }
    }
}

fn default_relevance_threshold() -> f32 {
    docent_retrieval::filter::DEFAULT_RELEVANCE_THRESHOLD
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_secs: u64,
    /// Overrides the built-in system guideline
    #[serde(default)]
    pub guideline: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            stream_timeout_secs: default_stream_timeout(),
            guideline: None,
        }
    }
}

fn default_history_window() -> usize {
    6
}

fn default_stream_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables `DOCENT_<SECTION>__<KEY>`, e.g. `DOCENT_SERVER__PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("DOCENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets are never read from TOML
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;

        if cfg.retrieval.backend == IndexBackend::Pinecone {
            cfg.pinecone_api_key = std::env::var("PINECONE_API_KEY").map_err(|_| {
                ConfigError::Message(
                    "PINECONE_API_KEY environment variable is required".to_string(),
                )
            })?;
        }

        if cfg.persistence.backend == PersistenceBackend::Mongodb {
            cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message("MONGODB_URI environment variable is required".to_string())
            })?;
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Controller settings derived from the `llm`, `retrieval` and `chat` sections
    pub fn session_config(&self) -> SessionConfig {
        let mut session = SessionConfig::new()
            .with_model(self.llm.model.clone())
            .with_relevance_threshold(self.retrieval.relevance_threshold)
            .with_top_k(self.retrieval.top_k)
            .with_history_window(self.chat.history_window)
            .with_stream_timeout(Duration::from_secs(self.chat.stream_timeout_secs));

        session.temperature = self.llm.temperature;
        session.max_tokens = self.llm.max_tokens;
        if let Some(guideline) = &self.chat.guideline {
            session = session.with_guideline(guideline.clone());
        }
        session
    }
}
