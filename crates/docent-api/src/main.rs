use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docent_api::{
    build_router,
    config::{Config, IndexBackend, PersistenceBackend},
    state::AppState,
};
use docent_chat::ChatSession;
use docent_llm::ProviderConfig;
use docent_persist::{InMemoryPersistenceClient, PersistenceClient};
use docent_retrieval::{InMemoryVectorIndex, PineconeIndex, Retriever, VectorIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Docent API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!("Initializing LLM client");
    let provider = match &config.llm.base_url {
        Some(base_url) => ProviderConfig::openai_compatible(&config.openai_api_key, base_url),
        None => ProviderConfig::openai(&config.openai_api_key),
    };
    let clients = provider.create_clients()?;

    tracing::info!(backend = ?config.retrieval.backend, "Initializing vector index");
    let index: Arc<dyn VectorIndex> = match config.retrieval.backend {
        IndexBackend::Pinecone => Arc::new(PineconeIndex::new(
            &config.retrieval.pinecone_host,
            &config.pinecone_api_key,
        )?),
        IndexBackend::Memory => {
            tracing::warn!("In-memory vector index is empty; answers will carry no sources");
            Arc::new(InMemoryVectorIndex::new())
        }
    };
    let retriever = Arc::new(Retriever::new(
        clients.embeddings,
        index,
        config.llm.embedding_model.clone(),
    ));

    tracing::info!(backend = ?config.persistence.backend, "Initializing persistence");
    let persist = build_persistence(&config).await?;

    let session = ChatSession::builder()
        .chat_client(clients.chat)
        .retriever(retriever)
        .persistence(Arc::clone(&persist))
        .config(config.session_config())
        .build()?;

    let state = Arc::new(AppState::new(config.clone(), session, persist));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_persistence(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    match config.persistence.backend {
        PersistenceBackend::Memory => {
            let memory = InMemoryPersistenceClient::new();
            for seed in config.persistence.projects.iter().cloned() {
                memory.insert_project(seed.into()).await;
            }
            tracing::info!(
                projects = config.persistence.projects.len(),
                "In-memory persistence ready"
            );
            Ok(Arc::new(memory))
        }
        PersistenceBackend::Mongodb => connect_mongodb(config).await,
    }
}

#[cfg(feature = "mongodb")]
async fn connect_mongodb(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    tracing::info!("Connecting to MongoDB");
    let client =
        docent_persist::MongoPersistenceClient::connect(&config.mongodb_uri, &config.mongodb.database)
            .await?;
    tracing::info!("MongoDB connected");
    Ok(Arc::new(client))
}

#[cfg(not(feature = "mongodb"))]
async fn connect_mongodb(_config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    anyhow::bail!("persistence.backend = \"mongodb\" requires building with the `mongodb` feature")
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
