use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::{Config, LlmConfig};
use crate::loan_model::LoanSafetyModel;
use crate::models::{AdminAccount, CommunityPost, ExpenseEntry, User};
use crate::speech::SarvamClient;
use crate::store::JsonCollection;
use crate::vectors::VectorBackend;

/// Concurrent advisor pipelines (text and voice chat combined).
const MAX_CONCURRENT_CHATS: usize = 3;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<JsonCollection<User>>,
    pub admins: Arc<JsonCollection<AdminAccount>>,
    pub posts: Arc<JsonCollection<CommunityPost>>,
    pub expenses: Arc<JsonCollection<ExpenseEntry>>,
    pub vectors: Arc<VectorBackend>,
    pub speech: SarvamClient,
    pub http_client: reqwest::Client,
    pub llm_config: Arc<RwLock<LlmConfig>>,
    pub loan_model: Option<Arc<LoanSafetyModel>>,
    pub chat_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Ensure data directories exist
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(config.uploads_dir())?;

        let users = JsonCollection::open(&config.collection_path("users"))?;
        let admins = JsonCollection::open(&config.collection_path("admins"))?;
        let posts = JsonCollection::open(&config.collection_path("community_posts"))?;
        let expenses = JsonCollection::open(&config.collection_path("expenses"))?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let vectors = VectorBackend::from_config(&config, http_client.clone())?;
        let speech = SarvamClient::new(http_client.clone(), &config.speech);
        let loan_model = LoanSafetyModel::load_optional(config.loan_model_path.as_deref());
        let llm_config = config.llm.clone();

        tracing::info!(
            users = users.count(),
            posts = posts.count(),
            "Loaded document collections from {}",
            config.data_dir.display()
        );

        Ok(Self {
            config,
            users: Arc::new(users),
            admins: Arc::new(admins),
            posts: Arc::new(posts),
            expenses: Arc::new(expenses),
            vectors: Arc::new(vectors),
            speech,
            http_client,
            llm_config: Arc::new(RwLock::new(llm_config)),
            loan_model: loan_model.map(Arc::new),
            chat_semaphore: Arc::new(tokio::sync::Semaphore::new(MAX_CONCURRENT_CHATS)),
        })
    }

    /// Snapshot of the runtime LLM settings; the lock is released before any request is sent.
    pub fn llm(&self) -> LlmConfig {
        self.llm_config.read().clone()
    }
}
