use std::sync::Arc;

use crate::assistant::QueryRouter;
use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::history::HistoryStore;
use crate::llm::{LlmProvider, LlmService, OpenAiProvider};
use crate::rag::{InMemoryFragmentStore, SemanticIndex};
use crate::scrape::{HttpScrapeClient, ScrapeClient, ScraperPool};
use crate::tools::{GoogleSearchProvider, SearchProvider};

pub mod error;

use error::InitializationError;

/// Process-scoped state shared by every request.
///
/// Holds the one semantic index of the process; the router and the health
/// endpoint see the same instance.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub history: HistoryStore,
    pub index: Arc<SemanticIndex>,
    pub router: QueryRouter,
}

impl AppState {
    /// Loads configuration and wires the production collaborators:
    /// an OpenAI-compatible LLM, Google Custom Search, and the HTTP scraping
    /// service.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());

        let raw = config
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        tracing::debug!(
            "Effective config: {}",
            config.redact_sensitive_values(&raw)
        );
        let settings = Settings::from_config(&raw);

        reqwest::Url::parse(&settings.scraper.base_url).map_err(|e| {
            InitializationError::Scraper(anyhow::anyhow!(
                "invalid scraper.base_url {:?}: {}",
                settings.scraper.base_url,
                e
            ))
        })?;

        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(
            settings.llm.base_url.clone(),
            settings.llm.api_key.clone(),
        ));
        let search: Arc<dyn SearchProvider> = Arc::new(GoogleSearchProvider::new(&settings.search));
        let scraper: Arc<dyn ScrapeClient> =
            Arc::new(HttpScrapeClient::new(settings.scraper.base_url.clone()));

        if settings.llm.api_key.is_empty() {
            tracing::warn!("llm.api_key is empty; LLM calls will be sent unauthenticated");
        }

        Ok(Arc::new(Self::with_collaborators(
            paths, config, settings, llm, search, scraper,
        )))
    }

    /// Builds the state around explicit collaborators.
    pub fn with_collaborators(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: Settings,
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        scraper: Arc<dyn ScrapeClient>,
    ) -> Self {
        let service = LlmService::new(llm, &settings.llm, &settings.timeouts);
        tracing::info!(
            "LLM provider: {} (chat model {})",
            service.provider_name(),
            settings.llm.chat_model
        );

        let index = Arc::new(SemanticIndex::new(
            Arc::new(InMemoryFragmentStore::new()),
            service.clone(),
            settings.index.chunk_size,
            settings.index.top_k,
        ));
        let pool = ScraperPool::new(scraper, &settings.scraper, &settings.timeouts);
        let router = QueryRouter::new(service, search, pool, index.clone(), &settings);
        let history = HistoryStore::new(settings.history_max_turns, settings.history_max_sessions);

        AppState {
            paths,
            config,
            settings,
            history,
            index,
            router,
        }
    }
}
