//! In-process stand-ins for the LLM, search and scraping collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::config::settings::Settings;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, LlmService};
use crate::scrape::types::EvidenceDocument;
use crate::scrape::ScrapeClient;
use crate::tools::search::{SearchProvider, SearchResult};

const DEFAULT_EMBED_DIMS: usize = 64;
/// Reply for prompts no needle matches; extractors read it as "nothing found".
const DEFAULT_REPLY: &str = "none";

#[derive(Default)]
struct StubLlmState {
    chat_calls: Vec<Vec<ChatMessage>>,
    embed_calls: usize,
}

/// Scripted chat replies plus a deterministic bag-of-words embedder.
///
/// A reply is chosen by the first registered needle found (case-insensitive)
/// in the system prompt. Every chat call is recorded, failed ones included.
#[derive(Clone)]
pub struct StubLlm {
    replies: Vec<(String, String)>,
    fail_chat: bool,
    fail_embed: bool,
    embed_dims: usize,
    state: Arc<Mutex<StubLlmState>>,
}

impl StubLlm {
    pub fn new() -> Self {
        Self {
            replies: Vec::new(),
            fail_chat: false,
            fail_embed: false,
            embed_dims: DEFAULT_EMBED_DIMS,
            state: Arc::new(Mutex::new(StubLlmState::default())),
        }
    }

    pub fn reply_when(mut self, needle: &str, reply: &str) -> Self {
        self.replies.push((needle.to_lowercase(), reply.to_string()));
        self
    }

    pub fn failing_chat(mut self) -> Self {
        self.fail_chat = true;
        self
    }

    pub fn failing_embeddings(mut self) -> Self {
        self.fail_embed = true;
        self
    }

    /// Zero dimensions makes `embed` return no vectors at all.
    pub fn with_embed_dims(mut self, dims: usize) -> Self {
        self.embed_dims = dims;
        self
    }

    pub fn chat_calls(&self) -> Vec<Vec<ChatMessage>> {
        self.state.lock().unwrap().chat_calls.clone()
    }

    pub fn embed_calls(&self) -> usize {
        self.state.lock().unwrap().embed_calls
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.embed_dims];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % self.embed_dims as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        let system = request
            .messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();
        self.state
            .lock()
            .unwrap()
            .chat_calls
            .push(request.messages.clone());

        if self.fail_chat {
            return Err(ApiError::upstream("stub chat failure"));
        }
        let reply = self
            .replies
            .iter()
            .find(|(needle, _)| system.contains(needle))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());
        Ok(reply)
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        self.state.lock().unwrap().embed_calls += 1;
        if self.fail_embed {
            return Err(ApiError::upstream("stub embedding failure"));
        }
        if self.embed_dims == 0 {
            return Ok(Vec::new());
        }
        Ok(inputs.iter().map(|text| self.vectorize(text)).collect())
    }
}

pub fn stub_llm(stub: StubLlm) -> LlmService {
    let settings = Settings::default();
    LlmService::new(Arc::new(stub), &settings.llm, &settings.timeouts)
}

/// Search results keyed by the exact query string. Unknown queries return
/// nothing.
#[derive(Clone, Default)]
pub struct StubSearch {
    results: HashMap<String, Vec<SearchResult>>,
    fail: bool,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StubSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, query: &str, _num_results: usize) -> Result<Vec<SearchResult>, ApiError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(ApiError::upstream("stub search failure"));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

/// Documents keyed by URL, one table per page shape.
#[derive(Clone, Default)]
pub struct StubScraper {
    products: HashMap<String, EvidenceDocument>,
    symptoms: HashMap<String, EvidenceDocument>,
    failures_left: Arc<Mutex<usize>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, url: &str, document: EvidenceDocument) -> Self {
        self.products.insert(url.to_string(), document);
        self
    }

    pub fn with_symptom(mut self, url: &str, document: EvidenceDocument) -> Self {
        self.symptoms.insert(url.to_string(), document);
        self
    }

    /// The first `n` calls fail with a transient upstream error.
    pub fn failing_first(self, n: usize) -> Self {
        *self.failures_left.lock().unwrap() = n;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn serve(
        &self,
        table: &HashMap<String, EvidenceDocument>,
        url: &str,
    ) -> Result<Option<EvidenceDocument>, ApiError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(ApiError::upstream("stub scrape failure"));
            }
        }
        Ok(table.get(url).cloned())
    }
}

#[async_trait]
impl ScrapeClient for StubScraper {
    async fn scrape_product(
        &self,
        url: &str,
        _headless: bool,
    ) -> Result<Option<EvidenceDocument>, ApiError> {
        self.serve(&self.products, url).await
    }

    async fn scrape_symptom(&self, url: &str) -> Result<Option<EvidenceDocument>, ApiError> {
        self.serve(&self.symptoms, url).await
    }
}
