use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::llm::types::ChatMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

struct SessionBuffer {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Store-wide sequence number of the last write; orders eviction.
    touched: u64,
    messages: VecDeque<HistoryMessage>,
}

impl SessionBuffer {
    fn new(touched: u64) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            touched,
            messages: VecDeque::new(),
        }
    }
}

/// Per-session conversation buffer. Lives only as long as the process.
///
/// Each session keeps its most recent `max_turns` messages; older ones fall off
/// the front. At most `max_sessions` sessions are held; registering one more
/// evicts the least recently updated.
pub struct HistoryStore {
    sessions: RwLock<HashMap<String, SessionBuffer>>,
    clock: AtomicU64,
    max_turns: usize,
    max_sessions: usize,
}

impl HistoryStore {
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            max_turns,
            max_sessions: max_sessions.max(1),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn create_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        self.register(&mut sessions, &id);
        id
    }

    /// Uses `session_id` when given, registering it if unseen; otherwise opens
    /// a fresh session.
    pub async fn resolve_session(&self, session_id: Option<&str>) -> String {
        match session_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                let mut sessions = self.sessions.write().await;
                if !sessions.contains_key(id) {
                    self.register(&mut sessions, id);
                }
                id.to_string()
            }
            None => self.create_session().await,
        }
    }

    pub async fn add_message(&self, session_id: &str, role: &str, content: &str) {
        if self.max_turns == 0 {
            return;
        }
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(session_id) {
            self.register(&mut sessions, session_id);
        }
        let touched = self.tick();
        let Some(buffer) = sessions.get_mut(session_id) else {
            return;
        };
        let now = Utc::now();
        buffer.messages.push_back(HistoryMessage {
            role: role.to_string(),
            content: content.to_string(),
            created_at: now,
        });
        while buffer.messages.len() > self.max_turns {
            buffer.messages.pop_front();
        }
        buffer.updated_at = now;
        buffer.touched = touched;
    }

    /// Inserts an empty buffer for `id`, evicting the stalest sessions first
    /// so the map never exceeds `max_sessions`.
    fn register(&self, sessions: &mut HashMap<String, SessionBuffer>, id: &str) {
        while sessions.len() >= self.max_sessions {
            let Some(stalest) = sessions
                .iter()
                .min_by_key(|(_, buffer)| buffer.touched)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            tracing::debug!("Evicting idle session {}", stalest);
            sessions.remove(&stalest);
        }
        sessions.insert(id.to_string(), SessionBuffer::new(self.tick()));
    }

    /// Oldest-first turns, ready to splice into a prompt.
    pub async fn get_history(&self, session_id: &str) -> Vec<ChatMessage> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|buffer| {
                buffer
                    .messages
                    .iter()
                    .map(|m| ChatMessage {
                        role: m.role.clone(),
                        content: m.content.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn session_info(&self, session_id: &str) -> Option<SessionInfo> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|buffer| SessionInfo {
            id: session_id.to_string(),
            created_at: buffer.created_at,
            updated_at: buffer.updated_at,
            message_count: buffer.messages.len(),
        })
    }

    pub async fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
