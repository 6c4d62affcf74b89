use std::time::Duration;

use serde_json::Value;

/// Which classifier call shape to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierStrategy {
    /// One call returning intent and entities as JSON.
    #[default]
    Structured,
    /// One call returning only the intent token.
    SingleLabel,
}

impl ClassifierStrategy {
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "single_label" | "single-label" | "label" => ClassifierStrategy::SingleLabel,
            _ => ClassifierStrategy::Structured,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub api_key: String,
    pub engine_id: String,
    pub trusted_domain: String,
    pub max_results: usize,
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub base_url: String,
    pub headless: bool,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub chunk_size: usize,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct Timeouts {
    pub llm: Duration,
    pub embed: Duration,
    pub search: Duration,
    pub scrape: Duration,
    pub pool_acquire: Duration,
}

/// Typed view over the merged YAML config. Missing keys fall back to defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub scraper: ScraperSettings,
    pub index: IndexSettings,
    pub timeouts: Timeouts,
    pub classifier: ClassifierStrategy,
    pub history_max_turns: usize,
    pub history_max_sessions: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Settings {
    pub fn from_config(config: &Value) -> Self {
        let llm = LlmSettings {
            base_url: string_at(config, "llm", "base_url")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key: string_at(config, "llm", "api_key").unwrap_or_default(),
            chat_model: string_at(config, "llm", "chat_model")
                .unwrap_or_else(|| "gpt-4".to_string()),
            embedding_model: string_at(config, "llm", "embedding_model")
                .unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            temperature: config
                .get("llm")
                .and_then(|v| v.get("temperature"))
                .and_then(|v| v.as_f64())
                .unwrap_or(0.3),
        };

        let search = SearchSettings {
            api_key: string_at(config, "search", "api_key").unwrap_or_default(),
            engine_id: string_at(config, "search", "engine_id").unwrap_or_default(),
            trusted_domain: string_at(config, "search", "trusted_domain")
                .unwrap_or_else(|| "partselect.com".to_string()),
            max_results: u64_at(config, "search", "max_results").unwrap_or(5).min(10) as usize,
        };

        let scraper = ScraperSettings {
            base_url: string_at(config, "scraper", "base_url")
                .unwrap_or_else(|| "http://127.0.0.1:5002".to_string()),
            headless: config
                .get("scraper")
                .and_then(|v| v.get("headless"))
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            max_concurrent: u64_at(config, "scraper", "max_concurrent").unwrap_or(2).max(1)
                as usize,
        };

        let index = IndexSettings {
            chunk_size: u64_at(config, "index", "chunk_size").unwrap_or(500) as usize,
            top_k: u64_at(config, "index", "top_k").unwrap_or(3) as usize,
        };

        let secs = |key: &str, default: u64| {
            Duration::from_secs(u64_at(config, "timeouts", key).unwrap_or(default))
        };
        let timeouts = Timeouts {
            llm: secs("llm_secs", 60),
            embed: secs("embed_secs", 30),
            search: secs("search_secs", 15),
            scrape: secs("scrape_secs", 90),
            pool_acquire: secs("pool_acquire_secs", 30),
        };

        let classifier = string_at(config, "classifier", "strategy")
            .map(|s| ClassifierStrategy::from_str(&s))
            .unwrap_or_default();

        let history_max_turns = u64_at(config, "history", "max_turns").unwrap_or(20) as usize;
        let history_max_sessions =
            u64_at(config, "history", "max_sessions").unwrap_or(1_000) as usize;

        let cors_allowed_origins = config
            .get("server")
            .and_then(|v| v.get("cors_allowed_origins"))
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            llm,
            search,
            scraper,
            index,
            timeouts,
            classifier,
            history_max_turns,
            history_max_sessions,
            cors_allowed_origins,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Value::Null)
    }
}

fn string_at(config: &Value, section: &str, key: &str) -> Option<String> {
    config
        .get(section)
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

fn u64_at(config: &Value, section: &str, key: &str) -> Option<u64> {
    config
        .get(section)
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_cover_every_section() {
        let settings = Settings::default();
        assert_eq!(settings.search.trusted_domain, "partselect.com");
        assert_eq!(settings.search.max_results, 5);
        assert_eq!(settings.index.chunk_size, 500);
        assert_eq!(settings.index.top_k, 3);
        assert_eq!(settings.scraper.max_concurrent, 2);
        assert_eq!(settings.classifier, ClassifierStrategy::Structured);
        assert_eq!(settings.timeouts.search, Duration::from_secs(15));
    }

    #[test]
    fn reads_overrides_from_config() {
        let settings = Settings::from_config(&json!({
            "llm": { "chat_model": "gpt-4o", "temperature": 0.0 },
            "search": { "max_results": 10, "api_key": "  key  " },
            "scraper": { "headless": false, "max_concurrent": 4 },
            "timeouts": { "scrape_secs": 5 },
            "classifier": { "strategy": "single_label" },
            "server": { "cors_allowed_origins": ["http://localhost:3000", " "] }
        }));

        assert_eq!(settings.llm.chat_model, "gpt-4o");
        assert_eq!(settings.llm.temperature, 0.0);
        assert_eq!(settings.search.max_results, 10);
        assert_eq!(settings.search.api_key, "key");
        assert!(!settings.scraper.headless);
        assert_eq!(settings.scraper.max_concurrent, 4);
        assert_eq!(settings.timeouts.scrape, Duration::from_secs(5));
        assert_eq!(settings.classifier, ClassifierStrategy::SingleLabel);
        assert_eq!(settings.cors_allowed_origins, vec!["http://localhost:3000"]);
    }
}
