//! Finds the page worth scraping for a set of entities.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::types::EntitySet;
use crate::core::config::settings::SearchSettings;
use crate::core::retry::with_single_retry;
use crate::tools::search::{SearchProvider, SearchResult};

/// Search strings the locator issues.
pub mod queries {
    pub fn site_scoped(identifier: &str, domain: &str) -> String {
        format!("{} site:{}", identifier.trim(), domain)
    }

    pub fn part_lookup(part_number: &str) -> String {
        format!("part {}", part_number.trim())
    }

    pub fn model_compatibility(part_number: &str, model_number: &str) -> String {
        format!("{} compatible with {}", part_number.trim(), model_number.trim())
    }

    pub fn symptom_repair(appliance: &str, symptom: &str) -> String {
        format!("{} {} repair parts fix", appliance, symptom.trim())
    }

    pub fn installation_guide(part_number: &str) -> String {
        format!("{} installation instructions how to install", part_number.trim())
    }
}

pub struct EvidenceLocator {
    search: Arc<dyn SearchProvider>,
    trusted_domain: String,
    max_results: usize,
    timeout: Duration,
}

impl EvidenceLocator {
    pub fn new(search: Arc<dyn SearchProvider>, settings: &SearchSettings, timeout: Duration) -> Self {
        Self {
            search,
            trusted_domain: settings.trusted_domain.trim().to_lowercase(),
            max_results: settings.max_results.clamp(1, 10),
            timeout,
        }
    }

    pub async fn find_product_url_by_model(&self, model_number: &str) -> Option<String> {
        let results = self
            .run(&queries::site_scoped(model_number, &self.trusted_domain))
            .await;
        self.pick(&results, model_number, "model")
    }

    pub async fn find_product_url_by_part(&self, part_number: &str) -> Option<String> {
        let results = self
            .run(&queries::site_scoped(part_number, &self.trusted_domain))
            .await;
        if let Some(url) = self.pick(&results, part_number, "part") {
            return Some(url);
        }
        let results = self.run(&queries::part_lookup(part_number)).await;
        self.pick(&results, part_number, "part")
    }

    /// Part page for an install question, falling back to a how-to search.
    pub async fn find_installation_page(&self, part_number: &str) -> Option<String> {
        if let Some(url) = self.find_product_url_by_part(part_number).await {
            return Some(url);
        }
        let results = self.run(&queries::installation_guide(part_number)).await;
        self.pick(&results, part_number, "installation")
    }

    /// Model page for a compatibility question, falling back to a search that
    /// names both the part and the model.
    pub async fn find_compatibility_page(
        &self,
        model_number: &str,
        part_number: &str,
    ) -> Option<String> {
        if let Some(url) = self.find_product_url_by_model(model_number).await {
            return Some(url);
        }
        let results = self
            .run(&queries::model_compatibility(part_number, model_number))
            .await;
        rank_candidates(&results, model_number, &self.trusted_domain)
    }

    /// Trusted symptom pages for `symptom`, in search order, deduplicated.
    pub async fn find_symptom_pages(&self, symptom: &str, entities: &EntitySet) -> Vec<String> {
        let qualifier = entities
            .model_number
            .as_deref()
            .or(entities.brand.as_deref())
            .unwrap_or("refrigerator dishwasher");
        let results = self.run(&format!("{} {}", symptom.trim(), qualifier)).await;
        let pages = self.symptom_pages(&results);
        if !pages.is_empty() {
            return pages;
        }

        let Some(appliance) = entities.appliance_type else {
            return pages;
        };
        let results = self
            .run(&queries::symptom_repair(appliance.as_str(), symptom))
            .await;
        self.symptom_pages(&results)
    }

    fn symptom_pages(&self, results: &[SearchResult]) -> Vec<String> {
        let mut seen = HashSet::new();
        let pages: Vec<String> = results
            .iter()
            .filter(|r| is_trusted(&r.url, &self.trusted_domain))
            .filter(|r| r.url.contains("Symptoms") || r.url.to_lowercase().contains("symptom"))
            .filter(|r| seen.insert(r.url.clone()))
            .map(|r| r.url.clone())
            .collect();
        tracing::info!("Found {} symptom pages", pages.len());
        pages
    }

    fn pick(&self, results: &[SearchResult], identifier: &str, kind: &str) -> Option<String> {
        let picked = rank_candidates(results, identifier, &self.trusted_domain);
        match &picked {
            Some(url) => tracing::info!("Located {} page for {}: {}", kind, identifier, url),
            None => tracing::warn!("No trusted {} page for {}", kind, identifier),
        }
        picked
    }

    /// One search with a single retry on transient failure. Failures come back
    /// as an empty result list.
    async fn run(&self, query: &str) -> Vec<SearchResult> {
        let search = self.search.clone();
        let num = self.max_results;
        let result = with_single_retry("search", self.timeout, || {
            let search = search.clone();
            let query = query.to_string();
            async move { search.search(&query, num).await }
        })
        .await;

        match result {
            Ok(results) => {
                tracing::debug!("Search {:?} returned {} results", query, results.len());
                results
            }
            Err(err) => {
                tracing::warn!("Search {:?} failed: {}", query, err);
                Vec::new()
            }
        }
    }
}

/// Three tiers, all restricted to the trusted domain: URL naming the
/// identifier, then a canonical product path, then the first result.
pub fn rank_candidates(
    results: &[SearchResult],
    identifier: &str,
    trusted_domain: &str,
) -> Option<String> {
    let needle = identifier.trim().to_lowercase();
    let trusted: Vec<&SearchResult> = results
        .iter()
        .filter(|r| is_trusted(&r.url, trusted_domain))
        .collect();

    if !needle.is_empty() {
        if let Some(hit) = trusted.iter().find(|r| r.url.to_lowercase().contains(&needle)) {
            return Some(hit.url.clone());
        }
    }

    if let Some(hit) = trusted.iter().find(|r| is_canonical_product_path(&r.url)) {
        return Some(hit.url.clone());
    }

    results
        .first()
        .filter(|first| is_trusted(&first.url, trusted_domain))
        .map(|first| first.url.clone())
}

/// Host is the trusted domain or one of its subdomains.
pub fn is_trusted(url: &str, trusted_domain: &str) -> bool {
    let without_scheme = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .rsplit('@')
        .next()
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("")
        .to_lowercase();
    let domain = trusted_domain.trim().to_lowercase();
    !domain.is_empty() && (host == domain || host.ends_with(&format!(".{}", domain)))
}

fn is_canonical_product_path(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path = lower
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&lower);
    let path = path.find('/').map(|idx| &path[idx..]).unwrap_or("");
    path.starts_with("/parts/")
        || path.starts_with("/models/")
        || (path.starts_with("/ps") && path.ends_with(".htm"))
}
