use crate::error::NexusError;
use reqwest::redirect::Policy;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);
const CACHE_TTL: Duration = Duration::from_secs(30 * 60);
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
struct CacheEntry {
    resolved: String,
    stored_at: Instant,
}

/// Follows TME datasheet links to their final location.
///
/// Lookups are best effort: any failure keeps the original link.
pub struct DocumentResolver {
    http: reqwest::Client,
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl DocumentResolver {
    pub fn new() -> Result<Self, NexusError> {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Result<Self, NexusError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("parts-nexus/", env!("CARGO_PKG_VERSION")))
            .timeout(RESOLVE_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self {
            http,
            cache: RwLock::new(HashMap::new()),
            ttl,
        })
    }

    fn cached(&self, url: &str) -> Option<String> {
        let cache = self.cache.read().ok()?;
        cache
            .get(url)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.resolved.clone())
    }

    fn store(&self, url: &str, resolved: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
            cache.insert(
                url.to_string(),
                CacheEntry {
                    resolved: resolved.to_string(),
                    stored_at: Instant::now(),
                },
            );
        }
    }

    pub async fn resolve(&self, url: &str) -> String {
        if let Some(hit) = self.cached(url) {
            return hit;
        }
        match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let resolved = resp.url().to_string();
                self.store(url, &resolved);
                resolved
            }
            Ok(resp) => {
                debug!(url, status = %resp.status(), "document link did not resolve");
                url.to_string()
            }
            Err(e) => {
                debug!(url, error = %e, "document link lookup failed");
                url.to_string()
            }
        }
    }

    pub async fn resolve_all(&self, urls: Vec<String>) -> Vec<String> {
        futures::future::join_all(urls.iter().map(|url| self.resolve(url))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn follows_redirect_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc/1"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/files/ds.pdf", server.uri())),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/ds.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_string("%PDF"))
            .mount(&server)
            .await;

        let resolver = DocumentResolver::new().unwrap();
        let link = format!("{}/doc/1", server.uri());
        let expected = format!("{}/files/ds.pdf", server.uri());
        assert_eq!(resolver.resolve(&link).await, expected);
        assert_eq!(resolver.resolve(&link).await, expected);
    }

    #[tokio::test]
    async fn failures_keep_original_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resolver = DocumentResolver::new().unwrap();
        let link = format!("{}/missing", server.uri());
        assert_eq!(resolver.resolve(&link).await, link);
        assert_eq!(resolver.resolve("not a url").await, "not a url");
    }
}
