//! System-wide constants and dedup-key builders.

use uuid::Uuid;

/// User-Agent header sent on every outbound webhook request.
pub const WEBHOOK_USER_AGENT: &str = "Pressroom-Webhook/1.0";

/// Default webhook request timeout in seconds.
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 30;

/// Default number of in-call webhook retries (5xx / connection errors only).
pub const DEFAULT_WEBHOOK_RETRY_TIMES: u32 = 3;

/// Default delay between in-call webhook retries in milliseconds.
pub const DEFAULT_WEBHOOK_RETRY_DELAY_MS: u64 = 100;

/// Masked replacement for sensitive header values.
pub const MASKED_HEADER_VALUE: &str = "••••••••";

/// Default TTL for ephemeral progress-cache entries.
pub const DEFAULT_PROGRESS_TTL_SECS: u64 = 15 * 60;

/// Dedup-key builders.
///
/// Keys scope mutual exclusion: at most one execution of a task class runs
/// per key at any time.
pub mod dedup_keys {
    use super::Uuid;

    /// Generation is keyed by keyword when present so two calendar rows for
    /// the same keyword cannot generate concurrently.
    pub fn generation(keyword_id: Option<Uuid>, content_id: Uuid) -> String {
        match keyword_id {
            Some(kw) => format!("generate-keyword-{kw}"),
            None => format!("generate-content-{content_id}"),
        }
    }

    pub fn enrichment(content_id: Uuid) -> String {
        format!("enrich-article-{content_id}")
    }

    pub fn publication(publication_id: Uuid) -> String {
        format!("publication-{publication_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_key_prefers_keyword() {
        let kw = Uuid::new_v4();
        let content = Uuid::new_v4();
        assert_eq!(
            dedup_keys::generation(Some(kw), content),
            format!("generate-keyword-{kw}")
        );
        assert_eq!(
            dedup_keys::generation(None, content),
            format!("generate-content-{content}")
        );
    }
}
