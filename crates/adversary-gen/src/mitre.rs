//! On-demand MITRE ATT&CK explanations with an in-memory cache.
//!
//! Tactic and technique labels are opaque to the core; this helper asks the
//! generation service for a one-sentence pedagogical explanation the first
//! time a label is seen and memoizes the answer for the session.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::{LlmClient, ReplyFormat};
use crate::error::Result;

/// The slice of the client the explainer needs: one plain-prose completion.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete_text(&self, system: &str, user: &str) -> Result<String>;
}

#[async_trait]
impl TextCompleter for LlmClient {
    async fn complete_text(&self, system: &str, user: &str) -> Result<String> {
        self.complete(system, user, ReplyFormat::Text).await
    }
}

/// Which kind of MITRE label is being explained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MitreKind {
    Tactic,
    Technique,
}

impl MitreKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Tactic => "tactic",
            Self::Technique => "technique",
        }
    }
}

pub struct MitreExplainer {
    client: Arc<dyn TextCompleter>,
    cache: RwLock<HashMap<(MitreKind, String), String>>,
}

impl MitreExplainer {
    pub fn new(client: Arc<dyn TextCompleter>) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Explain a MITRE label, hitting the service at most once per label.
    pub async fn explain(&self, kind: MitreKind, term: &str) -> Result<String> {
        let key = (kind, term.to_string());

        if let Some(cached) = self.cache.read().await.get(&key) {
            return Ok(cached.clone());
        }

        let prompt = format!(
            "Provide a concise, one-sentence explanation for the MITRE ATT&CK {}: \"{}\". \
             Focus on the adversary's goal.",
            kind.as_str(),
            term
        );
        let explanation = self
            .client
            .complete_text("You are a cybersecurity educator.", &prompt)
            .await?;
        let explanation = explanation.trim().to_string();

        self.cache.write().await.insert(key, explanation.clone());
        Ok(explanation)
    }

    /// Number of memoized explanations.
    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCompleter {
        calls: AtomicUsize,
    }

    impl CountingCompleter {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextCompleter for CountingCompleter {
        async fn complete_text(&self, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("  An explanation of: {user}  "))
        }
    }

    #[tokio::test]
    async fn explain_hits_the_service_once_per_label() {
        let completer = Arc::new(CountingCompleter::new());
        let explainer = MitreExplainer::new(completer.clone());

        let first = explainer
            .explain(MitreKind::Technique, "T1558.003")
            .await
            .unwrap();
        let second = explainer
            .explain(MitreKind::Technique, "T1558.003")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(completer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(explainer.cached_count().await, 1);
    }

    #[tokio::test]
    async fn cache_is_keyed_by_kind_and_term() {
        let completer = Arc::new(CountingCompleter::new());
        let explainer = MitreExplainer::new(completer.clone());

        // Same term as tactic and as technique: distinct cache entries.
        explainer
            .explain(MitreKind::Tactic, "Credential Access")
            .await
            .unwrap();
        explainer
            .explain(MitreKind::Technique, "Credential Access")
            .await
            .unwrap();

        assert_eq!(completer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(explainer.cached_count().await, 2);
    }

    #[tokio::test]
    async fn explanations_are_trimmed() {
        let explainer = MitreExplainer::new(Arc::new(CountingCompleter::new()));
        let text = explainer.explain(MitreKind::Tactic, "Impact").await.unwrap();
        assert!(!text.starts_with(' '));
        assert!(!text.ends_with(' '));
    }
}
