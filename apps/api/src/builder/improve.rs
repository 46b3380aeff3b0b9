//! AI text improvement for the summary and experience descriptions.
//!
//! Fail-soft: provider errors and timeouts hand back the original text so the
//! wizard always stays usable. Only a missing sign-in is reported as an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::access::gate::{AccessError, Viewer};
use crate::llm_client::prompts::{
    CV_REWRITE_SYSTEM, DESCRIPTION_PROMPT_TEMPLATE, SUMMARY_PROMPT_TEMPLATE,
};
use crate::llm_client::{LlmClient, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImproveKind {
    Summary,
    Description,
}

/// The text-improvement provider. Carried in `AppState` as `Arc<dyn TextImprover>`.
#[async_trait]
pub trait TextImprover: Send + Sync {
    async fn improve(&self, text: &str, kind: ImproveKind) -> Result<String, LlmError>;
}

pub struct LlmTextImprover(pub LlmClient);

#[async_trait]
impl TextImprover for LlmTextImprover {
    async fn improve(&self, text: &str, kind: ImproveKind) -> Result<String, LlmError> {
        let template = match kind {
            ImproveKind::Summary => SUMMARY_PROMPT_TEMPLATE,
            ImproveKind::Description => DESCRIPTION_PROMPT_TEMPLATE,
        };
        let prompt = template.replace("{text}", text);
        self.0.complete_text(&prompt, CV_REWRITE_SYSTEM).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImproveStatus {
    Improved,
    /// Empty input; the provider was not called.
    Skipped,
    /// Provider failed or timed out; the original text is returned.
    Fallback,
    /// Superseded or the session closed before the provider answered.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImproveOutcome {
    pub text: String,
    pub status: ImproveStatus,
}

impl ImproveOutcome {
    pub fn unchanged(text: &str, status: ImproveStatus) -> Self {
        Self {
            text: text.to_string(),
            status,
        }
    }

    pub fn is_improved(&self) -> bool {
        self.status == ImproveStatus::Improved
    }
}

/// Runs one improvement with the given deadline.
pub async fn improve_text(
    improver: &dyn TextImprover,
    viewer: &Viewer,
    text: &str,
    kind: ImproveKind,
    timeout: Duration,
) -> Result<ImproveOutcome, AccessError> {
    viewer.require_profile()?;

    if text.trim().is_empty() {
        return Ok(ImproveOutcome::unchanged(text, ImproveStatus::Skipped));
    }

    match tokio::time::timeout(timeout, improver.improve(text, kind)).await {
        Ok(Ok(improved)) if !improved.trim().is_empty() => {
            debug!("Improved {:?} text ({} chars)", kind, improved.len());
            Ok(ImproveOutcome {
                text: improved,
                status: ImproveStatus::Improved,
            })
        }
        Ok(Ok(_)) => {
            warn!("Text improver returned empty output for {:?}; keeping original", kind);
            Ok(ImproveOutcome::unchanged(text, ImproveStatus::Fallback))
        }
        Ok(Err(e)) => {
            warn!("Text improver failed for {:?}: {e}; keeping original", kind);
            Ok(ImproveOutcome::unchanged(text, ImproveStatus::Fallback))
        }
        Err(_) => {
            warn!(
                "Text improver timed out after {}s for {:?}; keeping original",
                timeout.as_secs(),
                kind
            );
            Ok(ImproveOutcome::unchanged(text, ImproveStatus::Fallback))
        }
    }
}

#[cfg(test)]
pub mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    pub enum Behaviour {
        Prefix(&'static str),
        Fail,
        Hang,
        Delay(Duration),
    }

    pub struct FakeImprover {
        pub behaviour: Behaviour,
        pub calls: AtomicUsize,
    }

    impl FakeImprover {
        pub fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextImprover for FakeImprover {
        async fn improve(&self, text: &str, _kind: ImproveKind) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Prefix(prefix) => Ok(format!("{prefix}{text}")),
                Behaviour::Fail => Err(LlmError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                }),
                Behaviour::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                Behaviour::Delay(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(format!("late:{text}"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{Behaviour, FakeImprover};
    use super::*;
    use crate::access::gate::tests::profile;

    fn signed_in() -> Viewer {
        Viewer::signed_in(profile(0))
    }

    const TIMEOUT: Duration = Duration::from_secs(20);

    #[tokio::test]
    async fn test_empty_text_skips_provider() {
        let improver = FakeImprover::new(Behaviour::Prefix("better: "));
        let outcome = improve_text(&improver, &signed_in(), "", ImproveKind::Summary, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(outcome.status, ImproveStatus::Skipped);
        assert_eq!(outcome.text, "");
        assert_eq!(improver.calls(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_viewer_needs_auth() {
        let improver = FakeImprover::new(Behaviour::Prefix("better: "));
        let result = improve_text(
            &improver,
            &Viewer::anonymous(),
            "Trabalhei em vendas.",
            ImproveKind::Description,
            TIMEOUT,
        )
        .await;
        assert_eq!(result, Err(AccessError::AuthRequired));
        assert_eq!(improver.calls(), 0);
    }

    #[tokio::test]
    async fn test_success_returns_improved_text() {
        let improver = FakeImprover::new(Behaviour::Prefix("better: "));
        let outcome = improve_text(
            &improver,
            &signed_in(),
            "Trabalhei em vendas.",
            ImproveKind::Description,
            TIMEOUT,
        )
        .await
        .unwrap();
        assert!(outcome.is_improved());
        assert_eq!(outcome.text, "better: Trabalhei em vendas.");
    }

    #[tokio::test]
    async fn test_provider_failure_returns_original() {
        let improver = FakeImprover::new(Behaviour::Fail);
        let outcome = improve_text(
            &improver,
            &signed_in(),
            "Resumo original.",
            ImproveKind::Summary,
            TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(outcome.status, ImproveStatus::Fallback);
        assert_eq!(outcome.text, "Resumo original.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_original() {
        let improver = FakeImprover::new(Behaviour::Hang);
        let outcome = improve_text(
            &improver,
            &signed_in(),
            "Resumo original.",
            ImproveKind::Summary,
            Duration::from_secs(15),
        )
        .await
        .unwrap();
        assert_eq!(outcome.status, ImproveStatus::Fallback);
        assert_eq!(outcome.text, "Resumo original.");
        assert_eq!(improver.calls(), 1);
    }
}
