//! In-memory wizard sessions.
//!
//! A draft lives only for the lifetime of its session; nothing is persisted.
//! At most one AI improvement runs per session: starting a new one aborts the
//! previous, and closing the session aborts whatever is still in flight.
//! A cancelled improvement never writes into the draft. One that completes
//! after its caller went away is still applied.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::gate::{AccessError, Viewer};
use crate::access::paywall::PaywallFlow;
use crate::builder::improve::{improve_text, ImproveOutcome, ImproveStatus, TextImprover};
use crate::builder::strength::StrengthReport;
use crate::builder::wizard::{ImproveTarget, Step, Wizard};
use crate::errors::AppError;
use crate::models::cv::CvData;
use crate::render::TemplateKind;

struct InFlight {
    token: u64,
    abort: AbortHandle,
}

pub struct WizardSession {
    pub wizard: Wizard,
    pub paywall: PaywallFlow,
    in_flight: Option<InFlight>,
    touched_at: DateTime<Utc>,
}

impl WizardSession {
    fn new() -> Self {
        Self {
            wizard: Wizard::new(),
            paywall: PaywallFlow::default(),
            in_flight: None,
            touched_at: Utc::now(),
        }
    }

    pub fn is_improving(&self) -> bool {
        self.in_flight.is_some()
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort.abort();
        }
    }

    pub fn view(&self, id: Uuid) -> SessionView {
        SessionView {
            id,
            step: self.wizard.step,
            step_number: self.wizard.step.number(),
            can_advance: self.wizard.step.can_advance(),
            can_go_back: self.wizard.step.can_go_back(),
            cv: self.wizard.cv.clone(),
            template: self.wizard.template,
            education_first: self.wizard.education_first,
            strength: self.wizard.strength(),
            paywall: self.paywall.clone(),
            is_improving: self.is_improving(),
        }
    }
}

/// Snapshot returned by every session route.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub step: Step,
    pub step_number: u8,
    pub can_advance: bool,
    pub can_go_back: bool,
    pub cv: CvData,
    pub template: TemplateKind,
    pub education_first: bool,
    pub strength: StrengthReport,
    pub paywall: PaywallFlow,
    pub is_improving: bool,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, WizardSession>>>,
    next_token: Arc<AtomicU64>,
    limit: usize,
}

impl SessionStore {
    pub fn new(limit: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_token: Arc::new(AtomicU64::new(1)),
            limit: limit.max(1),
        }
    }

    /// Opens a fresh session. At capacity, the least recently touched session is dropped.
    pub async fn open(&self) -> SessionView {
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.limit {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.touched_at)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                if let Some(mut evicted) = sessions.remove(&oldest) {
                    evicted.abort_in_flight();
                }
                warn!("Session limit {} reached; evicted session {}", self.limit, oldest);
            }
        }

        let id = Uuid::new_v4();
        let session = WizardSession::new();
        let view = session.view(id);
        sessions.insert(id, session);
        info!("Opened CV session {id}");
        view
    }

    /// Drops the session and cancels any in-flight improvement.
    pub async fn close(&self, id: Uuid) -> Result<(), AppError> {
        let mut removed = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| not_found(id))?;
        removed.abort_in_flight();
        info!("Closed CV session {id}");
        Ok(())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn read<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&WizardSession) -> R,
    ) -> Result<R, AppError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or_else(|| not_found(id))?;
        Ok(f(session))
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        self.read(id, |s| s.view(id)).await
    }

    /// Mutates the session in place and returns the closure's result.
    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WizardSession) -> R,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.touched_at = Utc::now();
        Ok(f(session))
    }

    pub async fn is_improving(&self, id: Uuid) -> Result<bool, AppError> {
        self.read(id, |s| s.is_improving()).await
    }

    /// Improves the text at `target` and applies the result unless the call
    /// was superseded or the session closed in the meantime.
    ///
    /// The spawned task owns the slot: it releases it and writes the result
    /// even if the caller stops waiting.
    pub async fn improve(
        &self,
        id: Uuid,
        improver: Arc<dyn TextImprover>,
        viewer: Viewer,
        target: ImproveTarget,
        text: Option<String>,
        timeout: Duration,
    ) -> Result<ImproveOutcome, AppError> {
        viewer.require_profile()?;

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (original, handle) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
            let original = match text {
                Some(text) => text,
                None => session
                    .wizard
                    .text_at(target)
                    .ok_or_else(|| AppError::NotFound("Experience not found".to_string()))?
                    .to_string(),
            };

            // Empty text leaves any pending improvement alone.
            if original.trim().is_empty() {
                return Ok(ImproveOutcome::unchanged(&original, ImproveStatus::Skipped));
            }

            if session.is_improving() {
                debug!("Superseding in-flight improvement in session {id}");
            }
            session.abort_in_flight();

            let handle = tokio::spawn(run_improvement(
                Arc::clone(&self.sessions),
                id,
                token,
                improver,
                viewer,
                target,
                original.clone(),
                timeout,
            ));
            session.in_flight = Some(InFlight {
                token,
                abort: handle.abort_handle(),
            });
            session.touched_at = Utc::now();
            (original, handle)
        };

        match handle.await {
            Ok(result) => Ok(result?),
            Err(e) if e.is_cancelled() => {
                Ok(ImproveOutcome::unchanged(&original, ImproveStatus::Cancelled))
            }
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Improve task failed: {e}"
            ))),
        }
    }
}

/// Runs one improvement and settles it against the session it was started in.
#[allow(clippy::too_many_arguments)]
async fn run_improvement(
    sessions: Arc<RwLock<HashMap<Uuid, WizardSession>>>,
    id: Uuid,
    token: u64,
    improver: Arc<dyn TextImprover>,
    viewer: Viewer,
    target: ImproveTarget,
    original: String,
    timeout: Duration,
) -> Result<ImproveOutcome, AccessError> {
    let result = improve_text(improver.as_ref(), &viewer, &original, target.kind(), timeout).await;

    let mut sessions = sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        return result.map(|_| ImproveOutcome::unchanged(&original, ImproveStatus::Cancelled));
    };
    if session.in_flight.as_ref().map(|f| f.token) != Some(token) {
        // A newer call took over after this one had already finished.
        return result.map(|_| ImproveOutcome::unchanged(&original, ImproveStatus::Cancelled));
    }
    session.in_flight = None;

    let outcome = result?;
    if outcome.is_improved() && !session.wizard.apply_improvement(target, outcome.text.clone()) {
        return Ok(ImproveOutcome::unchanged(&original, ImproveStatus::Cancelled));
    }
    Ok(outcome)
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("CV session {id} not found"))
}
