//! Session scoping and cancellation.
//!
//! A view owns one [`SessionSlot`]. Opening a session in the slot replaces
//! and cancels whatever session was active before, so a response only ever
//! lands in the session it was requested for.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{DiagnosisError, DiagnosisResult};

/// Identity of one opened session: the case plus a per-slot epoch.
#[derive(Debug, Clone)]
pub struct SessionScope {
    case_id: i64,
    epoch: u64,
    token: CancellationToken,
}

impl SessionScope {
    pub fn case_id(&self) -> i64 {
        self.case_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `request` unless the scope is cancelled first.
    pub async fn run<T, F>(&self, request: F) -> DiagnosisResult<T>
    where
        F: Future<Output = DiagnosisResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(DiagnosisError::Cancelled),
            result = request => result,
        }
    }
}

#[derive(Debug, Default)]
struct SlotState {
    active: Option<SessionScope>,
    next_epoch: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SessionSlot {
    inner: Arc<Mutex<SlotState>>,
    view: CancellationToken,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled when the whole view goes away. Every scope opened in
    /// this slot is a child of it.
    pub fn view_token(&self) -> CancellationToken {
        self.view.clone()
    }

    /// Open a session for `case_id`, cancelling the previous one.
    pub fn open(&self, case_id: i64) -> SessionScope {
        let mut slot = self.inner.lock();

        if let Some(previous) = slot.active.take() {
            tracing::debug!(
                case_id = previous.case_id,
                epoch = previous.epoch,
                "Replacing active session"
            );
            previous.token.cancel();
        }

        let scope = SessionScope {
            case_id,
            epoch: slot.next_epoch,
            token: self.view.child_token(),
        };
        slot.next_epoch += 1;
        slot.active = Some(scope.clone());

        scope
    }

    /// Whether `scope` is still the live session of this slot.
    pub fn is_active(&self, scope: &SessionScope) -> bool {
        let slot = self.inner.lock();
        !scope.is_cancelled()
            && slot
                .active
                .as_ref()
                .map_or(false, |active| active.epoch == scope.epoch)
    }

    /// Cancel `scope` and clear the slot if it still holds it.
    pub fn release(&self, scope: &SessionScope) {
        let mut slot = self.inner.lock();
        scope.token.cancel();
        if slot
            .active
            .as_ref()
            .map_or(false, |active| active.epoch == scope.epoch)
        {
            slot.active = None;
        }
    }

    /// Cancel whatever session is active, if any.
    #[cfg(test)]
    pub fn close_active(&self) {
        if let Some(active) = self.inner.lock().active.take() {
            tracing::debug!(case_id = active.case_id, "Closing active session");
            active.token.cancel();
        }
    }

    #[cfg(test)]
    pub fn active_case(&self) -> Option<i64> {
        self.inner.lock().active.as_ref().map(|s| s.case_id)
    }
}
