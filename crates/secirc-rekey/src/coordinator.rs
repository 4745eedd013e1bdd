//! Runs multiple concurrent rotation sessions and sweeps for timeouts.

use std::collections::HashMap;

use crate::session::{RotationId, RotationPhase, RotationSession};
use crate::{RekeyError, Result};

/// A finished session's outcome, kept for audit after it is dropped
/// from the active table.
#[derive(Clone, Copy, Debug)]
pub struct RotationHistoryEntry {
    pub id: RotationId,
    pub phase: RotationPhase,
    pub finished_ts: u64,
}

/// Owns every rotation session this node is participating in.
#[derive(Default)]
pub struct RekeyCoordinator {
    sessions: HashMap<RotationId, RotationSession>,
    history: Vec<RotationHistoryEntry>,
}

impl RekeyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: RotationSession) {
        self.sessions.insert(session.id, session);
    }

    pub fn get(&self, id: &RotationId) -> Result<&RotationSession> {
        self.sessions.get(id).ok_or(RekeyError::NoSuchSession(*id))
    }

    pub fn get_mut(&mut self, id: &RotationId) -> Result<&mut RotationSession> {
        self.sessions
            .get_mut(id)
            .ok_or(RekeyError::NoSuchSession(*id))
    }

    /// Moves completed or failed sessions into history, and fails any
    /// session that has exceeded its `timeout_secs` without logging
    /// the in-between reason — only the final disposition is kept.
    pub fn sweep(&mut self, now: u64) -> Vec<RotationHistoryEntry> {
        for session in self.sessions.values_mut() {
            if session.is_timed_out(now) {
                session.fail();
            }
        }
        let mut finished = Vec::new();
        self.sessions.retain(|id, session| {
            if matches!(session.phase, RotationPhase::Completed | RotationPhase::Failed) {
                let entry = RotationHistoryEntry {
                    id: *id,
                    phase: session.phase,
                    finished_ts: now,
                };
                finished.push(entry);
                false
            } else {
                true
            }
        });
        self.history.extend(finished.iter().copied());
        finished
    }

    pub fn history(&self) -> &[RotationHistoryEntry] {
        &self.history
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
