//! Tracks every known user's presence record.

use std::collections::HashMap;

use secirc_types::presence::{PresenceStatus, UserPresence};
use secirc_types::{Hash16, SessionId};

use crate::{PresenceError, Result};

#[derive(Default)]
pub struct PresenceRegistry {
    users: HashMap<Hash16, UserPresence>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_online(
        &mut self,
        user: Hash16,
        server: Hash16,
        session: SessionId,
        pk: [u8; 32],
        nickname: impl Into<String>,
        now: u64,
    ) {
        let presence = self.users.entry(user).or_insert_with(|| UserPresence {
            user,
            status: PresenceStatus::Offline,
            last_seen: now,
            server,
            session,
            pk,
            nickname: nickname.into(),
            status_message: String::new(),
        });
        presence.server = server;
        presence.session = session;
        presence.pk = pk;
        presence.mark_online(now);
    }

    pub fn mark_offline(&mut self, user: &Hash16) -> Result<()> {
        self.users
            .get_mut(user)
            .map(|p| p.mark_offline())
            .ok_or(PresenceError::UnknownUser(*user))
    }

    pub fn set_status(&mut self, user: &Hash16, status: PresenceStatus, now: u64) -> Result<()> {
        let presence = self.users.get_mut(user).ok_or(PresenceError::UnknownUser(*user))?;
        presence.status = status;
        presence.last_seen = now;
        Ok(())
    }

    pub fn get(&self, user: &Hash16) -> Option<&UserPresence> {
        self.users.get(user)
    }

    pub fn is_online(&self, user: &Hash16) -> bool {
        self.users
            .get(user)
            .is_some_and(|p| matches!(p.status, PresenceStatus::Online | PresenceStatus::Away | PresenceStatus::Busy))
    }

    /// Users currently reachable for redelivery (online, away, or busy —
    /// anything but offline/invisible).
    pub fn online_users(&self) -> Vec<Hash16> {
        self.users.keys().filter(|user| self.is_online(user)).copied().collect()
    }

    /// Marks every presence record whose heartbeat has gone stale as
    /// offline, returning the affected users.
    pub fn sweep_stale(&mut self, now: u64, presence_timeout_secs: u64) -> Vec<Hash16> {
        let stale: Vec<Hash16> = self
            .users
            .iter()
            .filter(|(_, p)| p.is_stale(now, presence_timeout_secs))
            .map(|(user, _)| *user)
            .collect();
        for user in &stale {
            if let Some(p) = self.users.get_mut(user) {
                p.mark_offline();
            }
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_online_then_offline() {
        let mut registry = PresenceRegistry::new();
        let user = [1u8; 16];
        registry.mark_online(user, [2u8; 16], [3u8; 16], [0u8; 32], "alice", 100);
        assert!(registry.is_online(&user));
        registry.mark_offline(&user).unwrap();
        assert!(!registry.is_online(&user));
        assert_eq!(registry.get(&user).unwrap().last_seen, 100);
    }

    #[test]
    fn test_sweep_stale_marks_offline() {
        let mut registry = PresenceRegistry::new();
        let user = [1u8; 16];
        registry.mark_online(user, [2u8; 16], [3u8; 16], [0u8; 32], "alice", 0);
        let stale = registry.sweep_stale(1000, 300);
        assert_eq!(stale, vec![user]);
        assert!(!registry.is_online(&user));
    }

    #[test]
    fn test_unknown_user_errors() {
        let mut registry = PresenceRegistry::new();
        assert!(registry.mark_offline(&[9u8; 16]).is_err());
    }
}
