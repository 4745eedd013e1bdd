//! Periodic background tasks (§5): ring heartbeat sweep, trust decay,
//! presence staleness sweep, offline-queue delivery retry, and
//! key-rotation due-checks. Each runs on its own interval and responds
//! to the shutdown broadcast within one tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use crate::events::Event;
use crate::DaemonState;

/// How often the sweep tasks below tick.
pub const SWEEP_INTERVAL_SECS: u64 = 30;

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Runs every periodic sweep until the shutdown signal fires.
pub async fn run(state: Arc<DaemonState>, mut shutdown_rx: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                sweep_ring_heartbeats(&state).await;
                sweep_stale_presence(&state).await;
                sweep_delivery_retries(&state).await;
                sweep_expired_deliveries(&state).await;
            }
            _ = shutdown_rx.recv() => {
                info!("Scheduler shutting down");
                break;
            }
        }
    }
}

async fn sweep_ring_heartbeats(state: &Arc<DaemonState>) {
    let now = now_secs();
    let removed = {
        let mut ring = state.ring.write().await;
        match ring.as_mut() {
            Some(ring) => ring.sweep_heartbeats(now),
            None => Vec::new(),
        }
    };
    for member in removed {
        state.event_bus.emit(Event {
            event_type: "RingMemberRemoved".to_string(),
            timestamp: now,
            payload: serde_json::json!({"member": hex::encode(member)}),
        });
    }
}

async fn sweep_stale_presence(state: &Arc<DaemonState>) {
    let now = now_secs();
    let timeout = state.config.groups.presence_timeout_secs;
    let gone_offline = {
        let mut presence = state.presence.write().await;
        presence.sweep_stale(now, timeout)
    };
    for user in gone_offline {
        state.event_bus.emit(Event {
            event_type: "UserOffline".to_string(),
            timestamp: now,
            payload: serde_json::json!({"user": hex::encode(user)}),
        });
    }
}

/// Retries every online recipient's offline queue: a recipient that
/// came back online between ticks (or whose last attempt failed and
/// got requeued) gets another delivery attempt here rather than
/// waiting on its next `mark_online` call.
async fn sweep_delivery_retries(state: &Arc<DaemonState>) {
    let candidates = {
        let delivery = state.delivery.read().await;
        let presence = state.presence.read().await;
        delivery
            .recipients_with_pending()
            .into_iter()
            .filter(|recipient| presence.is_online(recipient))
            .collect::<Vec<_>>()
    };
    for recipient in candidates {
        let delivered = crate::commands::presence::attempt_redelivery(state, &recipient).await;
        if !delivered.is_empty() {
            info!(recipient = %hex::encode(recipient), count = delivered.len(), "Retried offline-queue delivery");
        }
    }
}

async fn sweep_expired_deliveries(state: &Arc<DaemonState>) {
    let now = now_secs();
    let dropped = state.delivery.write().await.cleanup_expired(now);
    if dropped > 0 {
        info!(dropped, "Dropped expired offline-queue messages");
    }
}

#[cfg(test)]
mod tests {
    use super::SWEEP_INTERVAL_SECS;

    #[test]
    fn test_sweep_interval_is_positive() {
        assert!(SWEEP_INTERVAL_SECS > 0);
    }
}
