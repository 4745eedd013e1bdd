//! secirc-daemon: the relay-core daemon process.
//!
//! Single OS process running a Tokio async runtime. Clients communicate
//! with the daemon via JSON-RPC over a Unix socket.

mod commands;
mod config;
mod events;
mod rpc;
mod scheduler;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use secirc_auth::session::SessionDriver;
use secirc_discovery::denylist::Denylist;
use secirc_discovery::pipeline::RateLimiter;
use secirc_presence::{DeliveryManager, PresenceRegistry};
use secirc_ring::membership::FirstRing;
use secirc_storage::contacts::ContactBook;
use secirc_storage::relay_cache::RelayCache;
use secirc_transport::{ConnectionManager, TransportConfig};
use secirc_types::group::{Group, GroupKey};
use secirc_types::trust::TrustScore;
use secirc_types::{GroupId, Hash16};
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info};

use crate::commands::identity::LocalIdentity;
use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    pub config: DaemonConfig,
    pub data_dir: PathBuf,
    pub event_bus: EventBus,
    pub shutdown_tx: broadcast::Sender<()>,

    /// `Some` once the local identity has been created/unlocked for
    /// this process.
    pub identity: RwLock<Option<LocalIdentity>>,
    pub unlocked: RwLock<bool>,
    pub contacts: RwLock<ContactBook>,
    pub auth: RwLock<SessionDriver>,

    pub ring: RwLock<Option<FirstRing>>,
    pub trust_scores: RwLock<HashMap<Hash16, TrustScore>>,

    pub presence: RwLock<PresenceRegistry>,
    pub delivery: RwLock<DeliveryManager>,
    pub transport: ConnectionManager,

    pub decentralized_groups: RwLock<HashMap<GroupId, Group>>,
    pub brokered_keys: RwLock<HashMap<GroupId, GroupKey>>,

    pub denylist: RwLock<Denylist>,
    pub rate_limiter: RwLock<RateLimiter>,
    pub relay_cache: RwLock<RelayCache>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("secirc=info".parse().expect("valid directive")),
        )
        .init();

    info!("secIRC daemon starting");

    // 1. Load config — malformed config is exit code 2.
    let config = match DaemonConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Bad configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    let data_dir = config.data_dir();

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        error!("Cannot create data directory: {}", e);
        return ExitCode::from(1);
    }

    // 2. Load persisted state. A contacts/relay-cache file failing to
    // parse is unrecoverable (exit 1); a present-but-corrupt identity
    // file means the local key material cannot be recovered, which is
    // authentication impossible (exit 3).
    let identity_path = data_dir.join("identity.json");
    if identity_path.exists() {
        if let Err(e) = secirc_storage::identity::IdentityFile::load(&identity_path) {
            error!("Identity file is present but unreadable: {}", e);
            return ExitCode::from(3);
        }
    }

    let contacts = match ContactBook::load(&data_dir.join("contacts.json")) {
        Ok(contacts) => contacts,
        Err(e) => {
            error!("Cannot load contacts: {}", e);
            return ExitCode::from(1);
        }
    };
    let relay_cache = match RelayCache::load(&data_dir.join("relay_cache.json"), config.storage.relay_cache_capacity) {
        Ok(cache) => cache,
        Err(e) => {
            error!("Cannot load relay cache: {}", e);
            return ExitCode::from(1);
        }
    };

    let auth_config = secirc_auth::session::AuthConfig {
        pow_difficulty: config.auth.pow_difficulty,
        challenge_ttl_secs: config.auth.challenge_ttl_secs,
        session_ttl_secs: config.auth.session_ttl_secs,
        timestamp_tolerance_secs: 30,
    };

    let event_bus = EventBus::new(1000);
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    let state = Arc::new(DaemonState {
        config: config.clone(),
        data_dir: data_dir.clone(),
        event_bus,
        shutdown_tx: shutdown_tx.clone(),
        identity: RwLock::new(None),
        unlocked: RwLock::new(false),
        contacts: RwLock::new(contacts),
        auth: RwLock::new(SessionDriver::new(auth_config)),
        ring: RwLock::new(None),
        trust_scores: RwLock::new(HashMap::new()),
        presence: RwLock::new(PresenceRegistry::new()),
        delivery: RwLock::new(DeliveryManager::default()),
        transport: ConnectionManager::new(TransportConfig {
            max_connections: config.network.max_connections as usize,
            ..TransportConfig::default()
        }),
        decentralized_groups: RwLock::new(HashMap::new()),
        brokered_keys: RwLock::new(HashMap::new()),
        denylist: RwLock::new(Denylist::new()),
        rate_limiter: RwLock::new(RateLimiter::new(
            config.network.discovery_rate_limit_window_secs,
            config.network.discovery_rate_limit_max,
        )),
        relay_cache: RwLock::new(relay_cache),
    });

    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());
    info!("Starting JSON-RPC server on {:?}", socket_path);

    state.event_bus.emit(events::Event {
        event_type: "DaemonStarted".to_string(),
        timestamp: now_secs(),
        payload: serde_json::json!({"version": env!("CARGO_PKG_VERSION")}),
    });

    let scheduler_task = tokio::spawn(scheduler::run(state.clone(), shutdown_tx.subscribe()));

    let mut shutdown_rx = shutdown_tx.subscribe();
    let exit_code = tokio::select! {
        result = rpc_server.run() => {
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("RPC server error: {}", e);
                    ExitCode::from(1)
                }
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
            ExitCode::SUCCESS
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            ExitCode::SUCCESS
        }
    };

    let _ = shutdown_tx.send(());
    let _ = scheduler_task.await;

    info!("Daemon shutting down gracefully");
    let _ = std::fs::remove_file(&socket_path);
    info!("Daemon stopped");
    exit_code
}

fn now_secs() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs()
}
