//! Application state

use std::sync::Arc;

use tokio::sync::mpsc;

use shared::models::ReservationSnapshot;

use crate::admission::AdmissionController;
use crate::auth::RateLimiter;
use crate::core::Config;
use crate::handoff::TokenHandoff;
use crate::identity::IdentityBinder;
use crate::notify::{
    self, EmailSender, LineMessagingClient, LinePusher, LogEmailSender, NotificationWorker,
    SesEmailSender,
};
use crate::slots::{CapacityPolicy, SlotTable};
use crate::store::{
    EmbeddedStore, MemoryTokenStore, PgStore, RedisTokenStore, Stores, TokenStore,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub policy: Arc<CapacityPolicy>,
    pub stores: Stores,
    pub handoff: TokenHandoff,
    pub admission: AdmissionController,
    pub binder: IdentityBinder,
    /// Rate limiter for login and submission routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Wire the components over already-opened stores
    ///
    /// Returns the receiving end of the notification queue; hand it to a
    /// [`NotificationWorker`].
    pub fn build(
        config: Config,
        policy: CapacityPolicy,
        stores: Stores,
        tokens: Arc<dyn TokenStore>,
    ) -> (Self, mpsc::Receiver<ReservationSnapshot>) {
        let policy = Arc::new(policy);
        let handoff = TokenHandoff::new(tokens, config.token_ttl);
        let (dispatcher, rx) = notify::channel(notify::QUEUE_CAPACITY);

        let admission = AdmissionController::new(
            policy.clone(),
            &stores,
            handoff.clone(),
            dispatcher,
            config.timezone,
        )
        .with_deny_list(config.phone_deny_list.clone());
        let binder = IdentityBinder::new(
            handoff.clone(),
            stores.ledger.clone(),
            stores.identities.clone(),
        );

        let state = Self {
            config: Arc::new(config),
            policy,
            stores,
            handoff,
            admission,
            binder,
            rate_limiter: RateLimiter::new(),
        };
        (state, rx)
    }

    /// Open the configured backends and build the state plus its worker
    pub async fn initialize(config: &Config) -> Result<(Self, NotificationWorker), BoxError> {
        let table = SlotTable::load(config.slot_table_path.as_deref())?;
        if config.slot_table_path.is_none() {
            tracing::info!("Using built-in slot table");
        }

        let stores = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url).await?;
                tracing::info!("Connected to PostgreSQL");
                Stores::postgres(store)
            }
            None => {
                std::fs::create_dir_all(&config.work_dir)?;
                let path = config.embedded_db_path();
                let store = EmbeddedStore::open(&path)?;
                tracing::info!(path = %path.display(), "Opened embedded store");
                Stores::embedded(store)
            }
        };

        let tokens: Arc<dyn TokenStore> = match &config.redis_url {
            Some(url) => {
                let store = RedisTokenStore::connect(url).await?;
                tracing::info!("Connected to Redis for handoff tokens");
                Arc::new(store)
            }
            None => Arc::new(MemoryTokenStore::new()),
        };

        let email: Arc<dyn EmailSender> = if config.ses_enabled {
            Arc::new(SesEmailSender::from_env(config.ses_from_email.clone()).await)
        } else {
            Arc::new(LogEmailSender)
        };
        let line: Option<Arc<dyn LinePusher>> = config.line_channel_token.as_ref().map(|token| {
            Arc::new(LineMessagingClient::new(reqwest::Client::new(), token.clone()))
                as Arc<dyn LinePusher>
        });

        let identities = stores.identities.clone();
        let (state, rx) = Self::build(config.clone(), CapacityPolicy::new(table), stores, tokens);
        let worker = NotificationWorker::new(rx, email, line, identities);
        Ok((state, worker))
    }
}
