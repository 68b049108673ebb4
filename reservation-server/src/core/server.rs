//! Server lifecycle
//!
//! Opens the backends, registers background tasks, serves HTTP until
//! Ctrl-C, then stops the tasks.

use std::net::SocketAddr;
use std::time::Duration;

use crate::api;
use crate::core::{AppState, BackgroundTasks, Config, TaskKind};
use crate::utils::time::{format_date, today_in};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const SLOT_PURGE_INTERVAL: Duration = Duration::from_secs(3600);
const TOKEN_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<(), BoxError> {
        let (state, worker) = AppState::initialize(&self.config).await?;

        let mut tasks = BackgroundTasks::new();
        let shutdown_token = tasks.shutdown_token();
        tasks.spawn(
            "notification_worker",
            TaskKind::Worker,
            worker.run(shutdown_token),
        );
        register_periodic(&mut tasks, &state);
        tasks.log_summary();

        let app = api::create_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            env = %self.config.environment,
            store = state.stores.backend,
            tokens = state.handoff.backend_name(),
            "Reservation server listening on {addr}"
        );

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        tasks.check_health();
        tasks.shutdown().await;
        served?;
        Ok(())
    }
}

fn register_periodic(tasks: &mut BackgroundTasks, state: &AppState) {
    let slots = state.stores.slots.clone();
    let tz = state.config.timezone;
    tasks.spawn_periodic("slot_purge", SLOT_PURGE_INTERVAL, move || {
        let slots = slots.clone();
        async move {
            let today = format_date(today_in(tz));
            match slots.purge_before(&today).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(before = %today, removed, "Purged past slot counters"),
                Err(e) => tracing::warn!(error = %e, "Slot counter purge failed"),
            }
        }
    });

    if state.handoff.backend_name() == "memory" {
        let handoff = state.handoff.clone();
        tasks.spawn_periodic("token_sweep", TOKEN_SWEEP_INTERVAL, move || {
            let handoff = handoff.clone();
            async move {
                let removed = handoff.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired handoff tokens");
                }
            }
        });
    }

    let limiter = state.rate_limiter.clone();
    tasks.spawn_periodic("rate_limit_cleanup", RATE_LIMIT_CLEANUP_INTERVAL, move || {
        let limiter = limiter.clone();
        async move {
            limiter.cleanup().await;
        }
    });
}
