//! Serve command implementation

use crate::activity::TracingActivityLog;
use crate::api::{create_router, AppState};
use crate::assignment::Orchestrator;
use crate::cli::ServeArgs;
use crate::config::{LogFormat, RotorConfig};
use crate::jobs::JobContext;
use crate::notify::LogSender;
use crate::pool::PoolRegistry;
use crate::rotation::Selector;
use crate::scheduler::{Clock, Scheduler, SystemClock};
use crate::settings::ConfigSettings;
use crate::store::{Agent, EntityStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<RotorConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        RotorConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        RotorConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_jobs {
        config.jobs.no_activity_rotation.enabled = false;
        config.jobs.no_answer_recycle.enabled = false;
        config.jobs.not_interested_recycle.enabled = false;
        config.jobs.fresh_lead_demotion.enabled = false;
        config.jobs.call_reminders.enabled = false;
        config.jobs.daily_digest.enabled = false;
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Seed the store and rotation pools from configuration.
pub async fn seed_from_config(
    config: &RotorConfig,
    store: &MemoryStore,
    pool: &PoolRegistry,
) -> Result<(), Box<dyn std::error::Error>> {
    for seed in &config.agents {
        let mut agent = Agent::new(seed.id.clone(), seed.name.clone());
        agent.active = seed.active;
        agent.available = seed.available;
        agent.excluded = seed.excluded;
        store.upsert_agent(agent).await?;
        tracing::info!(agent_id = %seed.id, "Loaded agent from config");
    }

    for source in &config.sources {
        for agent_id in &source.agents {
            pool.add_member(&source.id, agent_id)?;
        }
        tracing::info!(
            source_id = %source.id,
            members = source.agents.len(),
            "Loaded rotation pool from config"
        );
    }

    Ok(())
}

/// Wire the engine: store, selector, orchestrator, scheduler, admin state.
pub async fn build_engine(
    config: RotorConfig,
) -> Result<(Arc<AppState>, Arc<Scheduler>), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let pool = Arc::new(PoolRegistry::new());
    seed_from_config(&config, &store, &pool).await?;

    let clock = Arc::new(SystemClock) as Arc<dyn Clock>;
    let settings = Arc::new(ConfigSettings::new(
        config.settings.clone(),
        config.office_hours.clone(),
        clock.clone(),
    ));
    let selector = Arc::new(Selector::new(
        pool.clone(),
        store.clone() as Arc<dyn EntityStore>,
    ));
    let activity = Arc::new(TracingActivityLog);
    let notifier = Arc::new(LogSender);
    let orchestrator = Arc::new(
        Orchestrator::new(
            store.clone() as Arc<dyn EntityStore>,
            selector,
            activity.clone(),
            notifier.clone(),
            clock.clone(),
        )
        .with_notify_timeout(Duration::from_secs(config.rotation.notify_timeout_seconds)),
    );

    let ctx = Arc::new(JobContext {
        store: store.clone() as Arc<dyn EntityStore>,
        orchestrator,
        settings: settings.clone(),
        activity,
        notifier,
        clock,
        config: config.rotation.clone(),
    });
    let scheduler = Arc::new(Scheduler::with_default_jobs(ctx, settings, &config.jobs));

    let state = Arc::new(AppState::new(
        pool,
        store as Arc<dyn EntityStore>,
        scheduler.clone(),
        Arc::new(config),
    ));
    Ok((state, scheduler))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;

    init_tracing(&config.logging)?;

    tracing::info!("Starting rotation engine");
    tracing::debug!(?config, "Loaded configuration");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let (state, scheduler) = build_engine(config).await?;
    let app = create_router(Arc::clone(&state));

    let cancel_token = CancellationToken::new();
    let job_handles = scheduler.start(cancel_token.clone());
    tracing::info!(jobs = job_handles.len(), "Job loops started");

    tracing::info!(addr = %addr, "Admin API listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    tracing::info!("Waiting for job loops to stop");
    for handle in job_handles {
        handle.await?;
    }

    tracing::info!("Rotation engine stopped");
    Ok(())
}
