use anyhow::{bail, Result};
use tracing::{info, warn};
use wtc_chats::{ChatStore, SessionUser};
use wtc_config::AppConfig;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// The seeded store together with the identity it was built for.
#[derive(Clone)]
pub struct ConnectServices {
    pub store: ChatStore,
    pub session: SessionUser,
}

impl ConnectServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        if config.session.user_id.trim().is_empty() {
            bail!("session.user_id must not be empty");
        }
        if config.seed.default_group_id.trim().is_empty() {
            bail!("seed.default_group_id must not be empty");
        }
        if !config
            .seed
            .groups
            .iter()
            .any(|group| group.id == config.seed.default_group_id)
        {
            warn!(
                default_group_id = %config.seed.default_group_id,
                "default group is not part of the seeded groups"
            );
        }

        let session = SessionUser::from(&config.session);
        let store = ChatStore::from_config(config);

        let group_id = store.effective_group_id(&session.id).await;
        info!(
            user_id = %session.id,
            role = ?session.role,
            group_id = %group_id,
            conversations = store.conversations().len(),
            "chat store ready"
        );

        Ok(Self { store, session })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
