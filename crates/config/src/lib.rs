use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "wtc-connect.toml",
    "config/wtc-connect.toml",
    "crates/config/wtc-connect.toml",
    "../wtc-connect.toml",
    "../config/wtc-connect.toml",
    "../crates/config/wtc-connect.toml",
];

/// Group id every user falls back to when no membership is assigned.
pub const DEFAULT_GROUP_ID: &str = "g0";

/// Sender id placeholder in seed messages that resolves to the session user.
pub const SESSION_SENDER: &str = "$session";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Identity handed over by the authentication service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: SessionRole,
}

impl SessionConfig {
    fn default_user_id() -> String {
        "me".to_string()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: Self::default_user_id(),
            email: None,
            role: SessionRole::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    #[default]
    Client,
    Operator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "EventsConfig::default_capacity")]
    pub capacity: usize,
}

impl EventsConfig {
    const fn default_capacity() -> usize {
        64
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

/// Data the in-memory chat store is initialised with.
///
/// The defaults reproduce the demo data set shipped with the app: three
/// groups, five users in the default group, three direct conversations and
/// the default group's broadcast conversation.
///
/// ```
/// use wtc_config::SeedConfig;
///
/// let seed = SeedConfig::default();
/// assert_eq!(seed.default_group_id, "g0");
/// assert_eq!(seed.groups.len(), 3);
/// assert!(seed.users.iter().all(|user| user.group_id.as_deref() == Some("g0")));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "SeedConfig::default_group_id")]
    pub default_group_id: String,
    #[serde(default = "SeedConfig::default_groups")]
    pub groups: Vec<SeedGroup>,
    #[serde(default = "SeedConfig::default_users")]
    pub users: Vec<SeedUser>,
    #[serde(default = "SeedConfig::default_conversations")]
    pub conversations: Vec<SeedConversation>,
    #[serde(default = "SeedConfig::default_messages")]
    pub messages: Vec<SeedMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Conversation summary row. A `peer_user_id` of the form `group:<id>`
/// stands for the group's placeholder peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedConversation {
    pub id: String,
    pub peer_user_id: String,
    pub last_message: String,
    #[serde(default)]
    pub minutes_ago: i64,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(default)]
    pub minutes_ago: i64,
}

impl SeedConfig {
    /// An empty data set that only names the default group.
    pub fn empty() -> Self {
        Self {
            default_group_id: Self::default_group_id(),
            groups: Vec::new(),
            users: Vec::new(),
            conversations: Vec::new(),
            messages: Vec::new(),
        }
    }

    fn default_group_id() -> String {
        DEFAULT_GROUP_ID.to_string()
    }

    fn default_groups() -> Vec<SeedGroup> {
        [("g0", "WTC Connect"), ("g1", "Comercial"), ("g2", "Eventos")]
            .into_iter()
            .map(|(id, name)| SeedGroup {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    fn default_users() -> Vec<SeedUser> {
        [
            ("me", "Eu (local)", None),
            ("u1", "Leonardo", Some("leo@example.com")),
            ("u2", "Raul", Some("raul@example.com")),
            ("u3", "Cynthia", Some("cynthia@example.com")),
            ("u4", "Ana", Some("ana@example.com")),
        ]
        .into_iter()
        .map(|(id, name, email)| SeedUser {
            id: id.to_string(),
            name: name.to_string(),
            email: email.map(str::to_string),
            avatar_url: None,
            group_id: Some(DEFAULT_GROUP_ID.to_string()),
        })
        .collect()
    }

    fn default_conversations() -> Vec<SeedConversation> {
        [
            ("c1", "u1", "Podemos conversar?", 60, 1),
            ("c2", "u2", "Preciso da sua ajuda", 30, 0),
            ("c3", "u3", "Reunião amanhã às 11:00", 5, 2),
            ("group_g0", "group:g0", "Bem-vindo ao grupo WTC Connect", 0, 0),
        ]
        .into_iter()
        .map(
            |(id, peer, last_message, minutes_ago, unread_count)| SeedConversation {
                id: id.to_string(),
                peer_user_id: peer.to_string(),
                last_message: last_message.to_string(),
                minutes_ago,
                unread_count,
            },
        )
        .collect()
    }

    fn default_messages() -> Vec<SeedMessage> {
        [
            ("m1", "c1", "u1", "Oi", 60),
            ("m2", "c1", SESSION_SENDER, "Tudo bem?", 50),
            ("m3", "c2", "u2", "Olá, pode me ajudar?", 30),
            ("m4", "c3", "u3", "Agenda enviada", 10),
            ("gm1", "group_g0", "u1", "Bem-vindos ao WTC Connect!", 60),
            ("gm2", "group_g0", "u3", "Olá a todos!", 30),
        ]
        .into_iter()
        .map(
            |(id, conversation_id, sender_id, content, minutes_ago)| SeedMessage {
                id: id.to_string(),
                conversation_id: conversation_id.to_string(),
                sender_id: sender_id.to_string(),
                content: content.to_string(),
                minutes_ago,
            },
        )
        .collect()
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            default_group_id: Self::default_group_id(),
            groups: Self::default_groups(),
            users: Self::default_users(),
            conversations: Self::default_conversations(),
            messages: Self::default_messages(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use wtc_config::load;
///
/// std::env::remove_var("WTC_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.session.user_id.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let capacity = i64::try_from(defaults.events.capacity).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("session.user_id", defaults.session.user_id.clone())
        .context("invalid default for session.user_id")?
        .set_default("session.role", "client")
        .context("invalid default for session.role")?
        .set_default("seed.default_group_id", defaults.seed.default_group_id.clone())
        .context("invalid default for seed.default_group_id")?
        .set_default("events.capacity", capacity)
        .context("invalid default for events.capacity")?;

    let environment_overrides = config::Environment::with_prefix("WTC").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("WTC_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via WTC_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.events.capacity == 0 {
        config.events.capacity = EventsConfig::default_capacity();
    }

    debug!(?config, "loaded application configuration");
    Ok(config)
}
