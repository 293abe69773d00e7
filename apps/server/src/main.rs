mod console;

use std::collections::BTreeMap;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use wtc_chats::{ChatStore, Conversation, Group, Message, SessionUser, User};
use wtc_config::load as load_config;
use wtc_runtime::{shutdown_signal, telemetry, ConnectServices};

use crate::console::ConsoleCommand;

#[derive(Parser)]
#[command(name = "wtc-connect")]
#[command(about = "WTC Connect chat store (console by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the seeded store as JSON
    Dump,
    /// Print every message snapshot of a conversation until Ctrl+C
    Watch { conversation_id: String },
    /// Start interactive console (default)
    Console,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Dump => dump_data().await,
        Commands::Watch { conversation_id } => watch_conversation(&conversation_id).await,
        Commands::Console => run_console().await,
    }
}

async fn initialise() -> anyhow::Result<ConnectServices> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;

    ConnectServices::initialise(&config)
        .await
        .context("failed to initialise chat store")
}

#[derive(Serialize)]
struct StoreDump {
    session: SessionUser,
    groups: Vec<Group>,
    users: Vec<DumpedUser>,
    conversations: Vec<Conversation>,
    messages: BTreeMap<String, Vec<Message>>,
}

#[derive(Serialize)]
struct DumpedUser {
    #[serde(flatten)]
    user: User,
    group_id: Option<String>,
}

async fn collect_dump(store: &ChatStore, session: &SessionUser) -> StoreDump {
    let mut users = Vec::new();
    for user in store.users() {
        let group_id = store.user_group_id(&user.id).await;
        users.push(DumpedUser { user, group_id });
    }

    let conversations = store.conversations();
    let mut messages = BTreeMap::new();
    for conversation in &conversations {
        messages.insert(
            conversation.id.clone(),
            store.messages(&conversation.id).await,
        );
    }

    StoreDump {
        session: session.clone(),
        groups: store.groups(),
        users,
        conversations,
        messages,
    }
}

async fn dump_data() -> anyhow::Result<()> {
    let services = initialise().await?;

    info!("dumping chat store");

    let dump = collect_dump(&services.store, &services.session).await;
    let json = serde_json::to_string_pretty(&dump).context("failed to serialise store")?;
    println!("{json}");

    Ok(())
}

async fn watch_conversation(conversation_id: &str) -> anyhow::Result<()> {
    let services = initialise().await?;

    services
        .store
        .authorize_conversation(&services.session, conversation_id, None)
        .await
        .with_context(|| format!("cannot watch {conversation_id}"))?;

    info!(conversation_id, "watching conversation");

    let mut messages = services.store.subscribe_messages(conversation_id).await;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            snapshot = messages.next() => {
                let Some(snapshot) = snapshot else { break };
                println!("--- {conversation_id}: {} messages", snapshot.len());
                for message in snapshot {
                    println!(
                        "  [{}] {}: {}",
                        message.timestamp.format("%H:%M"),
                        message.sender_id,
                        message.content
                    );
                }
            }
        }
    }

    Ok(())
}

async fn run_console() -> anyhow::Result<()> {
    let services = initialise().await?;

    info!(user_id = %services.session.id, "starting interactive console");

    println!("WTC Connect Interactive Console");
    println!("Type commands like '/help', '/conversations', '/groups', '/quit'");
    println!("Use Ctrl+C or '/quit' to exit");
    println!("---");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let Some(command) = ConsoleCommand::parse(&line) else {
            continue;
        };

        let mut stdout = std::io::stdout();
        let flow = console::execute(&services.store, &services.session, command, &mut stdout).await?;
        if flow.is_break() {
            break;
        }
    }

    Ok(())
}
