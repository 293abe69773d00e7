use std::io::Write;
use std::ops::ControlFlow;

use anyhow::Result;
use wtc_chats::{ChatStore, SessionUser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Conversations,
    Messages {
        conversation_id: String,
    },
    Send {
        conversation_id: String,
        content: String,
    },
    Groups,
    Members {
        group_id: String,
    },
    Add {
        group_id: String,
        email: String,
    },
    Remove {
        group_id: String,
        user_id: String,
    },
    Search {
        query: String,
        group_id: Option<String>,
    },
    Open {
        conversation_id: String,
        peer_user_id: Option<String>,
    },
    Quit,
    Usage(&'static str),
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one console line; blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        let command = match name {
            "/quit" | "/exit" | "/q" => Self::Quit,
            "/help" | "/h" => Self::Help,
            "/conversations" | "/c" => Self::Conversations,
            "/groups" | "/g" => Self::Groups,
            "/messages" | "/m" => match args.next() {
                Some(conversation_id) => Self::Messages {
                    conversation_id: conversation_id.to_string(),
                },
                None => Self::Usage("/messages <conversation>"),
            },
            "/send" | "/s" => match rest.split_once(char::is_whitespace) {
                Some((conversation_id, content)) if !content.trim().is_empty() => Self::Send {
                    conversation_id: conversation_id.to_string(),
                    content: content.trim().to_string(),
                },
                _ => Self::Usage("/send <conversation> <text>"),
            },
            "/members" => match args.next() {
                Some(group_id) => Self::Members {
                    group_id: group_id.to_string(),
                },
                None => Self::Usage("/members <group>"),
            },
            "/add" => match (args.next(), args.next()) {
                (Some(group_id), Some(email)) => Self::Add {
                    group_id: group_id.to_string(),
                    email: email.to_string(),
                },
                _ => Self::Usage("/add <group> <email>"),
            },
            "/remove" => match (args.next(), args.next()) {
                (Some(group_id), Some(user_id)) => Self::Remove {
                    group_id: group_id.to_string(),
                    user_id: user_id.to_string(),
                },
                _ => Self::Usage("/remove <group> <user>"),
            },
            "/search" => Self::Search {
                query: args.next().unwrap_or_default().to_string(),
                group_id: args.next().map(str::to_string),
            },
            "/open" => match args.next() {
                Some(conversation_id) => Self::Open {
                    conversation_id: conversation_id.to_string(),
                    peer_user_id: args.next().map(str::to_string),
                },
                None => Self::Usage("/open <conversation> [peer]"),
            },
            _ => Self::Unknown(line.to_string()),
        };

        Some(command)
    }
}

pub fn print_help(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Available commands:")?;
    writeln!(out, "  /help, /h                   - Show this help")?;
    writeln!(out, "  /conversations, /c          - List conversations")?;
    writeln!(out, "  /messages, /m <cid>         - Show messages of a conversation")?;
    writeln!(out, "  /send, /s <cid> <text>      - Send a message")?;
    writeln!(out, "  /groups, /g                 - List groups")?;
    writeln!(out, "  /members <gid>              - List members of a group")?;
    writeln!(out, "  /add <gid> <email>          - Add a user to a group by email")?;
    writeln!(out, "  /remove <gid> <uid>         - Remove a user from a group")?;
    writeln!(out, "  /search <query> [gid]       - Search users")?;
    writeln!(out, "  /open <cid> [peer]          - Check access to a conversation")?;
    writeln!(out, "  /quit, /exit, /q            - Exit console")?;
    Ok(())
}

/// Run one command against the store, writing its output to `out`.
pub async fn execute(
    store: &ChatStore,
    session: &SessionUser,
    command: ConsoleCommand,
    out: &mut impl Write,
) -> Result<ControlFlow<()>> {
    match command {
        ConsoleCommand::Quit => {
            writeln!(out, "Goodbye!")?;
            return Ok(ControlFlow::Break(()));
        }
        ConsoleCommand::Help => print_help(out)?,
        ConsoleCommand::Conversations => {
            let conversations = store.conversations();
            if conversations.is_empty() {
                writeln!(out, "No conversations found")?;
            }
            for conversation in conversations {
                let kind = if conversation.is_group() { "group" } else { "direct" };
                writeln!(
                    out,
                    "  {}: {} ({kind}) [{}] {} ({} unread)",
                    conversation.id,
                    conversation.peer_user.name,
                    conversation.last_timestamp.format("%H:%M"),
                    conversation.last_message,
                    conversation.unread_count
                )?;
            }
        }
        ConsoleCommand::Messages { conversation_id } => {
            if let Err(error) = store
                .authorize_conversation(session, &conversation_id, None)
                .await
            {
                writeln!(out, "{error}")?;
                return Ok(ControlFlow::Continue(()));
            }

            let messages = store.messages(&conversation_id).await;
            if messages.is_empty() {
                writeln!(out, "No messages in {conversation_id}")?;
            }
            for message in messages {
                let sender = store
                    .user_by_id(&message.sender_id)
                    .map(|user| user.name)
                    .unwrap_or(message.sender_id);
                writeln!(
                    out,
                    "  [{}] {}: {}",
                    message.timestamp.format("%H:%M"),
                    sender,
                    message.content
                )?;
            }
        }
        ConsoleCommand::Send {
            conversation_id,
            content,
        } => {
            if let Err(error) = store
                .authorize_conversation(session, &conversation_id, None)
                .await
            {
                writeln!(out, "{error}")?;
                return Ok(ControlFlow::Continue(()));
            }

            let message = store
                .send_message(&conversation_id, &content, &session.id)
                .await?;
            writeln!(out, "Sent {} to {}", message.id, conversation_id)?;
        }
        ConsoleCommand::Groups => {
            for group in store.groups() {
                let members = store.group_members(&group.id).await;
                writeln!(
                    out,
                    "  {}: {} ({} members, chat {})",
                    group.id,
                    group.name,
                    members.len(),
                    group.conversation_id()
                )?;
            }
        }
        ConsoleCommand::Members { group_id } => {
            let members = store.group_members(&group_id).await;
            if members.is_empty() {
                writeln!(out, "No members in {group_id}")?;
            }
            for member in members {
                writeln!(
                    out,
                    "  {}: {} <{}>",
                    member.id,
                    member.name,
                    member.email.as_deref().unwrap_or("no email")
                )?;
            }
        }
        ConsoleCommand::Add { group_id, email } => {
            match store.add_user_to_group_by_email(&group_id, &email).await {
                Ok(user) => writeln!(out, "Added {} ({}) to {}", user.name, user.id, group_id)?,
                Err(error) => writeln!(out, "{error}")?,
            }
        }
        ConsoleCommand::Remove { group_id, user_id } => {
            match store.remove_user_from_group(&group_id, &user_id).await {
                Ok(()) => writeln!(out, "Removed {user_id} from {group_id}")?,
                Err(error) => writeln!(out, "{error}")?,
            }
        }
        ConsoleCommand::Search { query, group_id } => {
            let users = store.search_users(&query, group_id.as_deref()).await;
            if users.is_empty() {
                writeln!(out, "No users match '{query}'")?;
            }
            for user in users {
                let group = store
                    .user_group_id(&user.id)
                    .await
                    .unwrap_or_else(|| "-".to_string());
                writeln!(out, "  {}: {} [{}]", user.id, user.name, group)?;
            }
        }
        ConsoleCommand::Open {
            conversation_id,
            peer_user_id,
        } => {
            match store
                .authorize_conversation(session, &conversation_id, peer_user_id.as_deref())
                .await
            {
                Ok(()) => writeln!(out, "Access granted to {conversation_id}")?,
                Err(error) => writeln!(out, "{error}")?,
            }
        }
        ConsoleCommand::Usage(usage) => writeln!(out, "Usage: {usage}")?,
        ConsoleCommand::Unknown(command) => {
            writeln!(out, "Unknown command: {command}")?;
            writeln!(out, "Type '/help' for available commands")?;
        }
    }

    Ok(ControlFlow::Continue(()))
}
