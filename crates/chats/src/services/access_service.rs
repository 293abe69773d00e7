//! Access service deciding who may open a conversation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::entities::ConversationTarget;
use crate::repositories::{ConversationRepository, GroupRepository};
use crate::types::{ChatError, ChatResult, SessionUser};
use crate::utils::AccessChecker;

pub struct AccessService {
    conversations: Arc<ConversationRepository>,
    groups: Arc<GroupRepository>,
}

impl AccessService {
    pub fn new(conversations: Arc<ConversationRepository>, groups: Arc<GroupRepository>) -> Self {
        Self {
            conversations,
            groups,
        }
    }

    /// Check whether `session` may open `conversation_id`.
    ///
    /// `peer_user_id` may be omitted, in which case the peer is taken from
    /// the conversation summary.
    pub async fn authorize_conversation(
        &self,
        session: &SessionUser,
        conversation_id: &str,
        peer_user_id: Option<&str>,
    ) -> ChatResult<()> {
        let result = match self.resolve_target(conversation_id, peer_user_id) {
            Some(target) => self.check_target(session, &target).await,
            None if session.is_operator() => Ok(()),
            None => Err(ChatError::access_denied(
                "You can only talk to members of your group",
            )),
        };

        match &result {
            Ok(()) => debug!(user_id = %session.id, conversation_id, "conversation access granted"),
            Err(error) => warn!(user_id = %session.id, conversation_id, %error, "conversation access denied"),
        }
        result
    }

    fn resolve_target(
        &self,
        conversation_id: &str,
        peer_user_id: Option<&str>,
    ) -> Option<ConversationTarget> {
        if let Some(target) = ConversationTarget::resolve(conversation_id, peer_user_id) {
            return Some(target);
        }

        let summary = self.conversations.find(conversation_id)?;
        ConversationTarget::resolve(conversation_id, Some(&summary.peer_user.id))
    }

    async fn check_target(&self, session: &SessionUser, target: &ConversationTarget) -> ChatResult<()> {
        let requester_group = self.groups.membership(&session.id).await;

        match target {
            ConversationTarget::Group { group_id } => {
                AccessChecker::can_view_group(session, requester_group.as_deref(), group_id)
            }
            ConversationTarget::Direct { peer_user_id } => {
                let peer_group = self.groups.membership(peer_user_id).await;
                AccessChecker::can_message_peer(
                    session,
                    requester_group.as_deref(),
                    peer_group.as_deref(),
                )
            }
        }
    }
}
