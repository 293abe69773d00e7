//! Permission checking utilities.

use crate::types::{ChatError, ChatResult, SessionUser};

/// Decides whether a caller may open a conversation.
///
/// Group ids passed in here are real memberships; an unassigned user is
/// `None` and never matches anything.
pub struct AccessChecker;

impl AccessChecker {
    /// Check if the caller can view a group's broadcast conversation
    pub fn can_view_group(
        session: &SessionUser,
        requester_group: Option<&str>,
        group_id: &str,
    ) -> ChatResult<()> {
        if session.is_operator() {
            return Ok(());
        }

        if requester_group != Some(group_id) {
            return Err(ChatError::access_denied(
                "You are not allowed to view this group's chat",
            ));
        }
        Ok(())
    }

    /// Check if the caller can talk to a peer in a 1:1 conversation
    pub fn can_message_peer(
        session: &SessionUser,
        requester_group: Option<&str>,
        peer_group: Option<&str>,
    ) -> ChatResult<()> {
        if session.is_operator() {
            return Ok(());
        }

        match (requester_group, peer_group) {
            (Some(own), Some(peer)) if own == peer => Ok(()),
            _ => Err(ChatError::access_denied(
                "You can only talk to members of your group",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_view_group() {
        let client = SessionUser::client("u1");
        let operator = SessionUser::operator("op");

        assert!(AccessChecker::can_view_group(&client, Some("g0"), "g0").is_ok());
        assert!(AccessChecker::can_view_group(&client, Some("g1"), "g0").is_err());
        assert!(AccessChecker::can_view_group(&client, None, "g0").is_err());

        assert!(AccessChecker::can_view_group(&operator, None, "g0").is_ok());
        assert!(AccessChecker::can_view_group(&operator, Some("g1"), "g0").is_ok());
    }

    #[test]
    fn test_can_message_peer() {
        let client = SessionUser::client("u1");
        let operator = SessionUser::operator("op");

        assert!(AccessChecker::can_message_peer(&client, Some("g0"), Some("g0")).is_ok());
        assert!(AccessChecker::can_message_peer(&client, Some("g0"), Some("g1")).is_err());
        assert!(AccessChecker::can_message_peer(&client, None, Some("g0")).is_err());
        assert!(AccessChecker::can_message_peer(&client, Some("g0"), None).is_err());
        assert!(AccessChecker::can_message_peer(&client, None, None).is_err());

        assert!(AccessChecker::can_message_peer(&operator, None, None).is_ok());
    }

    #[test]
    fn test_denial_reason() {
        let error = AccessChecker::can_view_group(&SessionUser::client("u1"), None, "g2")
            .unwrap_err();
        assert!(matches!(error, ChatError::AccessDenied { .. }));
    }
}
