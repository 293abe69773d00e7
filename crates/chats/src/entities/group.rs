use serde::{Deserialize, Serialize};

use crate::types::GroupId;

/// Prefix of the conversation id a group broadcasts on.
pub const GROUP_CONVERSATION_PREFIX: &str = "group_";

/// A named group users can belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

impl Group {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Id of the broadcast conversation shared by all members.
    pub fn conversation_id(&self) -> String {
        format!("{GROUP_CONVERSATION_PREFIX}{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_conversation_id() {
        let group = Group::new("g0", "WTC Connect");
        assert_eq!(group.conversation_id(), "group_g0");
    }
}
