use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ASSISTANT_COLOR, DEFAULT_ASSISTANT_DESCRIPTION, DEFAULT_ASSISTANT_INITIALS,
    DEFAULT_ASSISTANT_NAME,
};
use crate::models::task::double_option;

/// How the assistant is presented in the sidebar and heartbeat banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantProfile {
    pub name: String,
    pub initials: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub description: String,
    pub color: String,
}

impl Default for AssistantProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_ASSISTANT_NAME.to_string(),
            initials: DEFAULT_ASSISTANT_INITIALS.to_string(),
            avatar: None,
            description: DEFAULT_ASSISTANT_DESCRIPTION.to_string(),
            color: DEFAULT_ASSISTANT_COLOR.to_string(),
        }
    }
}

impl AssistantProfile {
    /// Shallow merge: present fields overwrite, absent ones are kept
    pub fn merge(&mut self, patch: ProfilePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(initials) = patch.initials {
            self.initials = initials;
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = avatar;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    /// `Some(None)` removes the avatar
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub avatar: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
