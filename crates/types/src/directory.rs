//! Directory records exchanged with the chat server: users, presence,
//! teams and channels, plus the option type shown by the recipient picker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user account as returned by the directory endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    /// Milliseconds since epoch when the account was deactivated, `0` when active.
    #[serde(default)]
    pub delete_at: i64,
    #[serde(default)]
    pub is_bot: bool,
}

impl UserProfile {
    /// Convenience constructor used by demo data and tests.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// "First Last", trimmed; empty when neither name is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Label rendered in lists: `@username - Full Name (nickname)`.
    pub fn display_label(&self) -> String {
        let mut label = format!("@{}", self.username);
        let full_name = self.full_name();
        if !full_name.is_empty() {
            label.push_str(" - ");
            label.push_str(&full_name);
        }
        if !self.nickname.is_empty() {
            label.push_str(&format!(" ({})", self.nickname));
        }
        label
    }

    pub fn is_active(&self) -> bool {
        self.delete_at == 0
    }
}

/// Presence for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatus {
    pub user_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// Channel visibility as encoded by the server (`O`, `P`, `D`, `G`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub last_post_at: i64,
}

/// A row in the recipient picker: either one user or an existing group
/// conversation whose members can be merged into the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientOption {
    User(UserProfile),
    Group { channel: Channel, profiles: Vec<UserProfile> },
}

impl RecipientOption {
    /// User id for single users, channel id for groups.
    pub fn id(&self) -> &str {
        match self {
            RecipientOption::User(user) => &user.id,
            RecipientOption::Group { channel, .. } => &channel.id,
        }
    }

    pub fn label(&self) -> String {
        match self {
            RecipientOption::User(user) => user.display_label(),
            RecipientOption::Group { channel, profiles } => {
                if !channel.display_name.is_empty() {
                    return channel.display_name.clone();
                }
                profiles.iter().map(|p| p.username.as_str()).collect::<Vec<_>>().join(", ")
            }
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, RecipientOption::Group { .. })
    }
}

/// How direct messages are restricted on the server (`RestrictDirectMessage`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmRestriction {
    /// Anyone on the server can be messaged.
    #[default]
    Any,
    /// Only members of the current team can be messaged.
    Team,
}

impl DmRestriction {
    /// Team scope to apply to directory queries; `None` means unscoped.
    pub fn team_scope<'a>(&self, team_id: &'a str) -> Option<&'a str> {
        match self {
            DmRestriction::Any => None,
            DmRestriction::Team => Some(team_id),
        }
    }
}

impl fmt::Display for DmRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DmRestriction::Any => f.write_str("any"),
            DmRestriction::Team => f.write_str("team"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direct message restriction '{0}', expected 'any' or 'team'")]
pub struct ParseDmRestrictionError(pub String);

impl FromStr for DmRestriction {
    type Err = ParseDmRestrictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(DmRestriction::Any),
            "team" => Ok(DmRestriction::Team),
            other => Err(ParseDmRestrictionError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_label_includes_names_when_present() {
        let mut user = UserProfile::new("u1", "alice");
        assert_eq!(user.display_label(), "@alice");
        user.first_name = "Alice".into();
        user.last_name = "Liddell".into();
        user.nickname = "al".into();
        assert_eq!(user.display_label(), "@alice - Alice Liddell (al)");
    }

    #[test]
    fn channel_type_uses_server_letters() {
        let channel: Channel = serde_json::from_str(r#"{"id":"c1","name":"a__b","type":"G"}"#).unwrap();
        assert_eq!(channel.channel_type, ChannelType::Group);
        assert_eq!(serde_json::to_value(ChannelType::Direct).unwrap(), "D");
    }

    #[test]
    fn restriction_parses_case_insensitively() {
        assert_eq!("ANY".parse::<DmRestriction>(), Ok(DmRestriction::Any));
        assert_eq!(" team ".parse::<DmRestriction>(), Ok(DmRestriction::Team));
        assert!("everyone".parse::<DmRestriction>().is_err());
        assert_eq!(DmRestriction::Any.team_scope("t1"), None);
        assert_eq!(DmRestriction::Team.team_scope("t1"), Some("t1"));
    }

    #[test]
    fn group_label_falls_back_to_usernames() {
        let option = RecipientOption::Group {
            channel: Channel {
                id: "g1".into(),
                ..Channel::default()
            },
            profiles: vec![UserProfile::new("u1", "alice"), UserProfile::new("u2", "bob")],
        };
        assert_eq!(option.id(), "g1");
        assert_eq!(option.label(), "alice, bob");
        assert!(option.is_group());
    }
}
