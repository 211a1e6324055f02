//! Shared types for the Murmur client.
//!
//! Directory records (`UserProfile`, `Channel`, ...) are what the server
//! speaks; `Msg`, `Effect` and `ExecOutcome` are the vocabulary the UI uses to
//! describe user intent, side effects, and their results.

mod directory;
mod error;
mod status;

pub use directory::{Channel, ChannelType, DmRestriction, ParseDmRestrictionError, RecipientOption, Team, UserProfile, UserStatus};
pub use error::{ActionError, ActionResult};
pub use status::{StatusKind, StatusMessage};

/// Number of candidate rows displayed per page in the recipient picker.
pub const USERS_PER_PAGE: usize = 50;

/// Result of an asynchronous side effect, joined back into the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// A page of candidate profiles.
    ProfilesPage { page: usize, result: ActionResult<Vec<UserProfile>> },
    /// Total number of users visible to the acting user.
    TotalUsers(ActionResult<u64>),
    /// Presence for a batch of users.
    Statuses(ActionResult<Vec<UserStatus>>),
    /// Members of a group conversation returned by a search.
    GroupMembers {
        channel_id: String,
        result: ActionResult<Vec<UserProfile>>,
    },
    /// Profile and group-conversation search issued for one settled term.
    DirectorySearch {
        request_id: u64,
        term: String,
        profiles: ActionResult<Vec<UserProfile>>,
        groups: ActionResult<Vec<Channel>>,
    },
    /// A direct or group conversation was opened (or failed to open).
    ChannelOpened(ActionResult<Channel>),
    /// Informational line for the log banner.
    Log(String),
}

/// Messages that update application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Periodic UI tick
    Tick,
    /// Terminal resized
    Resize(u16, u16),
    /// Background execution completed with outcome
    ExecCompleted(Box<ExecOutcome>),
    /// The typed search term stopped changing; propagate it to the shared store.
    DirectChannelsSearchSettled(String),
    /// The query delay for a settled term elapsed; issue the directory search.
    DirectChannelsSearchDue(String),
}

/// Side effects requested by state transitions.
///
/// Components never perform I/O themselves; they return effects that the
/// runtime executes and later feeds back as `Msg::ExecCompleted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Display a modal view
    ShowModal(Modal),
    /// Hide any open modal (runs its exit transition)
    CloseModal,
    /// Push a location onto the navigation history
    Navigate(String),
    /// Move keyboard focus to the named element after the current event
    RestoreFocus(String),
    /// Append a line to the log banner
    Log(String),
    /// Fetch a page of profiles, optionally scoped to a team
    LoadProfiles {
        page: usize,
        per_page: usize,
        team_id: Option<String>,
    },
    /// Fetch the total user count
    LoadTotalUsersStats,
    /// Fetch presence for the given users when it is not known yet
    LoadProfilesMissingStatus(Vec<String>),
    /// Fetch presence for the given users unconditionally
    LoadStatusesForProfiles(Vec<String>),
    /// Fetch members for each group conversation
    LoadProfilesForGroupChannels(Vec<Channel>),
    /// Run the profile and group-conversation searches concurrently
    SearchDirectory {
        request_id: u64,
        term: String,
        team_id: Option<String>,
    },
    /// Open (or create) a direct conversation with one user
    OpenDirectChannel(String),
    /// Open (or create) a group conversation with the users, in order
    OpenGroupChannel(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    DirectChannels(DirectChannelsRequest),
}

/// Caller-supplied options for opening the Direct Messages modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectChannelsRequest {
    /// Focus target restored when the modal closes without navigating.
    pub focus_origin: Option<String>,
    /// Members of the channel the modal was opened from, if any.
    pub existing_members: Vec<UserProfile>,
    /// Effects emitted on the exit transition, before navigation.
    pub on_exit: Vec<Effect>,
}

impl DirectChannelsRequest {
    pub fn is_existing_channel(&self) -> bool {
        !self.existing_members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_profile_decodes_server_payload() {
        let json = r#"{
            "id": "u1",
            "username": "alice",
            "first_name": "Alice",
            "last_name": "Liddell",
            "delete_at": 0,
            "locale": "en"
        }"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.full_name(), "Alice Liddell");
        assert!(user.is_active());
    }

    #[test]
    fn request_without_members_is_not_existing_channel() {
        let request = DirectChannelsRequest::default();
        assert!(!request.is_existing_channel());
        let request = DirectChannelsRequest {
            existing_members: vec![UserProfile::new("u1", "alice")],
            ..DirectChannelsRequest::default()
        };
        assert!(request.is_existing_channel());
    }
}
