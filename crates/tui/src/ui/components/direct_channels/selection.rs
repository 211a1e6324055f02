//! The ordered recipient set behind the Direct Messages modal.

use murmur_types::{Effect, RecipientOption, UserProfile};

/// What opening the selected conversation requires from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationRequest {
    /// One recipient: a direct conversation with that user id.
    Direct(String),
    /// Several recipients: a group conversation with the ids in selection order.
    Group(Vec<String>),
}

impl ConversationRequest {
    pub fn into_effect(self) -> Effect {
        match self {
            ConversationRequest::Direct(user_id) => Effect::OpenDirectChannel(user_id),
            ConversationRequest::Group(user_ids) => Effect::OpenGroupChannel(user_ids),
        }
    }
}

/// Location of a channel inside a team.
pub fn channel_path(team_name: &str, channel_name: &str) -> String {
    format!("/{team_name}/channels/{channel_name}")
}

/// Selected recipients in first-insertion order.
///
/// The acting user is never part of the set and each id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientSelection {
    acting_user_id: String,
    users: Vec<UserProfile>,
}

impl RecipientSelection {
    pub fn new(acting_user_id: impl Into<String>) -> Self {
        Self {
            acting_user_id: acting_user_id.into(),
            users: Vec::new(),
        }
    }

    /// Seed the selection with the members of an existing channel.
    pub fn with_members(mut self, members: &[UserProfile]) -> Self {
        self.add_group(members);
        self
    }

    /// Append `user` unless it is the acting user or already selected.
    pub fn add_single(&mut self, user: &UserProfile) -> bool {
        if user.id == self.acting_user_id || self.contains(&user.id) {
            return false;
        }
        self.users.push(user.clone());
        true
    }

    /// Append every group member not yet selected. Returns how many were added.
    pub fn add_group(&mut self, members: &[UserProfile]) -> usize {
        members.iter().filter(|member| self.add_single(member)).count()
    }

    pub fn add_value(&mut self, option: &RecipientOption) -> usize {
        match option {
            RecipientOption::User(user) => usize::from(self.add_single(user)),
            RecipientOption::Group { profiles, .. } => self.add_group(profiles),
        }
    }

    /// Replace the selection with `users`, keeping the set invariants.
    pub fn remove(&mut self, users: Vec<UserProfile>) {
        self.users.clear();
        self.add_group(&users);
    }

    /// The selection minus its last entry; what backspace on an empty search input keeps.
    pub fn without_last(&self) -> Vec<UserProfile> {
        let keep = self.users.len().saturating_sub(1);
        self.users[..keep].to_vec()
    }

    pub fn users(&self) -> &[UserProfile] {
        &self.users
    }

    pub fn ids(&self) -> Vec<String> {
        self.users.iter().map(|user| user.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.users.iter().any(|user| user.id == user_id)
    }

    /// `None` for an empty selection.
    pub fn conversation_request(&self) -> Option<ConversationRequest> {
        match self.users.as_slice() {
            [] => None,
            [only] => Some(ConversationRequest::Direct(only.id.clone())),
            _ => Some(ConversationRequest::Group(self.ids())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_types::Channel;

    fn user(id: &str) -> UserProfile {
        UserProfile::new(id, format!("user-{id}"))
    }

    #[test]
    fn adds_keep_first_insertion_order_without_duplicates() {
        let mut selection = RecipientSelection::new("me");
        assert!(selection.add_single(&user("u2")));
        assert!(!selection.add_single(&user("u2")));
        assert_eq!(selection.add_group(&[user("u1"), user("u2"), user("u3"), user("u1")]), 2);
        assert!(!selection.add_single(&user("me")));
        assert_eq!(selection.ids(), ["u2", "u1", "u3"]);
    }

    #[test]
    fn group_option_merges_members() {
        let mut selection = RecipientSelection::new("me");
        selection.add_single(&user("u3"));
        let group = RecipientOption::Group {
            channel: Channel {
                id: "g1".into(),
                ..Channel::default()
            },
            profiles: vec![user("me"), user("u1"), user("u3")],
        };
        assert_eq!(selection.add_value(&group), 1);
        assert_eq!(selection.add_value(&RecipientOption::User(user("u1"))), 0);
        assert_eq!(selection.ids(), ["u3", "u1"]);
    }

    #[test]
    fn existing_channel_members_seed_the_selection() {
        let selection = RecipientSelection::new("me").with_members(&[user("me"), user("u5")]);
        assert_eq!(selection.ids(), ["u5"]);
    }

    #[test]
    fn remove_replaces_wholesale() {
        let mut selection = RecipientSelection::new("me");
        selection.add_group(&[user("u1"), user("u2"), user("u3")]);
        selection.remove(selection.without_last());
        assert_eq!(selection.ids(), ["u1", "u2"]);
        selection.remove(vec![user("u2"), user("me"), user("u2")]);
        assert_eq!(selection.ids(), ["u2"]);
        selection.remove(Vec::new());
        assert!(selection.without_last().is_empty());
    }

    #[test]
    fn request_kind_follows_selection_size() {
        let mut selection = RecipientSelection::new("me");
        assert_eq!(selection.conversation_request(), None);
        selection.add_single(&user("u1"));
        assert_eq!(selection.conversation_request(), Some(ConversationRequest::Direct("u1".into())));
        selection.add_single(&user("u2"));
        let request = selection.conversation_request().unwrap();
        assert_eq!(request, ConversationRequest::Group(vec!["u1".into(), "u2".into()]));
        assert_eq!(request.into_effect(), Effect::OpenGroupChannel(vec!["u1".into(), "u2".into()]));
    }

    #[test]
    fn channel_path_joins_team_and_channel() {
        assert_eq!(channel_path("team1", "town-square-dm"), "/team1/channels/town-square-dm");
    }
}
