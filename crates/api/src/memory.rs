//! In-memory directory used by `--demo` and by tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;
use murmur_types::{ActionError, ActionResult, Channel, ChannelType, DmRestriction, Team, UserProfile, UserStatus};

use crate::DirectoryService;

/// A recorded invocation against [`MemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    CurrentUser,
    TeamByName(String),
    RestrictDirectMessage,
    GetProfiles { page: usize, per_page: usize },
    GetProfilesInTeam { team_id: String, page: usize, per_page: usize },
    SearchProfiles { term: String, team_id: Option<String> },
    SearchGroupChannels(String),
    GetTotalUsersCount,
    GetStatusesByIds(Vec<String>),
    GetProfilesInChannel(String),
    CreateDirectChannel { current_user_id: String, other_user_id: String },
    CreateGroupChannel(Vec<String>),
}

#[derive(Debug, Default)]
struct MemoryState {
    current_user_id: String,
    restriction: DmRestriction,
    users: IndexMap<String, UserProfile>,
    teams: IndexMap<String, (Team, Vec<String>)>,
    channels: IndexMap<String, (Channel, Vec<String>)>,
    statuses: HashMap<String, String>,
    channel_open_failure: Option<ActionError>,
    calls: Vec<DirectoryCall>,
}

/// A `DirectoryService` backed by process memory.
///
/// Every call is appended to a log readable through [`MemoryDirectory::calls`],
/// which lets tests assert on the exact requests a workflow produced.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<MemoryState>,
}

impl MemoryDirectory {
    /// An empty directory whose acting user is `current_user`.
    pub fn new(current_user: UserProfile) -> Self {
        let mut state = MemoryState {
            current_user_id: current_user.id.clone(),
            ..MemoryState::default()
        };
        state.users.insert(current_user.id.clone(), current_user);
        Self { state: Mutex::new(state) }
    }

    pub fn with_user(self, user: UserProfile) -> Self {
        self.lock().users.insert(user.id.clone(), user);
        self
    }

    pub fn with_team(self, team: Team, member_ids: &[&str]) -> Self {
        let members = member_ids.iter().map(|id| id.to_string()).collect();
        self.lock().teams.insert(team.id.clone(), (team, members));
        self
    }

    /// Register an existing group conversation with the given members.
    pub fn with_group(self, channel: Channel, member_ids: &[&str]) -> Self {
        let members = member_ids.iter().map(|id| id.to_string()).collect();
        self.lock().channels.insert(channel.id.clone(), (channel, members));
        self
    }

    pub fn with_status(self, user_id: &str, status: &str) -> Self {
        self.lock().statuses.insert(user_id.to_string(), status.to_string());
        self
    }

    pub fn with_restriction(self, restriction: DmRestriction) -> Self {
        self.lock().restriction = restriction;
        self
    }

    /// Make every subsequent conversation open fail with `error`.
    pub fn fail_channel_opens(&self, error: ActionError) {
        self.lock().channel_open_failure = Some(error);
    }

    /// Snapshot of the calls received so far, oldest first.
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.lock().calls.clone()
    }

    /// Channels created or registered so far.
    pub fn channels(&self) -> Vec<Channel> {
        self.lock().channels.values().map(|(channel, _)| channel.clone()).collect()
    }

    /// Seed data for demo mode: one team, a dozen colleagues, two group conversations.
    pub fn demo() -> Self {
        const PEOPLE: &[(&str, &str, &str, &str, &str)] = &[
            ("u-ada", "ada", "Ada", "Lovelace", "online"),
            ("u-alan", "alan", "Alan", "Turing", "away"),
            ("u-barbara", "barbara", "Barbara", "Liskov", "online"),
            ("u-dennis", "dennis", "Dennis", "Ritchie", "offline"),
            ("u-edsger", "edsger", "Edsger", "Dijkstra", "dnd"),
            ("u-frances", "frances", "Frances", "Allen", "online"),
            ("u-grace", "grace", "Grace", "Hopper", "online"),
            ("u-john", "john", "John", "McCarthy", "offline"),
            ("u-ken", "ken", "Ken", "Thompson", "away"),
            ("u-margaret", "margaret", "Margaret", "Hamilton", "online"),
            ("u-niklaus", "niklaus", "Niklaus", "Wirth", "offline"),
            ("u-radia", "radia", "Radia", "Perlman", "online"),
        ];

        let mut me = UserProfile::new("u-me", "you");
        me.first_name = "Demo".into();
        me.last_name = "User".into();
        let mut directory = Self::new(me).with_status("u-me", "online");

        for (id, username, first, last, status) in PEOPLE {
            let mut user = UserProfile::new(*id, *username);
            user.first_name = first.to_string();
            user.last_name = last.to_string();
            directory = directory.with_user(user).with_status(id, status);
        }

        // Two users outside the team, only reachable when DMs are unrestricted.
        let team_members: Vec<&str> = std::iter::once("u-me")
            .chain(PEOPLE.iter().map(|(id, ..)| *id).filter(|id| *id != "u-niklaus" && *id != "u-radia"))
            .collect();

        directory
            .with_team(
                Team {
                    id: "t1".into(),
                    name: "team1".into(),
                    display_name: "Team One".into(),
                },
                &team_members,
            )
            .with_group(group_channel("g-compilers", "ada, grace, you"), &["u-me", "u-ada", "u-grace"])
            .with_group(group_channel("g-unix", "dennis, ken, you"), &["u-me", "u-dennis", "u-ken"])
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: DirectoryCall) -> MutexGuard<'_, MemoryState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

fn group_channel(id: &str, display_name: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: id.to_string(),
        display_name: display_name.to_string(),
        channel_type: ChannelType::Group,
        ..Channel::default()
    }
}

fn matches_term(user: &UserProfile, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    [&user.username, &user.first_name, &user.last_name, &user.nickname, &user.email]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
        || user.full_name().to_lowercase().contains(&term)
}

fn page_of(mut users: Vec<UserProfile>, page: usize, per_page: usize) -> Vec<UserProfile> {
    users.sort_by(|a, b| a.username.cmp(&b.username));
    users.into_iter().skip(page.saturating_mul(per_page)).take(per_page).collect()
}

impl MemoryState {
    fn active_users(&self) -> impl Iterator<Item = &UserProfile> {
        self.users.values().filter(|user| user.is_active())
    }

    fn team_members(&self, team_id: &str) -> ActionResult<&[String]> {
        self.teams
            .get(team_id)
            .map(|(_, members)| members.as_slice())
            .ok_or_else(|| ActionError::NotFound(format!("team {team_id}")))
    }

    fn require_user(&self, user_id: &str) -> ActionResult<&UserProfile> {
        self.users.get(user_id).ok_or_else(|| ActionError::NotFound(format!("user {user_id}")))
    }

    /// Return the channel whose member set matches, creating it from `make` when absent.
    fn open_or_create(&mut self, name: String, members: Vec<String>, make: impl FnOnce(&Self) -> Channel) -> Channel {
        if let Some((channel, _)) = self.channels.values().find(|(_, existing)| sorted_name(existing) == name) {
            return channel.clone();
        }
        let mut channel = make(self);
        channel.id = format!("c{}", self.channels.len() + 1);
        channel.name = name;
        self.channels.insert(channel.id.clone(), (channel.clone(), members));
        channel
    }
}

fn sorted_name(ids: &[String]) -> String {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();
    ids.join("__")
}

#[async_trait::async_trait]
impl DirectoryService for MemoryDirectory {
    async fn current_user(&self) -> ActionResult<UserProfile> {
        let state = self.record(DirectoryCall::CurrentUser);
        state.require_user(&state.current_user_id).cloned()
    }

    async fn team_by_name(&self, name: &str) -> ActionResult<Team> {
        let state = self.record(DirectoryCall::TeamByName(name.to_string()));
        state
            .teams
            .values()
            .map(|(team, _)| team)
            .find(|team| team.name == name)
            .cloned()
            .ok_or_else(|| ActionError::NotFound(format!("team {name}")))
    }

    async fn restrict_direct_message(&self) -> ActionResult<DmRestriction> {
        Ok(self.record(DirectoryCall::RestrictDirectMessage).restriction)
    }

    async fn get_profiles(&self, page: usize, per_page: usize) -> ActionResult<Vec<UserProfile>> {
        let state = self.record(DirectoryCall::GetProfiles { page, per_page });
        Ok(page_of(state.active_users().cloned().collect(), page, per_page))
    }

    async fn get_profiles_in_team(&self, team_id: &str, page: usize, per_page: usize) -> ActionResult<Vec<UserProfile>> {
        let state = self.record(DirectoryCall::GetProfilesInTeam {
            team_id: team_id.to_string(),
            page,
            per_page,
        });
        let members = state.team_members(team_id)?;
        let users = state.active_users().filter(|user| members.contains(&user.id)).cloned().collect();
        Ok(page_of(users, page, per_page))
    }

    async fn search_profiles(&self, term: &str, team_id: Option<&str>) -> ActionResult<Vec<UserProfile>> {
        let state = self.record(DirectoryCall::SearchProfiles {
            term: term.to_string(),
            team_id: team_id.map(str::to_string),
        });
        let members = match team_id {
            Some(team_id) => Some(state.team_members(team_id)?),
            None => None,
        };
        let mut found: Vec<UserProfile> = state
            .active_users()
            .filter(|user| members.is_none_or(|members| members.contains(&user.id)))
            .filter(|user| matches_term(user, term))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(found)
    }

    async fn search_group_channels(&self, term: &str) -> ActionResult<Vec<Channel>> {
        let state = self.record(DirectoryCall::SearchGroupChannels(term.to_string()));
        let needle = term.trim().to_lowercase();
        Ok(state
            .channels
            .values()
            .filter(|(channel, members)| channel.channel_type == ChannelType::Group && members.contains(&state.current_user_id))
            .filter(|(channel, members)| {
                channel.display_name.to_lowercase().contains(&needle)
                    || members
                        .iter()
                        .filter_map(|id| state.users.get(id))
                        .any(|user| user.id != state.current_user_id && matches_term(user, &needle))
            })
            .map(|(channel, _)| channel.clone())
            .collect())
    }

    async fn get_total_users_count(&self) -> ActionResult<u64> {
        let state = self.record(DirectoryCall::GetTotalUsersCount);
        Ok(state.active_users().count() as u64)
    }

    async fn get_statuses_by_ids(&self, user_ids: &[String]) -> ActionResult<Vec<UserStatus>> {
        let state = self.record(DirectoryCall::GetStatusesByIds(user_ids.to_vec()));
        Ok(user_ids
            .iter()
            .map(|id| UserStatus {
                user_id: id.clone(),
                status: state.statuses.get(id).cloned().unwrap_or_else(|| "offline".to_string()),
            })
            .collect())
    }

    async fn get_profiles_in_channel(&self, channel_id: &str) -> ActionResult<Vec<UserProfile>> {
        let state = self.record(DirectoryCall::GetProfilesInChannel(channel_id.to_string()));
        let (_, members) = state
            .channels
            .get(channel_id)
            .ok_or_else(|| ActionError::NotFound(format!("channel {channel_id}")))?;
        Ok(members.iter().filter_map(|id| state.users.get(id)).cloned().collect())
    }

    async fn create_direct_channel(&self, current_user_id: &str, other_user_id: &str) -> ActionResult<Channel> {
        let mut state = self.record(DirectoryCall::CreateDirectChannel {
            current_user_id: current_user_id.to_string(),
            other_user_id: other_user_id.to_string(),
        });
        if let Some(error) = state.channel_open_failure.clone() {
            return Err(error);
        }
        state.require_user(current_user_id)?;
        let other = state.require_user(other_user_id)?.username.clone();

        let members = vec![current_user_id.to_string(), other_user_id.to_string()];
        let name = sorted_name(&members);
        Ok(state.open_or_create(name, members, |_| Channel {
            display_name: other,
            channel_type: ChannelType::Direct,
            ..Channel::default()
        }))
    }

    async fn create_group_channel(&self, user_ids: &[String]) -> ActionResult<Channel> {
        let mut state = self.record(DirectoryCall::CreateGroupChannel(user_ids.to_vec()));
        if let Some(error) = state.channel_open_failure.clone() {
            return Err(error);
        }
        if user_ids.len() < 2 {
            return Err(ActionError::Invalid("a group conversation needs at least two other users".into()));
        }
        for id in user_ids {
            state.require_user(id)?;
        }

        let mut members = user_ids.to_vec();
        if !members.contains(&state.current_user_id) {
            members.push(state.current_user_id.clone());
        }
        let name = sorted_name(&members);
        let member_ids = members.clone();
        Ok(state.open_or_create(name, members, move |state| {
            let mut usernames: Vec<&str> = member_ids
                .iter()
                .filter_map(|id| state.users.get(id))
                .map(|user| user.username.as_str())
                .collect();
            usernames.sort_unstable();
            Channel {
                display_name: usernames.join(", "),
                channel_type: ChannelType::Group,
                ..Channel::default()
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> MemoryDirectory {
        let mut carol = UserProfile::new("u3", "carol");
        carol.first_name = "Carol".into();
        let mut gone = UserProfile::new("u9", "gone");
        gone.delete_at = 1;
        MemoryDirectory::new(UserProfile::new("me", "me"))
            .with_user(UserProfile::new("u1", "alice"))
            .with_user(UserProfile::new("u2", "bob"))
            .with_user(carol)
            .with_user(gone)
            .with_team(
                Team {
                    id: "t1".into(),
                    name: "team1".into(),
                    ..Team::default()
                },
                &["me", "u1", "u2"],
            )
            .with_group(group_channel("g1", "alice, bob, me"), &["me", "u1", "u2"])
            .with_group(group_channel("g2", "bob, carol"), &["u2", "u3"])
    }

    #[tokio::test]
    async fn pages_are_sorted_and_exclude_inactive_users() {
        let dir = directory();
        let first = dir.get_profiles(0, 2).await.unwrap();
        let second = dir.get_profiles(1, 2).await.unwrap();
        let names: Vec<_> = first.iter().chain(second.iter()).map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "carol", "me"]);
        assert_eq!(dir.get_total_users_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn team_scoped_search_only_returns_members() {
        let dir = directory();
        let all = dir.search_profiles("CAR", None).await.unwrap();
        assert_eq!(all.len(), 1);
        let scoped = dir.search_profiles("car", Some("t1")).await.unwrap();
        assert!(scoped.is_empty());
        assert_eq!(
            dir.calls().last(),
            Some(&DirectoryCall::SearchProfiles {
                term: "car".into(),
                team_id: Some("t1".into())
            })
        );
    }

    #[tokio::test]
    async fn group_search_is_limited_to_own_groups() {
        let dir = directory();
        let groups = dir.search_group_channels("bob").await.unwrap();
        assert_eq!(groups.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), ["g1"]);
        let members = dir.get_profiles_in_channel("g1").await.unwrap();
        assert_eq!(members.len(), 3);
    }

    #[tokio::test]
    async fn direct_channel_is_reused_for_the_same_pair() {
        let dir = directory();
        let first = dir.create_direct_channel("me", "u1").await.unwrap();
        let again = dir.create_direct_channel("me", "u1").await.unwrap();
        assert_eq!(first, again);
        assert_eq!(first.name, "me__u1");
        assert_eq!(first.channel_type, ChannelType::Direct);
    }

    #[tokio::test]
    async fn group_channel_includes_acting_user() {
        let dir = directory();
        let channel = dir.create_group_channel(&["u3".into(), "u1".into()]).await.unwrap();
        assert_eq!(channel.name, "me__u1__u3");
        assert_eq!(channel.display_name, "alice, carol, me");
        let unknown = dir.create_group_channel(&["u1".into(), "nobody".into()]).await;
        assert!(matches!(unknown, Err(ActionError::NotFound(_))));
    }

    #[tokio::test]
    async fn injected_failures_surface_on_channel_open() {
        let dir = directory();
        dir.fail_channel_opens(ActionError::Server {
            status: 500,
            message: "boom".into(),
        });
        let err = dir.create_direct_channel("me", "u1").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn demo_seed_is_consistent() {
        let dir = MemoryDirectory::demo();
        let me = dir.current_user().await.unwrap();
        assert_eq!(me.username, "you");
        let team = dir.team_by_name("team1").await.unwrap();
        let in_team = dir.get_profiles_in_team(&team.id, 0, 100).await.unwrap();
        let everyone = dir.get_profiles(0, 100).await.unwrap();
        assert!(in_team.len() < everyone.len());
        assert_eq!(dir.search_group_channels("grace").await.unwrap().len(), 1);
    }
}
