//! Application state for the Murmur TUI.
//!
//! `App` is the single mutable state container the runtime threads through
//! every component. It owns the shared directory cache that outcome messages
//! feed, the navigation history, the log banner, and the per-surface states.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use murmur_api::DirectoryService;
use murmur_types::{DirectChannelsRequest, DmRestriction, Effect, ExecOutcome, Msg, Team, UserProfile, UserStatus};
use rat_focus::{Focus, FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::ui::components::channel::ChannelViewState;
use crate::ui::components::direct_channels::DirectChannelsState;
use crate::ui::theme::Theme;

/// Most recent log lines kept for the banner.
const MAX_LOG_ENTRIES: usize = 200;

/// Cross-cutting shared context owned by the App.
///
/// Holds runtime-wide objects like the directory service and the session
/// identity. This avoids threading multiple references through components.
pub struct SharedCtx {
    pub service: Arc<dyn DirectoryService>,
    pub current_user: UserProfile,
    pub team: Team,
    pub restriction: DmRestriction,
    pub theme: Box<dyn Theme>,
    pub theme_id: String,
    /// Sender half of the app message channel; delayed tasks post here.
    pub msg_sender: UnboundedSender<Msg>,
}

impl fmt::Debug for SharedCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCtx")
            .field("current_user", &self.current_user.username)
            .field("team", &self.team.name)
            .field("restriction", &self.restriction)
            .field("theme_id", &self.theme_id)
            .finish_non_exhaustive()
    }
}

/// Directory data shared by every surface: fetched profiles, presence, group
/// members, the total user count and the settled modal search term.
#[derive(Debug, Default)]
pub struct DirectoryStore {
    pub profiles: IndexMap<String, UserProfile>,
    pub statuses: HashMap<String, String>,
    pub group_members: HashMap<String, Vec<UserProfile>>,
    pub total_users: Option<u64>,
    pub search_term: String,
}

impl DirectoryStore {
    /// Insert or refresh profiles. Returns how many ids were new.
    pub fn merge_profiles(&mut self, profiles: &[UserProfile]) -> usize {
        let before = self.profiles.len();
        for profile in profiles {
            self.profiles.insert(profile.id.clone(), profile.clone());
        }
        self.profiles.len() - before
    }

    pub fn merge_statuses(&mut self, statuses: &[UserStatus]) {
        for status in statuses {
            self.statuses.insert(status.user_id.clone(), status.status.clone());
        }
    }

    pub fn status(&self, user_id: &str) -> Option<&str> {
        self.statuses.get(user_id).map(String::as_str)
    }

    /// The subset of `user_ids` without known presence.
    pub fn missing_status(&self, user_ids: &[String]) -> Vec<String> {
        user_ids.iter().filter(|id| !self.statuses.contains_key(*id)).cloned().collect()
    }

    /// Replace the settled search term. Returns `true` when it changed.
    pub fn set_search_term(&mut self, term: &str) -> bool {
        if self.search_term == term {
            return false;
        }
        self.search_term = term.to_string();
        true
    }
}

#[derive(Debug, Default)]
pub struct LogsState {
    pub entries: Vec<String>,
}

impl LogsState {
    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
        if self.entries.len() > MAX_LOG_ENTRIES {
            let overflow = self.entries.len() - MAX_LOG_ENTRIES;
            self.entries.drain(..overflow);
        }
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }
}

pub struct App {
    /// Shared, cross-cutting context (service, identity, theme)
    pub ctx: SharedCtx,
    /// Cached directory data
    pub directory: DirectoryStore,
    /// Application logs and status messages
    pub logs: LogsState,
    /// Visited locations, most recent last
    pub history: Vec<String>,
    /// Home route state
    pub channel_view: ChannelViewState,
    /// Direct Messages modal state while it is open
    pub direct_channels: Option<DirectChannelsState>,
    /// Keyboard focus ring, rebuilt before every render
    pub focus: Focus,
    /// Named focus target applied on the next render
    pub pending_focus: Option<String>,
    /// Whether background executions are in flight
    pub executing: bool,
    /// Animation frame for the loading throbber
    pub throbber_idx: usize,

    container_focus: FocusFlag,
}

impl App {
    pub fn new(ctx: SharedCtx) -> Self {
        let location = format!("/{}/channels/town-square", ctx.team.name);
        Self {
            ctx,
            directory: DirectoryStore::default(),
            logs: LogsState::default(),
            history: vec![location],
            channel_view: ChannelViewState::default(),
            direct_channels: None,
            focus: Focus::default(),
            pending_focus: None,
            executing: false,
            throbber_idx: 0,
            container_focus: FocusFlag::named("app"),
        }
    }

    pub fn append_log_message(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!(%line, "log");
        self.logs.append(line);
    }

    pub fn current_location(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Build the modal state for `request` from the session context.
    pub fn open_direct_channels(&mut self, request: DirectChannelsRequest) {
        self.direct_channels = Some(DirectChannelsState::new(
            self.ctx.current_user.id.clone(),
            &self.ctx.team,
            self.ctx.restriction,
            request,
            self.ctx.msg_sender.clone(),
        ));
    }

    /// Fold a message into shared state. Outcome data lands in the directory
    /// cache here, before any component sees the message.
    pub fn update(&mut self, msg: &Msg) -> Vec<Effect> {
        match msg {
            Msg::Tick => {
                let loading = self.direct_channels.as_ref().is_some_and(DirectChannelsState::is_loading);
                if self.executing || loading {
                    self.throbber_idx = self.throbber_idx.wrapping_add(1);
                }
            }
            Msg::ExecCompleted(outcome) => self.apply_outcome(outcome),
            Msg::Resize(..) | Msg::DirectChannelsSearchSettled(_) | Msg::DirectChannelsSearchDue(_) => {}
        }
        Vec::new()
    }

    fn apply_outcome(&mut self, outcome: &ExecOutcome) {
        match outcome {
            ExecOutcome::ProfilesPage { page, result } => match result {
                Ok(profiles) => {
                    let added = self.directory.merge_profiles(profiles);
                    debug!(page, fetched = profiles.len(), added, "profiles page loaded");
                }
                Err(error) => {
                    warn!(page, %error, "loading profiles failed");
                    self.append_log_message(format!("Could not load people: {error}"));
                }
            },
            ExecOutcome::TotalUsers(result) => match result {
                Ok(total) => self.directory.total_users = Some(*total),
                Err(error) => warn!(%error, "loading user stats failed"),
            },
            ExecOutcome::Statuses(result) => match result {
                Ok(statuses) => self.directory.merge_statuses(statuses),
                Err(error) => warn!(%error, "loading statuses failed"),
            },
            ExecOutcome::GroupMembers { channel_id, result } => match result {
                Ok(members) => {
                    self.directory.merge_profiles(members);
                    self.directory.group_members.insert(channel_id.clone(), members.clone());
                }
                Err(error) => warn!(%channel_id, %error, "loading group members failed"),
            },
            ExecOutcome::DirectorySearch {
                request_id, profiles, groups, ..
            } => {
                // Stale or not, fetched profiles are worth caching.
                if let Ok(profiles) = profiles {
                    self.directory.merge_profiles(profiles);
                }
                for error in [profiles.as_ref().err(), groups.as_ref().err()].into_iter().flatten() {
                    warn!(request_id, %error, "directory search failed");
                }
            }
            ExecOutcome::ChannelOpened(result) => match result {
                Ok(channel) => debug!(channel = %channel.name, "conversation opened"),
                Err(error) => {
                    warn!(%error, "opening conversation failed");
                    self.append_log_message(format!("Could not open conversation: {error}"));
                }
            },
            ExecOutcome::Log(line) => self.append_log_message(line.clone()),
        }
    }

    /// Looks up a focus flag by its name among the live surfaces.
    pub fn focus_flag_named(&self, name: &str) -> Option<FocusFlag> {
        let mut flags = self.channel_view.focus_flags();
        if let Some(state) = self.direct_channels.as_ref() {
            flags.extend([state.f_search.clone(), state.f_list.clone(), state.f_go.clone()]);
        }
        flags.into_iter().find(|flag| &*flag.name() == name)
    }

    /// Rebuild the focus ring for the current structure, keeping the focused widget.
    pub fn rebuild_focus(&mut self) {
        let old_focus = std::mem::take(&mut self.focus);
        self.focus = FocusBuilder::rebuild_for(self, Some(old_focus));
        if let Some(name) = self.pending_focus.take() {
            match self.focus_flag_named(&name) {
                Some(flag) => self.focus.focus(&flag),
                None => debug!(%name, "focus target no longer exists"),
            }
        }
        if self.focus.focused().is_none() {
            self.focus.first();
        }
        if let Some(state) = self.direct_channels.as_mut() {
            state.sync_focus();
        }
    }
}

impl HasFocus for App {
    /// The open modal traps focus; otherwise the channel view owns it.
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        match self.direct_channels.as_ref() {
            Some(state) => builder.widget(state),
            None => builder.widget(&self.channel_view),
        };
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}
