//! State and transitions for the Direct Messages modal.
//!
//! Every transition returns the effects it needs; the component glues key
//! presses and completed executions to these methods and never talks to the
//! directory service itself.

use std::time::Duration;

use murmur_types::{
    ActionResult, Channel, DirectChannelsRequest, DmRestriction, Effect, Msg, RecipientOption, StatusMessage, Team, USERS_PER_PAGE,
    UserProfile,
};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::selection::{ConversationRequest, RecipientSelection, channel_path};
use crate::app::DirectoryStore;
use crate::ui::components::common::{Debouncer, InputFieldState};

/// Quiet period after the last keystroke before the term is published.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);
/// Delay between a published term and the directory query it triggers.
pub const SEARCH_QUERY_DELAY: Duration = Duration::from_millis(100);
/// Longest search term the input accepts.
pub const SEARCH_TERM_LIMIT: usize = 64;

/// Results of the latest settled directory search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SearchResults {
    profile_ids: Vec<String>,
    groups: Vec<Channel>,
}

#[derive(Debug)]
pub struct DirectChannelsState {
    current_user_id: String,
    team_id: String,
    team_name: String,
    restriction: DmRestriction,
    focus_origin: Option<String>,
    on_exit: Vec<Effect>,
    existing_channel: bool,

    selection: RecipientSelection,
    pub search_input: InputFieldState,
    search_results: Option<SearchResults>,
    search_failed: bool,
    request_id: u64,
    input_debounce: Debouncer,
    query_delay: Debouncer,

    page: usize,
    pub list_cursor: usize,
    page_pending: bool,
    search_pending: bool,
    saving: bool,
    show: bool,
    target: Option<String>,
    last_profile_count: usize,

    pub container_focus: FocusFlag,
    pub f_search: FocusFlag,
    pub f_list: FocusFlag,
    pub f_go: FocusFlag,
    pub last_area: Rect,
}

impl DirectChannelsState {
    pub fn new(
        current_user_id: impl Into<String>,
        team: &Team,
        restriction: DmRestriction,
        request: DirectChannelsRequest,
        sender: UnboundedSender<Msg>,
    ) -> Self {
        let current_user_id = current_user_id.into();
        let existing_channel = request.is_existing_channel();
        let selection = RecipientSelection::new(current_user_id.clone()).with_members(&request.existing_members);
        let search_input = InputFieldState::new()
            .with_label("Search")
            .with_placeholder("Search for people")
            .with_limit(SEARCH_TERM_LIMIT)
            .clearable(true)
            .with_validator(|value: &str| {
                value
                    .contains(',')
                    .then(|| StatusMessage::warning("Search one name at a time; commas are not supported"))
            });

        Self {
            current_user_id,
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            restriction,
            focus_origin: request.focus_origin,
            on_exit: request.on_exit,
            existing_channel,
            selection,
            search_input,
            search_results: None,
            search_failed: false,
            request_id: 0,
            input_debounce: Debouncer::new(SEARCH_DEBOUNCE, sender.clone()),
            query_delay: Debouncer::new(SEARCH_QUERY_DELAY, sender),
            page: 0,
            list_cursor: 0,
            page_pending: true,
            search_pending: false,
            saving: false,
            show: true,
            target: None,
            last_profile_count: 0,
            container_focus: FocusFlag::named("direct_channels"),
            f_search: FocusFlag::named("direct_channels.search"),
            f_list: FocusFlag::named("direct_channels.list"),
            f_go: FocusFlag::named("direct_channels.go"),
            last_area: Rect::default(),
        }
    }

    pub fn selection(&self) -> &RecipientSelection {
        &self.selection
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// A profile page or a directory search is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.page_pending || self.search_pending
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_visible(&self) -> bool {
        self.show
    }

    pub fn is_existing_channel(&self) -> bool {
        self.existing_channel
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn latest_request_id(&self) -> u64 {
        self.request_id
    }

    fn team_scope(&self) -> Option<String> {
        self.restriction.team_scope(&self.team_id).map(str::to_string)
    }

    /// Profiles fetched per server page.
    pub fn per_page(&self) -> usize {
        match self.restriction {
            DmRestriction::Any => USERS_PER_PAGE * 2,
            DmRestriction::Team => USERS_PER_PAGE,
        }
    }

    /// Server page holding the first row of UI page `page`. `per_page` is a
    /// multiple of the UI page size, so that server page covers every row shown.
    fn load_page(&self, page: usize) -> Effect {
        Effect::LoadProfiles {
            page: page * USERS_PER_PAGE / self.per_page(),
            per_page: self.per_page(),
            team_id: self.team_scope(),
        }
    }

    /// Initial loads once the modal is on screen.
    pub fn on_entered(&mut self, store: &DirectoryStore) -> Vec<Effect> {
        self.last_profile_count = store.profiles.len();
        let mut effects = vec![self.load_page(0), Effect::LoadTotalUsersStats];
        if !store.profiles.is_empty() {
            effects.push(Effect::LoadProfilesMissingStatus(store.profiles.keys().cloned().collect()));
        }
        effects
    }

    pub fn add_single(&mut self, user: &UserProfile) -> bool {
        self.selection.add_single(user)
    }

    pub fn add_group(&mut self, members: &[UserProfile]) -> usize {
        self.selection.add_group(members)
    }

    pub fn add_value(&mut self, option: &RecipientOption) -> usize {
        self.selection.add_value(option)
    }

    pub fn remove(&mut self, users: Vec<UserProfile>) {
        self.selection.remove(users);
    }

    /// Debounce a typed term; only the last call within the quiet period is published.
    pub fn search(&mut self, term: &str) {
        self.input_debounce
            .schedule(Msg::DirectChannelsSearchSettled(term.to_string()));
    }

    /// React to a change of the shared search term.
    pub fn on_search_term_changed(&mut self, term: &str) -> Vec<Effect> {
        self.query_delay.cancel();
        if term.is_empty() {
            // Invalidate any search still in flight for the previous term.
            self.request_id += 1;
            self.search_results = None;
            self.search_pending = false;
            self.reset_paging();
            return Vec::new();
        }
        self.query_delay
            .schedule(Msg::DirectChannelsSearchDue(term.to_string()));
        Vec::new()
    }

    /// The query delay elapsed: issue one tagged directory search.
    pub fn on_search_due(&mut self, term: &str) -> Vec<Effect> {
        self.request_id += 1;
        self.search_pending = true;
        debug!(request_id = self.request_id, %term, "searching directory");
        vec![Effect::SearchDirectory {
            request_id: self.request_id,
            term: term.to_string(),
            team_id: self.team_scope(),
        }]
    }

    /// Apply a finished search. Completions for superseded requests are ignored.
    pub fn on_search_completed(
        &mut self,
        request_id: u64,
        profiles: &ActionResult<Vec<UserProfile>>,
        groups: &ActionResult<Vec<Channel>>,
    ) -> Vec<Effect> {
        if request_id != self.request_id {
            debug!(request_id, latest = self.request_id, "discarding stale search results");
            return Vec::new();
        }

        let mut effects = Vec::new();
        let mut results = SearchResults::default();
        let mut failure = None;
        match profiles {
            Ok(profiles) => {
                results.profile_ids = profiles.iter().map(|profile| profile.id.clone()).collect();
                if !results.profile_ids.is_empty() {
                    effects.push(Effect::LoadStatusesForProfiles(results.profile_ids.clone()));
                }
            }
            Err(error) => failure = Some(error.to_string()),
        }
        match groups {
            Ok(groups) => {
                results.groups = groups.clone();
                if !groups.is_empty() {
                    effects.push(Effect::LoadProfilesForGroupChannels(groups.clone()));
                }
            }
            Err(error) => failure = failure.or_else(|| Some(error.to_string())),
        }

        match failure {
            Some(error) => {
                self.search_failed = true;
                self.search_input
                    .set_custom_message(Some(StatusMessage::error(format!("Search failed: {error}"))));
            }
            None if self.search_failed => {
                self.search_failed = false;
                self.search_input.set_custom_message(None);
            }
            None => {}
        }

        self.search_results = Some(results);
        self.reset_paging();
        self.search_pending = false;
        effects
    }

    /// A profile page arrived (successfully or not).
    pub fn on_profiles_page(&mut self) {
        self.page_pending = false;
    }

    fn reset_paging(&mut self) {
        self.page = 0;
        self.list_cursor = 0;
    }

    /// Move to `page`; moving forward prefetches the matching server page.
    pub fn change_page(&mut self, page: usize, prev_page: usize) -> Vec<Effect> {
        self.page = page;
        self.list_cursor = 0;
        if page > prev_page {
            self.page_pending = true;
            return vec![self.load_page(page)];
        }
        Vec::new()
    }

    pub fn next_page(&mut self, store: &DirectoryStore) -> Vec<Effect> {
        let total = self.total_count(store, self.options(store).len());
        if (self.page + 1) * USERS_PER_PAGE >= total {
            return Vec::new();
        }
        self.change_page(self.page + 1, self.page)
    }

    pub fn prev_page(&mut self) -> Vec<Effect> {
        if self.page == 0 {
            return Vec::new();
        }
        self.change_page(self.page - 1, self.page)
    }

    /// Backfill presence whenever the fetched profile list changes size.
    pub fn observe_profile_count(&mut self, store: &DirectoryStore) -> Vec<Effect> {
        let count = store.profiles.len();
        if count == self.last_profile_count {
            return Vec::new();
        }
        self.last_profile_count = count;
        vec![Effect::LoadProfilesMissingStatus(store.profiles.keys().cloned().collect())]
    }

    fn is_candidate(&self, user: &UserProfile) -> bool {
        user.is_active() && user.id != self.current_user_id && !self.selection.contains(&user.id)
    }

    /// Candidates for the list: search results while a term is settled,
    /// otherwise every cached profile ordered by username.
    pub fn options(&self, store: &DirectoryStore) -> Vec<RecipientOption> {
        match self.search_results.as_ref().filter(|_| !store.search_term.is_empty()) {
            Some(results) => {
                let users = results
                    .profile_ids
                    .iter()
                    .filter_map(|id| store.profiles.get(id))
                    .filter(|user| self.is_candidate(user))
                    .cloned()
                    .map(RecipientOption::User);
                let groups = results.groups.iter().filter_map(|channel| {
                    let profiles = store.group_members.get(&channel.id).cloned().unwrap_or_default();
                    let adds_someone = profiles.is_empty() || profiles.iter().any(|user| self.is_candidate(user));
                    adds_someone.then(|| RecipientOption::Group {
                        channel: channel.clone(),
                        profiles,
                    })
                });
                users.chain(groups).collect()
            }
            None => {
                let mut users: Vec<&UserProfile> = store.profiles.values().filter(|user| self.is_candidate(user)).collect();
                users.sort_by(|a, b| a.username.cmp(&b.username));
                users.into_iter().cloned().map(RecipientOption::User).collect()
            }
        }
    }

    /// Count shown in the footer: the server total unless a search is settled.
    pub fn total_count(&self, store: &DirectoryStore, option_count: usize) -> usize {
        if self.search_results.is_some() && !store.search_term.is_empty() {
            return option_count;
        }
        store
            .total_users
            .map(|total| usize::try_from(total).unwrap_or(usize::MAX).max(option_count))
            .unwrap_or(option_count)
    }

    /// Slice of `options` on the current page.
    pub fn page_bounds(&self, option_count: usize) -> (usize, usize) {
        let start = (self.page * USERS_PER_PAGE).min(option_count);
        let end = (start + USERS_PER_PAGE).min(option_count);
        (start, end)
    }

    pub fn move_cursor(&mut self, delta: isize, visible: usize) {
        if visible == 0 {
            self.list_cursor = 0;
            return;
        }
        let last = visible - 1;
        self.list_cursor = self.list_cursor.saturating_add_signed(delta).min(last);
    }

    /// Start opening the selected conversation.
    pub fn submit(&mut self) -> Vec<Effect> {
        if self.saving {
            return Vec::new();
        }
        let Some(request) = self.selection.conversation_request() else {
            return Vec::new();
        };
        self.saving = true;
        match &request {
            ConversationRequest::Direct(user_id) => debug!(%user_id, "opening direct conversation"),
            ConversationRequest::Group(user_ids) => debug!(count = user_ids.len(), "opening group conversation"),
        }
        vec![request.into_effect()]
    }

    /// Settle a submission. On success the modal hides and remembers where to go.
    pub fn on_channel_opened(&mut self, result: &ActionResult<Channel>, store: &mut DirectoryStore) -> Vec<Effect> {
        self.saving = false;
        match result {
            Ok(channel) => {
                self.target = Some(channel_path(&self.team_name, &channel.name));
                self.dismiss(store)
            }
            Err(_) => Vec::new(),
        }
    }

    /// Hide the modal and clear the shared search term.
    pub fn dismiss(&mut self, store: &mut DirectoryStore) -> Vec<Effect> {
        store.set_search_term("");
        self.show = false;
        self.input_debounce.cancel();
        self.query_delay.cancel();
        vec![Effect::CloseModal]
    }

    /// Exit transition: caller effects first, then navigation or focus restoration.
    pub fn exit(mut self, store: &mut DirectoryStore) -> Vec<Effect> {
        if self.show {
            store.set_search_term("");
            self.show = false;
        }
        let mut effects = std::mem::take(&mut self.on_exit);
        if let Some(target) = self.target.take() {
            effects.push(Effect::Navigate(target));
        } else if let Some(origin) = self.focus_origin.take() {
            effects.push(Effect::RestoreFocus(origin));
        }
        effects
    }

    /// Mirror the search flag into the input field so blur runs validation.
    pub fn sync_focus(&mut self) {
        match (self.f_search.get(), self.search_input.is_focused()) {
            (true, false) => self.search_input.focus_gained(),
            (false, true) => self.search_input.focus_lost(),
            _ => {}
        }
    }
}

impl HasFocus for DirectChannelsState {
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        builder.leaf_widget(&self.f_search);
        builder.leaf_widget(&self.f_list);
        builder.leaf_widget(&self.f_go);
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        self.last_area
    }
}
