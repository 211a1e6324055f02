use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use murmur_types::{Effect, ExecOutcome, Msg, RecipientOption};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};

use super::DirectChannelsState;
use crate::app::{App, DirectoryStore};
use crate::ui::components::Component;
use crate::ui::components::common::{INPUT_FIELD_HEIGHT, TextInputState, render_input_field};
use crate::ui::theme::Theme;
use crate::ui::theme::theme_helpers as th;
use crate::ui::utils::truncate_to_width;

static FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Hit areas recorded during the last render.
#[derive(Debug, Default, Clone, Copy)]
struct HitAreas {
    clear_button: Option<Rect>,
    list: Rect,
    /// First option drawn at the top of `list` after scrolling.
    list_offset: usize,
    go_button: Rect,
}

/// The Direct Messages modal: search, pick recipients, open the conversation.
#[derive(Debug, Default)]
pub struct DirectChannelsComponent {
    areas: HitAreas,
}

/// Options on the current page of the list.
fn visible_options(state: &DirectChannelsState, store: &DirectoryStore) -> Vec<RecipientOption> {
    let options = state.options(store);
    let (start, end) = state.page_bounds(options.len());
    options[start..end].to_vec()
}

impl DirectChannelsComponent {
    /// Re-run the debounced search with whatever the input now holds.
    fn edit_search(state: &mut DirectChannelsState, apply: impl FnOnce(&mut TextInputState)) {
        let before = state.search_input.value().to_string();
        state.search_input.edit(apply);
        if state.search_input.value() != before {
            let term = state.search_input.value().to_string();
            state.search(&term);
        }
    }

    /// Add the option under the cursor and start over with an empty search.
    fn add_highlighted(app: &mut App) {
        let Some(state) = app.direct_channels.as_mut() else {
            return;
        };
        let visible = visible_options(state, &app.directory);
        let Some(option) = visible.get(state.list_cursor) else {
            return;
        };
        if state.add_value(option) > 0 && !state.search_input.value().is_empty() {
            Self::edit_search(state, TextInputState::clear);
        }
        let remaining = visible_options(state, &app.directory).len();
        state.move_cursor(0, remaining);
    }

    fn handle_search_keys(state: &mut DirectChannelsState, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                Self::edit_search(state, |text| text.insert_char(c));
            }
            KeyCode::Backspace if state.search_input.value().is_empty() => {
                let kept = state.selection().without_last();
                state.remove(kept);
            }
            KeyCode::Backspace => Self::edit_search(state, |text| {
                text.backspace();
            }),
            KeyCode::Delete => Self::edit_search(state, |text| {
                text.delete();
            }),
            KeyCode::Left => state.search_input.edit(TextInputState::move_left),
            KeyCode::Right => state.search_input.edit(TextInputState::move_right),
            KeyCode::Home => state.search_input.edit(TextInputState::move_home),
            KeyCode::End => state.search_input.edit(TextInputState::move_end),
            _ => {}
        }
    }

    fn render_chips(&self, frame: &mut Frame, area: Rect, state: &DirectChannelsState, theme: &dyn Theme) {
        let line = if state.selection().is_empty() {
            Line::from(Span::styled("No one selected yet", theme.text_muted_style()))
        } else {
            let spans = state.selection().users().iter().flat_map(|user| {
                [
                    Span::styled(format!(" @{} ", user.username), theme.chip_style()),
                    Span::raw(" "),
                ]
            });
            Line::from(spans.collect::<Vec<_>>())
        };
        frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect, app: &App, state: &DirectChannelsState, visible: &[RecipientOption]) {
        let theme = &*app.ctx.theme;
        self.areas.list = area;
        let label_width = usize::from(area.width.saturating_sub(4));
        let items: Vec<ListItem> = visible
            .iter()
            .map(|option| match option {
                RecipientOption::User(user) => ListItem::new(Line::from(vec![
                    Span::styled("● ", theme.presence_style(app.directory.status(&user.id))),
                    Span::styled(truncate_to_width(&user.display_label(), label_width), theme.text_primary_style()),
                ])),
                RecipientOption::Group { profiles, .. } => ListItem::new(Line::from(vec![
                    Span::styled("◆ ", theme.accent_primary_style()),
                    Span::styled(truncate_to_width(&option.label(), label_width), theme.text_primary_style()),
                    Span::styled(format!("  group of {}", profiles.len()), theme.text_muted_style()),
                ])),
            })
            .collect();

        let mut list_state = ListState::default().with_offset(self.areas.list_offset);
        if !items.is_empty() {
            list_state.select(Some(state.list_cursor));
        }
        let highlight = if state.f_list.get() {
            theme.selection_style().add_modifier(Modifier::BOLD)
        } else {
            theme.selection_style()
        };
        let list = List::new(items).highlight_style(highlight).highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut list_state);
        self.areas.list_offset = list_state.offset();
    }

    fn footer_line<'a>(app: &App, state: &DirectChannelsState, option_count: usize, theme: &dyn Theme) -> Line<'a> {
        let mut spans = Vec::new();
        if state.is_loading() {
            spans.push(Span::styled(
                format!("{} ", FRAMES[app.throbber_idx % FRAMES.len()]),
                theme.accent_emphasis_style(),
            ));
        }
        let summary = if option_count == 0 {
            if state.is_loading() { "Loading...".to_string() } else { "No people found".to_string() }
        } else {
            let (start, end) = state.page_bounds(option_count);
            let total = state.total_count(&app.directory, option_count);
            format!("{} - {} of {}", start + 1, end, total)
        };
        spans.push(Span::styled(summary, theme.text_muted_style()));
        Line::from(spans)
    }
}

impl Component for DirectChannelsComponent {
    fn handle_message(&mut self, app: &mut App, msg: Msg) -> Vec<Effect> {
        let Some(state) = app.direct_channels.as_mut() else {
            return Vec::new();
        };
        let mut effects = match msg {
            Msg::DirectChannelsSearchSettled(term) => {
                if app.directory.set_search_term(&term) {
                    state.on_search_term_changed(&term)
                } else {
                    Vec::new()
                }
            }
            // A due query for a term that has since been replaced is dropped.
            Msg::DirectChannelsSearchDue(term) if term == app.directory.search_term => state.on_search_due(&term),
            Msg::ExecCompleted(outcome) => match *outcome {
                ExecOutcome::DirectorySearch {
                    request_id, profiles, groups, ..
                } => state.on_search_completed(request_id, &profiles, &groups),
                ExecOutcome::ProfilesPage { .. } => {
                    state.on_profiles_page();
                    Vec::new()
                }
                ExecOutcome::ChannelOpened(result) => {
                    if result.is_ok() {
                        app.channel_view.current_members = std::iter::once(app.ctx.current_user.clone())
                            .chain(state.selection().users().iter().cloned())
                            .collect();
                    }
                    state.on_channel_opened(&result, &mut app.directory)
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        effects.extend(state.observe_profile_count(&app.directory));
        effects
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let Some(state) = app.direct_channels.as_mut() else {
            return Vec::new();
        };
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return state.dismiss(&mut app.directory),
            KeyCode::Char('s') if control => return state.submit(),
            KeyCode::Char('u') if control => {
                Self::edit_search(state, TextInputState::clear);
                return Vec::new();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                if key.code == KeyCode::Tab {
                    app.focus.next();
                } else {
                    app.focus.prev();
                }
                state.sync_focus();
                return Vec::new();
            }
            KeyCode::PageDown => return state.next_page(&app.directory),
            KeyCode::PageUp => return state.prev_page(),
            KeyCode::Up | KeyCode::Down => {
                let visible = visible_options(state, &app.directory).len();
                state.move_cursor(if key.code == KeyCode::Up { -1 } else { 1 }, visible);
                return Vec::new();
            }
            _ => {}
        }

        if state.f_go.get() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                return state.submit();
            }
            return Vec::new();
        }

        if key.code == KeyCode::Enter {
            Self::add_highlighted(app);
            return Vec::new();
        }

        // Typing from the list goes to the search input.
        if state.f_list.get() && matches!(key.code, KeyCode::Char(_) | KeyCode::Backspace) {
            app.focus.focus(&state.f_search);
            state.sync_focus();
        }
        Self::handle_search_keys(state, key);
        Vec::new()
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Vec::new();
        }
        let Some(state) = app.direct_channels.as_mut() else {
            return Vec::new();
        };
        let position = Position::new(mouse.column, mouse.row);

        if self.areas.clear_button.is_some_and(|area| area.contains(position)) {
            Self::edit_search(state, TextInputState::clear);
            return Vec::new();
        }
        if self.areas.go_button.contains(position) {
            return state.submit();
        }
        if self.areas.list.contains(position) {
            let row = usize::from(position.y - self.areas.list.y) + self.areas.list_offset;
            let visible = visible_options(state, &app.directory).len();
            if row < visible {
                state.list_cursor = row;
                Self::add_highlighted(app);
            }
        }
        Vec::new()
    }

    fn on_route_enter(&mut self, app: &mut App) -> Vec<Effect> {
        app.pending_focus = app.direct_channels.as_ref().map(|state| state.f_search.name().to_string());
        app.direct_channels
            .as_mut()
            .map(|state| state.on_entered(&app.directory))
            .unwrap_or_default()
    }

    fn on_route_exit(&mut self, app: &mut App) -> Vec<Effect> {
        app.direct_channels
            .take()
            .map(|state| state.exit(&mut app.directory))
            .unwrap_or_default()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let Some(mut state) = app.direct_channels.take() else {
            return;
        };
        state.last_area = rect;
        let theme = &*app.ctx.theme;

        let block = th::block(theme, Some(" Direct Messages "), true);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let [intro_area, input_area, chips_area, list_area, footer_area, button_row] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(INPUT_FIELD_HEIGHT),
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .areas(inner);

        let intro = if state.is_existing_channel() {
            "Add people to this conversation"
        } else {
            "Find people or a group conversation to message"
        };
        frame.render_widget(Paragraph::new(Span::styled(intro, theme.text_secondary_style())), intro_area);

        let input_areas = render_input_field(frame, input_area, &state.search_input, theme);
        self.areas.clear_button = input_areas.clear_button;

        self.render_chips(frame, chips_area, &state, theme);

        let options = state.options(&app.directory);
        let (start, end) = state.page_bounds(options.len());
        self.render_list(frame, list_area, app, &state, &options[start..end]);
        frame.render_widget(Paragraph::new(Self::footer_line(app, &state, options.len(), theme)), footer_area);

        let [_, go_area] = Layout::horizontal([Constraint::Fill(1), Constraint::Length(12)]).areas(button_row);
        self.areas.go_button = go_area;
        let label = if state.is_saving() { "Opening" } else { "Go" };
        th::render_button(
            frame,
            go_area,
            label,
            !state.selection().is_empty() && !state.is_saving(),
            state.f_go.get(),
            theme,
        );

        app.direct_channels = Some(state);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        th::build_hint_spans(
            &*app.ctx.theme,
            &[
                (" Enter", " Add  "),
                (" Ctrl+S", " Go  "),
                (" Tab", " Focus  "),
                (" PgUp/PgDn", " Page  "),
                (" Esc", " Close "),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use murmur_types::{Channel, ChannelType, UserProfile};
    use ratatui::{Terminal, backend::TestBackend};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn open(app: &mut App) -> DirectChannelsComponent {
        let request = app.channel_view.direct_messages_request();
        app.open_direct_channels(request);
        let mut component = DirectChannelsComponent::default();
        component.on_route_enter(app);
        app.rebuild_focus();
        component
    }

    #[test]
    fn enter_adds_highlighted_user_and_ctrl_s_submits() {
        let (mut app, ..) = test_app();
        let mut component = open(&mut app);
        app.directory
            .merge_profiles(&[UserProfile::new("u-ada", "ada"), UserProfile::new("u-alan", "alan")]);

        assert!(app.direct_channels.as_ref().unwrap().f_search.get());
        component.handle_key_events(&mut app, key(KeyCode::Down));
        component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert_eq!(app.direct_channels.as_ref().unwrap().selection().ids(), ["u-alan"]);

        let effects = component.handle_key_events(&mut app, ctrl('s'));
        assert_eq!(effects, vec![Effect::OpenDirectChannel("u-alan".into())]);
    }

    #[test]
    fn click_after_scrolling_adds_the_row_under_the_pointer() {
        let (mut app, ..) = test_app();
        let mut component = open(&mut app);
        let people: Vec<UserProfile> = (0..30)
            .map(|n| UserProfile::new(format!("u{n:02}"), format!("p{n:02}")))
            .collect();
        app.directory.merge_profiles(&people);
        for _ in 0..20 {
            component.handle_key_events(&mut app, key(KeyCode::Down));
        }

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| component.render(frame, frame.area(), &mut app)).unwrap();
        let list = component.areas.list;
        assert!(component.areas.list_offset > 0, "cursor on row 20 scrolls the list");
        let buffer = terminal.backend().buffer();
        let top_row: String = (list.x..list.right()).map(|x| buffer[(x, list.y)].symbol()).collect();
        let username = top_row
            .split_whitespace()
            .find_map(|word| word.strip_prefix('@'))
            .unwrap()
            .to_string();

        component.handle_mouse_events(
            &mut app,
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: list.x + 2,
                row: list.y,
                modifiers: KeyModifiers::NONE,
            },
        );
        let selected = app.direct_channels.as_ref().unwrap().selection().users();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].username, username);
        assert_ne!(username, "p00");
    }

    #[tokio::test(start_paused = true)]
    async fn backspace_on_empty_input_removes_last_recipient() {
        let (mut app, ..) = test_app();
        let mut component = open(&mut app);
        let state = app.direct_channels.as_mut().unwrap();
        state.add_group(&[UserProfile::new("u-ada", "ada"), UserProfile::new("u-ken", "ken")]);

        component.handle_key_events(&mut app, key(KeyCode::Char('k')));
        component.handle_key_events(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.direct_channels.as_ref().unwrap().selection().len(), 2);
        component.handle_key_events(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.direct_channels.as_ref().unwrap().selection().ids(), ["u-ada"]);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_term_flows_through_the_shared_store() {
        let (mut app, _directory, mut rx) = test_app();
        let mut component = open(&mut app);
        component.handle_key_events(&mut app, key(KeyCode::Char('g')));
        component.handle_key_events(&mut app, key(KeyCode::Char('r')));

        let settled = rx.recv().await.unwrap();
        assert_eq!(settled, Msg::DirectChannelsSearchSettled("gr".into()));
        component.handle_message(&mut app, settled);
        assert_eq!(app.directory.search_term, "gr");

        let due = rx.recv().await.unwrap();
        let effects = component.handle_message(&mut app, due);
        assert_eq!(
            effects,
            vec![Effect::SearchDirectory {
                request_id: 1,
                term: "gr".into(),
                team_id: None,
            }]
        );
    }

    #[test]
    fn successful_open_records_members_and_closes() {
        let (mut app, ..) = test_app();
        let mut component = open(&mut app);
        app.direct_channels
            .as_mut()
            .unwrap()
            .add_single(&UserProfile::new("u-ada", "ada"));
        component.handle_key_events(&mut app, ctrl('s'));

        let channel = Channel {
            id: "c1".into(),
            name: "u-ada__u-me".into(),
            channel_type: ChannelType::Direct,
            ..Channel::default()
        };
        let effects = component.handle_message(&mut app, Msg::ExecCompleted(Box::new(ExecOutcome::ChannelOpened(Ok(channel)))));
        assert_eq!(effects, vec![Effect::CloseModal]);
        assert_eq!(app.channel_view.current_members.len(), 2);

        let exit = component.on_route_exit(&mut app);
        assert_eq!(
            exit,
            vec![
                Effect::Log("Direct Messages closed".into()),
                Effect::Navigate("/team1/channels/u-ada__u-me".into()),
            ]
        );
        assert!(app.direct_channels.is_none());
    }

    #[test]
    fn escape_dismisses_and_restores_focus_on_exit() {
        let (mut app, ..) = test_app();
        let mut component = open(&mut app);
        app.directory.set_search_term("gr");
        assert_eq!(component.handle_key_events(&mut app, key(KeyCode::Esc)), vec![Effect::CloseModal]);
        assert_eq!(app.directory.search_term, "");
        assert_eq!(
            component.on_route_exit(&mut app).last(),
            Some(&Effect::RestoreFocus(crate::ui::components::channel::DIRECT_MESSAGES_FOCUS.into()))
        );
    }
}
