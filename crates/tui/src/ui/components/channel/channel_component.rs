use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use murmur_types::{Effect, Modal};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::App;
use crate::ui::components::Component;
use crate::ui::theme::theme_helpers as th;

/// Lines of the log banner shown under the channel header.
const LOG_BANNER_LINES: usize = 5;

/// Home route: the current location plus the entry point to Direct Messages.
#[derive(Debug, Default)]
pub struct ChannelComponent;

impl ChannelComponent {
    fn open_direct_messages(app: &App) -> Vec<Effect> {
        vec![Effect::ShowModal(Modal::DirectChannels(app.channel_view.direct_messages_request()))]
    }
}

impl Component for ChannelComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::open_direct_messages(app),
            KeyCode::Char('d') => Self::open_direct_messages(app),
            KeyCode::Enter | KeyCode::Char(' ') if app.channel_view.f_direct_messages.get() => Self::open_direct_messages(app),
            KeyCode::Char('a') => app
                .channel_view
                .add_people_request()
                .map(|request| vec![Effect::ShowModal(Modal::DirectChannels(request))])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if mouse.kind == MouseEventKind::Down(MouseButton::Left)
            && app.channel_view.button_area.contains(Position::new(mouse.column, mouse.row))
        {
            app.focus.focus(&app.channel_view.f_direct_messages);
            return Self::open_direct_messages(app);
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let layout = self.get_preferred_layout(app, rect);
        let theme = &*app.ctx.theme;
        app.channel_view.last_area = rect;

        let title = format!(" {} ", app.ctx.team.display_name);
        let block = th::block(theme, Some(&title), app.channel_view.container_focus.get());
        frame.render_widget(block, rect);

        let mut header = vec![
            Line::from(vec![
                Span::styled("Location  ", theme.text_muted_style()),
                Span::styled(app.current_location().unwrap_or("/").to_string(), theme.accent_emphasis_style()),
            ]),
            Line::from(vec![
                Span::styled("Signed in ", theme.text_muted_style()),
                Span::styled(format!("@{}", app.ctx.current_user.username), theme.text_primary_style()),
                Span::styled(format!("  (direct messages: {})", app.ctx.restriction), theme.text_muted_style()),
            ]),
        ];
        if app.channel_view.in_conversation() {
            let members = app
                .channel_view
                .current_members
                .iter()
                .map(|member| format!("@{}", member.username))
                .collect::<Vec<_>>()
                .join(", ");
            header.push(Line::from(vec![
                Span::styled("Members   ", theme.text_muted_style()),
                Span::styled(members, theme.text_secondary_style()),
            ]));
        }
        frame.render_widget(Paragraph::new(header).wrap(Wrap { trim: true }), layout[0]);

        let [button_area, _] = Layout::horizontal([Constraint::Length(22), Constraint::Fill(1)]).areas(layout[1]);
        app.channel_view.button_area = button_area;
        th::render_button(
            frame,
            button_area,
            "Direct Messages",
            true,
            app.channel_view.f_direct_messages.get(),
            theme,
        );

        let logs: Vec<Line> = app
            .logs
            .entries
            .iter()
            .rev()
            .take(LOG_BANNER_LINES)
            .rev()
            .map(|entry| Line::from(Span::styled(entry.clone(), theme.text_secondary_style())))
            .collect();
        frame.render_widget(Paragraph::new(logs), layout[2]);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        let mut hints = vec![(" d", " Direct messages  ")];
        if app.channel_view.in_conversation() {
            hints.push((" a", " Add people  "));
        }
        hints.push((" Ctrl+C", " Quit "));
        th::build_hint_spans(&*app.ctx.theme, &hints)
    }

    /// Header, button row and log banner inside the bordered frame.
    fn get_preferred_layout(&self, _app: &App, area: Rect) -> Vec<Rect> {
        let inner = area.inner(ratatui::layout::Margin::new(2, 1));
        Layout::vertical([Constraint::Length(4), Constraint::Length(3), Constraint::Min(1)])
            .spacing(1)
            .split(inner)
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::ui::components::channel::DIRECT_MESSAGES_FOCUS;
    use murmur_types::UserProfile;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn d_opens_direct_messages_with_focus_origin() {
        let (mut app, ..) = test_app();
        let effects = ChannelComponent.handle_key_events(&mut app, key(KeyCode::Char('d')));
        let [Effect::ShowModal(Modal::DirectChannels(request))] = effects.as_slice() else {
            panic!("expected the Direct Messages modal, got {effects:?}");
        };
        assert_eq!(request.focus_origin.as_deref(), Some(DIRECT_MESSAGES_FOCUS));
        assert!(!request.is_existing_channel());
    }

    #[test]
    fn add_people_only_inside_a_conversation() {
        let (mut app, ..) = test_app();
        assert!(ChannelComponent.handle_key_events(&mut app, key(KeyCode::Char('a'))).is_empty());
        app.channel_view.current_members = vec![UserProfile::new("u-me", "you"), UserProfile::new("u-ada", "ada")];
        let effects = ChannelComponent.handle_key_events(&mut app, key(KeyCode::Char('a')));
        assert!(matches!(
            effects.as_slice(),
            [Effect::ShowModal(Modal::DirectChannels(request))] if request.is_existing_channel()
        ));
    }
}
