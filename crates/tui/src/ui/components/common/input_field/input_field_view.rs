use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use murmur_types::StatusKind;

use super::InputFieldState;
use crate::ui::theme::{Theme, theme_helpers::panel_style};

/// Glyph for the clear affordance.
pub const CLEAR_GLYPH: &str = "✕";

/// Hit areas produced while drawing an input field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputFieldAreas {
    pub input: Rect,
    pub clear_button: Option<Rect>,
}

/// Rows an input field occupies: three for the bordered box, one for the message.
pub const INPUT_FIELD_HEIGHT: u16 = 4;

/// Draws `field` into `area` and places the terminal cursor when focused.
pub fn render_input_field<T: Theme + ?Sized>(frame: &mut Frame, area: Rect, field: &InputFieldState, theme: &T) -> InputFieldAreas {
    let [box_area, message_area] = Layout::vertical([Constraint::Length(3), Constraint::Length(1)]).areas(area);

    let border_style = match field.message() {
        _ if field.is_disabled() => theme.text_muted_style(),
        Some(message) if message.kind.is_alert() => theme.status_style(message.kind),
        _ if field.shows_error_style() => theme.status_style(StatusKind::Error),
        _ => theme.border_style(field.is_focused()),
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(panel_style(theme));
    if field.show_legend()
        && let Some(legend) = field.legend()
    {
        let legend_style = if field.is_focused() {
            theme.accent_emphasis_style()
        } else {
            theme.text_secondary_style()
        };
        block = block.title(Span::styled(format!(" {legend} "), legend_style));
    }
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    let show_clear = field.show_clear_button();
    let [text_area, clear_area] = Layout::horizontal([Constraint::Min(1), Constraint::Length(if show_clear { 2 } else { 0 })]).areas(inner);

    let content = if field.value().is_empty() {
        Span::styled(field.placeholder_text().unwrap_or_default().to_string(), theme.text_muted_style())
    } else if field.is_disabled() {
        Span::styled(field.value().to_string(), theme.text_muted_style())
    } else {
        Span::styled(field.value().to_string(), theme.text_primary_style())
    };
    frame.render_widget(Paragraph::new(Line::from(content)), text_area);

    let clear_button = show_clear.then(|| {
        frame.render_widget(Paragraph::new(Span::styled(CLEAR_GLYPH, theme.text_muted_style())), clear_area);
        clear_area
    });

    if let Some(message) = field.message() {
        let line = Line::from(vec![
            Span::styled(format!("{} ", message.kind.icon()), theme.status_style(message.kind)),
            Span::styled(message.text.clone(), theme.status_style(message.kind).add_modifier(Modifier::ITALIC)),
        ]);
        frame.render_widget(Paragraph::new(line), message_area);
    }

    if field.is_focused() {
        let column = field.text().cursor_chars() as u16;
        let x = text_area.x.saturating_add(column).min(text_area.right().saturating_sub(1));
        frame.set_cursor_position(Position::new(x, text_area.y));
    }

    InputFieldAreas {
        input: box_area,
        clear_button,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::DraculaTheme;
    use murmur_types::StatusMessage;
    use ratatui::{Terminal, backend::TestBackend, style::Color};

    fn draw(field: &InputFieldState) -> (String, InputFieldAreas) {
        let mut terminal = Terminal::new(TestBackend::new(30, 4)).unwrap();
        let theme = DraculaTheme::new();
        let mut areas = InputFieldAreas::default();
        terminal
            .draw(|frame| areas = render_input_field(frame, frame.area(), field, &theme))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text = buffer.content().iter().map(|cell| cell.symbol()).collect::<String>();
        (text, areas)
    }

    fn border_color(field: &InputFieldState, theme: &DraculaTheme) -> Color {
        let mut terminal = Terminal::new(TestBackend::new(30, 4)).unwrap();
        terminal.draw(|frame| {
            render_input_field(frame, frame.area(), field, theme);
        })
        .unwrap();
        terminal.backend().buffer()[(0, 0)].fg
    }

    #[test]
    fn forced_error_and_disabled_fields_change_the_border() {
        let theme = DraculaTheme::new();
        let roles = theme.roles();
        assert_eq!(border_color(&InputFieldState::new(), &theme), roles.border);
        assert_eq!(border_color(&InputFieldState::new().with_error(true), &theme), roles.error);

        let mut disabled = InputFieldState::new().clearable(true).with_error(true).disabled(true);
        disabled.set_value("alice");
        assert_eq!(border_color(&disabled, &theme), roles.text_muted);
        let (text, areas) = draw(&disabled);
        assert!(text.contains("alice"));
        assert!(areas.clear_button.is_none());
    }

    #[test]
    fn unfocused_empty_field_shows_label_as_placeholder() {
        let field = InputFieldState::new().with_label("Search").clearable(true);
        let (text, areas) = draw(&field);
        assert!(text.contains("Search"));
        assert!(areas.clear_button.is_none());
    }

    #[test]
    fn filled_field_shows_legend_clear_button_and_message() {
        let mut field = InputFieldState::new().with_label("Search").clearable(true);
        field.set_value("alice");
        field.set_custom_message(Some(StatusMessage::error("Search failed")));
        let (text, areas) = draw(&field);
        assert!(text.contains(" Search "));
        assert!(text.contains("alice"));
        assert!(text.contains(CLEAR_GLYPH));
        assert!(text.contains("Search failed"));
        assert!(areas.clear_button.is_some());
    }
}
