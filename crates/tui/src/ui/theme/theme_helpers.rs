use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use super::roles::{Theme, ThemeRoles};

/// Build a standard Block with theme surfaces and borders.
pub fn block<'a, T: Theme + ?Sized>(theme: &'a T, title: Option<&'a str>, focused: bool) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(theme.border_style(focused))
        .style(panel_style(theme));
    if let Some(t) = title {
        block = block.title(Span::styled(t, theme.text_secondary_style().add_modifier(Modifier::BOLD)));
    }
    block
}

/// Style for panel-like containers (set background on widget using `.style`).
pub fn panel_style<T: Theme + ?Sized>(theme: &T) -> Style {
    let ThemeRoles { surface, text, .. } = *theme.roles();
    Style::default().bg(surface).fg(text)
}

/// Button fill: accent text, highlighted when focused.
fn button_style<T: Theme + ?Sized>(theme: &T, enabled: bool, focused: bool) -> Style {
    if !enabled {
        return theme.text_muted_style();
    }
    let style = theme.accent_primary_style();
    if focused { style.bg(theme.roles().selection_bg) } else { style }
}

/// Renders a standard bordered button.
pub fn render_button<T: Theme + ?Sized>(frame: &mut Frame, area: Rect, label: &str, is_enabled: bool, is_focused: bool, theme: &T) {
    let border_style = if is_enabled {
        theme.border_style(is_focused)
    } else {
        theme.text_muted_style()
    };

    frame.render_widget(
        Paragraph::new(label)
            .centered()
            .block(Block::bordered().border_style(border_style))
            .style(button_style(theme, is_enabled, is_focused)),
        area,
    );
}

/// Build `key description` hint pairs for the hint bar.
pub fn build_hint_spans<'a, T: Theme + ?Sized>(theme: &T, hints: &[(&'a str, &'a str)]) -> Vec<Span<'a>> {
    hints
        .iter()
        .flat_map(|(key, description)| {
            [
                Span::styled(*key, theme.accent_emphasis_style()),
                Span::styled(*description, theme.text_muted_style()),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::DraculaTheme;

    #[test]
    fn hint_spans_alternate_key_and_description() {
        let theme = DraculaTheme::new();
        let spans = build_hint_spans(&theme, &[("Esc", " Close "), ("Enter", " Add ")]);
        let text: Vec<&str> = spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, ["Esc", " Close ", "Enter", " Add "]);
        assert_eq!(spans[0].style, theme.accent_emphasis_style());
    }

    #[test]
    fn presence_falls_back_to_offline() {
        let theme = DraculaTheme::new();
        let presence = theme.roles().presence;
        assert_eq!(theme.presence_style(Some("online")), Style::default().fg(presence.online));
        assert_eq!(theme.presence_style(Some("ooo")), Style::default().fg(presence.offline));
        assert_eq!(theme.presence_style(None), theme.presence_style(Some("offline")));
    }

    #[test]
    fn disabled_buttons_are_muted() {
        let theme = DraculaTheme::new();
        assert_eq!(button_style(&theme, false, true), theme.text_muted_style());
        assert_eq!(button_style(&theme, true, false), theme.accent_primary_style());
    }
}
