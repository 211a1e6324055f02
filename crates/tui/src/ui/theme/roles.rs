use std::fmt::Debug;

use murmur_types::StatusKind;
use ratatui::style::{Color, Modifier, Style};

/// Colors for the presence dot drawn beside each person.
#[derive(Debug, Clone, Copy)]
pub struct PresenceColors {
    pub online: Color,
    pub away: Color,
    pub dnd: Color,
    pub offline: Color,
}

/// Semantic color roles shared by every view.
#[derive(Debug, Clone)]
pub struct ThemeRoles {
    pub background: Color,
    pub surface: Color,
    pub border: Color,
    pub focus: Color,
    /// Darkened fill painted behind an open modal.
    pub modal_bg: Color,

    pub text: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    /// Interactive elements (buttons, group markers, the throbber).
    pub accent: Color,

    pub info: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    pub selection_bg: Color,
    pub selection_fg: Color,
    /// Background of a selected recipient chip.
    pub chip_bg: Color,

    pub presence: PresenceColors,
}

/// A palette plus the style builders components draw with.
pub trait Theme: Send + Sync + Debug {
    fn roles(&self) -> &ThemeRoles;

    fn text_primary_style(&self) -> Style {
        Style::default().fg(self.roles().text)
    }
    fn text_secondary_style(&self) -> Style {
        Style::default().fg(self.roles().text_secondary)
    }
    fn text_muted_style(&self) -> Style {
        Style::default().fg(self.roles().text_muted)
    }

    fn border_style(&self, focused: bool) -> Style {
        let roles = self.roles();
        Style::default().fg(if focused { roles.focus } else { roles.border })
    }

    fn selection_style(&self) -> Style {
        Style::default().fg(self.roles().selection_fg).bg(self.roles().selection_bg)
    }

    fn modal_background_style(&self) -> Style {
        Style::default().bg(self.roles().modal_bg)
    }

    fn accent_primary_style(&self) -> Style {
        Style::default().fg(self.roles().accent)
    }
    fn accent_emphasis_style(&self) -> Style {
        self.accent_primary_style().add_modifier(Modifier::BOLD)
    }

    /// Foreground for a validation or status message of `kind`.
    fn status_style(&self, kind: StatusKind) -> Style {
        let roles = self.roles();
        let color = match kind {
            StatusKind::Info => roles.info,
            StatusKind::Warning => roles.warning,
            StatusKind::Error => roles.error,
            StatusKind::Success => roles.success,
        };
        Style::default().fg(color)
    }

    /// Presence dot color for a server status string; unknown values read as offline.
    fn presence_style(&self, status: Option<&str>) -> Style {
        let presence = self.roles().presence;
        let color = match status {
            Some("online") => presence.online,
            Some("away") => presence.away,
            Some("dnd") => presence.dnd,
            _ => presence.offline,
        };
        Style::default().fg(color)
    }

    fn chip_style(&self) -> Style {
        Style::default().bg(self.roles().chip_bg).fg(self.roles().text)
    }
}
