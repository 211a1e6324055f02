//! Theme styling module for the TUI UI layer.
//!
//! Two palettes ship (Dracula, Nord). Components never hard-code colors; they
//! ask the active [`Theme`] for semantic roles or use [`theme_helpers`].

use std::env;

use tracing::debug;

pub mod catalog;
pub mod dracula;
pub mod nord;
pub mod roles;
pub mod theme_helpers;

pub use catalog::ThemeDefinition;
pub use dracula::DraculaTheme;
pub use nord::NordTheme;
pub use roles::Theme;

/// Environment variable overriding the persisted theme choice.
pub const THEME_ENV: &str = "TUI_THEME";

/// Theme plus the definition it was built from.
pub struct LoadedTheme {
    pub definition: &'static ThemeDefinition,
    pub theme: Box<dyn Theme>,
}

impl LoadedTheme {
    fn from_definition(definition: &'static ThemeDefinition) -> Self {
        Self {
            definition,
            theme: definition.build(),
        }
    }
}

/// Selects a theme: `TUI_THEME` first, then the persisted preference, then the default.
pub fn load(preferred_theme: Option<&str>) -> LoadedTheme {
    if let Ok(theme_name) = env::var(THEME_ENV) {
        match catalog::resolve(theme_name.trim()) {
            Some(definition) => return LoadedTheme::from_definition(definition),
            None => debug!(theme = %theme_name, "unknown theme in {THEME_ENV}; ignoring"),
        }
    }

    if let Some(definition) = preferred_theme.and_then(|name| catalog::resolve(name.trim())) {
        return LoadedTheme::from_definition(definition);
    }

    LoadedTheme::from_definition(catalog::default_definition())
}
