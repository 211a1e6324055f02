//! # Murmur TUI Library
//!
//! Terminal user interface for the Murmur chat client. The home route shows
//! the current location; the Direct Messages modal searches the directory,
//! collects recipients and opens a direct or group conversation.
//!
//! ## Architecture
//!
//! Components handle input and render themselves, mutating shared state in
//! [`app::App`] and returning `Effect`s. The runtime executes effects through
//! the command layer (`cmd`) and feeds results back as messages.

mod app;
mod cmd;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use murmur_api::DirectoryService;
use murmur_types::{DmRestriction, Team, UserProfile};

pub use ui::components::direct_channels::{ConversationRequest, RecipientSelection, channel_path};

/// Everything the TUI needs to know about the signed-in session.
pub struct Session {
    pub service: Arc<dyn DirectoryService>,
    pub current_user: UserProfile,
    pub team: Team,
    pub restriction: DmRestriction,
    /// Theme id or alias from persisted preferences; `TUI_THEME` still wins.
    pub preferred_theme: Option<String>,
}

/// Canonical id of the bundled theme named `name` (an id or alias, any case).
pub fn resolve_theme_id(name: &str) -> Option<&'static str> {
    ui::theme::catalog::resolve(name.trim()).map(|definition| definition.id)
}

/// Runs the main TUI application loop until the user quits.
///
/// # Errors
///
/// Returns an error when the terminal cannot be set up or restored.
pub async fn run(session: Session) -> Result<()> {
    ui::runtime::run_app(session).await
}
