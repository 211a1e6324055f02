//! Component system for the Murmur TUI.
//!
//! Components are self-contained UI elements. They keep their view-local
//! state (hit areas, scroll offsets), read and mutate shared state through
//! `App`, and report side effects back to the runtime as `Effect`s instead of
//! performing I/O themselves.

use std::fmt::Debug;

use crossterm::event::{KeyEvent, MouseEvent};
use murmur_types::{Effect, Msg};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

use crate::app::App;

/// A UI element that handles events and renders itself into a `Rect`.
///
/// # Lifecycle
///
/// 1. `on_route_enter` runs when the component becomes the active route or modal.
/// 2. Messages arrive through `handle_message`; input through
///    `handle_key_events` / `handle_mouse_events`.
/// 3. `render` draws the current state every frame.
/// 4. `on_route_exit` runs when the component is replaced or the modal closes;
///    effects it returns are processed after the transition.
pub(crate) trait Component: Debug {
    /// Handle an application message the component cares about.
    fn handle_message(&mut self, _app: &mut App, _msg: Msg) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle key events while this component is active.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle mouse events while this component is active.
    fn handle_mouse_events(&mut self, _app: &mut App, _mouse: MouseEvent) -> Vec<Effect> {
        Vec::new()
    }

    fn on_route_enter(&mut self, _app: &mut App) -> Vec<Effect> {
        Vec::new()
    }

    fn on_route_exit(&mut self, _app: &mut App) -> Vec<Effect> {
        Vec::new()
    }

    /// Render the component into the given area.
    ///
    /// Rendering may record hit areas for later mouse handling but should not
    /// change application state.
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);

    /// Key hints shown in the hint bar while this component is active.
    fn get_hint_spans(&self, _app: &App) -> Vec<Span<'_>> {
        Vec::new()
    }

    /// Sub-areas the component draws into, in a component-defined order.
    fn get_preferred_layout(&self, _app: &App, area: Rect) -> Vec<Rect> {
        vec![area]
    }
}
