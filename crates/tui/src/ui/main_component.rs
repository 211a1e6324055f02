use super::components::{Component, DirectChannelsComponent};
use super::theme::theme_helpers as th;
use super::utils::centered_min_max;
use crate::app::App;
use crossterm::event::{KeyEvent, MouseEvent};
use murmur_types::{Effect, Modal, Msg};
use ratatui::widgets::Clear;
use ratatui::{
    prelude::*,
    style::Style,
    widgets::{Block, Paragraph},
};

pub struct ModalLayout(Box<dyn Fn(Rect) -> Rect>);

impl std::fmt::Debug for ModalLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ModalLayout")
    }
}

type ModalView = (Box<dyn Component>, ModalLayout);

#[derive(Default, Debug)]
pub struct MainView {
    /// Current main view component
    pub content_view: Option<Box<dyn Component>>,
    /// Currently open modal component
    pub modal_view: Option<ModalView>,
}

impl MainView {
    pub fn new(content_view: Option<Box<dyn Component>>) -> Self {
        Self {
            content_view,
            modal_view: None,
        }
    }

    /// Update the open modal (use None to clear).
    pub fn set_open_modal(&mut self, app: &mut App, modal: Option<Modal>) {
        self.modal_view = modal.map(|modal| match modal {
            Modal::DirectChannels(request) => {
                app.open_direct_channels(request);
                let view: ModalView = (
                    Box::new(DirectChannelsComponent::default()),
                    ModalLayout(Box::new(|rect| {
                        centered_min_max(60, 85, Rect::new(0, 0, 60, 24), Rect::new(0, 0, 110, 48), rect)
                    })),
                );
                view
            }
        });
    }
}

impl Component for MainView {
    fn handle_message(&mut self, app: &mut App, msg: Msg) -> Vec<Effect> {
        let mut effects = app.update(&msg);

        // The open modal receives messages in place of the content view.
        let target = match self.modal_view.as_mut() {
            Some((modal, _)) => Some(modal),
            None => self.content_view.as_mut(),
        };
        if let Some(component) = target {
            effects.extend(component.handle_message(app, msg));
        }
        effects
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if let Some(target) = self.modal_view.as_mut() {
            return target.0.handle_key_events(app, key);
        }
        if let Some(content) = self.content_view.as_mut() {
            return content.handle_key_events(app, key);
        }
        Vec::new()
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if let Some(target) = self.modal_view.as_mut() {
            return target.0.handle_mouse_events(app, mouse);
        }
        self.content_view
            .as_mut()
            .map(|c| c.handle_mouse_events(app, mouse))
            .unwrap_or_default()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        // Fill the entire background with the theme's background color for consistency
        let bg_fill = Paragraph::new("").style(Style::default().bg(app.ctx.theme.roles().background));
        frame.render_widget(bg_fill, area);

        let layout = self.get_preferred_layout(app, area);
        if let Some(current) = self.content_view.as_mut() {
            current.render(frame, layout[0], app);
        }

        let hint_spans: Vec<Span> = self.get_hint_spans(app);
        let hints_widget = Paragraph::new(Line::from(hint_spans)).style(app.ctx.theme.text_muted_style());
        frame.render_widget(hints_widget, layout[1]);

        if let Some((modal, position)) = self.modal_view.as_mut() {
            render_overlay(frame, app);
            let modal_area = position.0(area);
            frame.render_widget(Clear, modal_area);

            let modal_hints = modal.get_hint_spans(app);
            if !modal_hints.is_empty() {
                let splits = Layout::vertical([
                    Constraint::Percentage(100), // Modal body
                    Constraint::Length(1),       // Modal hints bar
                ])
                .split(modal_area);
                let hints_widget = Paragraph::new(Line::from(modal_hints))
                    .style(app.ctx.theme.text_muted_style())
                    .bg(app.ctx.theme.roles().background);
                frame.render_widget(hints_widget, splits[1]);
                modal.render(frame, splits[0], app);
            } else {
                modal.render(frame, modal_area, app);
            }
        }
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        let mut hint_spans: Vec<Span> = vec![Span::styled("Hints: ", app.ctx.theme.text_muted_style())];
        if let Some(content) = self.content_view.as_ref() {
            hint_spans.extend(content.get_hint_spans(app));
        }
        hint_spans.extend(th::build_hint_spans(&*app.ctx.theme, &[(" Tab", " Focus ")]));
        hint_spans
    }

    fn get_preferred_layout(&self, _app: &App, area: Rect) -> Vec<Rect> {
        Layout::vertical([
            Constraint::Min(1),    // Main view
            Constraint::Length(1), // Hints bar
        ])
        .split(area)
        .to_vec()
    }
}

/// Dims everything behind an open modal.
fn render_overlay(frame: &mut Frame, app: &mut App) {
    frame.render_widget(Block::default().style(app.ctx.theme.modal_background_style()).dim(), frame.area());
}
