//! Runtime: unified event loop and input routing for the TUI.
//!
//! Responsibilities
//! - Own the terminal lifecycle (enter/leave alternate screen, raw mode).
//! - Drive a single event loop over terminal input, app messages posted by
//!   delayed tasks, finished executions and an animation ticker.
//! - Route input to the main view and execute returned `Effect`s.
//!
//! Smart ticking: a fast interval (100 ms) only while something is loading,
//! a long interval (5 s) when idle.
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use murmur_types::{Effect, ExecOutcome, Msg};
use ratatui::{Terminal, prelude::*};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::{
    signal,
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::Session;
use crate::app::{App, SharedCtx};
use crate::cmd;
use crate::ui::components::ChannelComponent;
use crate::ui::components::component::Component;
use crate::ui::main_component::MainView;
use crate::ui::theme;

type Backend = CrosstermBackend<std::io::Stdout>;

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<Backend>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    // Rebuild focus just before rendering so structure changes are reflected
    app.rebuild_focus();
    terminal.draw(|frame| main_view.render(frame, frame.area(), app))?;
    Ok(())
}

/// Handle raw crossterm input events and update `App`/components.
fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => main_view.handle_key_events(app, key_event),
        Event::Mouse(mouse_event) => main_view.handle_mouse_events(app, mouse_event),
        Event::Resize(width, height) => main_view.handle_message(app, Msg::Resize(width, height)),
        _ => Vec::new(),
    }
}

fn is_quit(event: &Event) -> bool {
    matches!(event, Event::Key(key) if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Entry point for the TUI runtime: sets up the terminal, runs the async
/// event loop, and performs cleanup on exit.
pub async fn run_app(session: Session) -> Result<()> {
    let (msg_sender, mut msg_receiver) = mpsc::unbounded_channel::<Msg>();
    let loaded_theme = theme::load(session.preferred_theme.as_deref());
    info!(theme = loaded_theme.definition.id, user = %session.current_user.username, team = %session.team.name, "starting tui");

    let mut app = App::new(SharedCtx {
        service: session.service,
        current_user: session.current_user,
        team: session.team,
        restriction: session.restriction,
        theme: loaded_theme.theme,
        theme_id: loaded_theme.definition.id.to_string(),
        msg_sender,
    });
    let mut main_view = MainView::new(Some(Box::new(ChannelComponent)));
    let mut terminal = setup_terminal()?;
    let mut input_events = EventStream::new();

    let mut pending_execs: FuturesUnordered<JoinHandle<ExecOutcome>> = FuturesUnordered::new();
    let mut effects: Vec<Effect> = Vec::with_capacity(5);

    // Ticking strategy: fast while animating, very slow when idle.
    let fast_interval = Duration::from_millis(100);
    let idle_interval = Duration::from_millis(5000);
    let mut current_interval = idle_interval;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(&mut terminal, &mut app, &mut main_view)?;

    loop {
        let loading = app.direct_channels.as_ref().is_some_and(|state| state.is_loading());
        let needs_animation = app.executing || loading;
        let target_interval = if needs_animation { fast_interval } else { idle_interval };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut needs_render = false;
        tokio::select! {
            // Terminal input events
            maybe_event = input_events.next() => {
                match maybe_event {
                    Some(Ok(event)) => {
                        if is_quit(&event) {
                            break;
                        }
                        effects.extend(handle_input_event(&mut app, &mut main_view, event));
                        needs_render = true;
                    }
                    Some(Err(error)) => warn!(%error, "failed to read terminal event"),
                    // Input stream closed; shut down cleanly.
                    None => break,
                }
            }

            // Messages posted by delayed tasks
            Some(msg) = msg_receiver.recv() => {
                effects.extend(main_view.handle_message(&mut app, msg));
                needs_render = true;
            }

            // Periodic animation tick
            _ = ticker.tick() => {
                effects.extend(main_view.handle_message(&mut app, Msg::Tick));
                needs_render = needs_animation;
            }

            Some(joined) = pending_execs.next(), if !pending_execs.is_empty() => {
                let outcome = joined.unwrap_or_else(|error| ExecOutcome::Log(format!("Execution task failed: {error}")));
                effects.extend(main_view.handle_message(&mut app, Msg::ExecCompleted(Box::new(outcome))));
                needs_render = true;
            }

            _ = signal::ctrl_c() => { break; }
        }

        // Transitions may queue more effects (exit transitions, initial loads).
        while !effects.is_empty() {
            let mut effects_to_process = std::mem::take(&mut effects);
            handle_navigation_effects(&mut app, &mut main_view, &mut effects_to_process, &mut effects);
            process_effects(&mut app, effects_to_process, &mut pending_execs);
            needs_render = true;
        }

        let still_running = !pending_execs.is_empty();
        if app.executing && !still_running {
            app.throbber_idx = 0;
        }
        app.executing = still_running;

        if needs_render {
            render(&mut terminal, &mut app, &mut main_view)?;
        }
    }

    cleanup_terminal(&mut terminal)?;
    info!("tui stopped");
    Ok(())
}

fn handle_navigation_effects(app: &mut App, main_view: &mut MainView, effects: &mut Vec<Effect>, queued_effects: &mut Vec<Effect>) {
    let navigation_effects = effects
        .extract_if(.., |effect| matches!(effect, Effect::ShowModal(_) | Effect::CloseModal))
        .collect::<Vec<Effect>>();

    for effect in navigation_effects {
        match effect {
            Effect::ShowModal(modal) => {
                if let Some((mut view, _)) = main_view.modal_view.take() {
                    queued_effects.extend(view.on_route_exit(app));
                }
                main_view.set_open_modal(app, Some(modal));
                if let Some((view, _)) = main_view.modal_view.as_mut() {
                    queued_effects.extend(view.on_route_enter(app));
                }
            }
            Effect::CloseModal => {
                if let Some((mut view, _)) = main_view.modal_view.take() {
                    queued_effects.extend(view.on_route_exit(app));
                }
                main_view.set_open_modal(app, None);
            }
            _ => {}
        }
    }
}

fn process_effects(app: &mut App, effects: Vec<Effect>, pending_execs: &mut FuturesUnordered<JoinHandle<ExecOutcome>>) {
    if effects.is_empty() {
        return;
    }
    let commands = cmd::from_effects(app, effects);
    if commands.is_empty() {
        return;
    }
    if !app.executing {
        app.throbber_idx = 0;
    }
    pending_execs.extend(cmd::run_cmds(app, commands));
    app.executing = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use murmur_types::Modal;

    #[tokio::test]
    async fn open_then_close_modal_runs_both_transitions() {
        let (mut app, ..) = test_app();
        let mut main_view = MainView::new(Some(Box::new(ChannelComponent)));
        let mut queued = Vec::new();

        let mut effects = vec![Effect::ShowModal(Modal::DirectChannels(app.channel_view.direct_messages_request()))];
        handle_navigation_effects(&mut app, &mut main_view, &mut effects, &mut queued);
        assert!(effects.is_empty());
        assert!(app.direct_channels.is_some());
        assert!(queued.contains(&Effect::LoadTotalUsersStats));

        queued.clear();
        let mut effects = vec![Effect::CloseModal, Effect::Log("kept".into())];
        handle_navigation_effects(&mut app, &mut main_view, &mut effects, &mut queued);
        assert_eq!(effects, vec![Effect::Log("kept".into())]);
        assert!(main_view.modal_view.is_none());
        assert!(app.direct_channels.is_none());
        assert_eq!(queued.last(), Some(&Effect::RestoreFocus("channel.direct_messages".into())));
    }

    #[tokio::test]
    async fn directory_effects_are_spawned_and_joined() {
        let (mut app, ..) = test_app();
        let mut pending = FuturesUnordered::new();
        process_effects(&mut app, vec![Effect::LoadTotalUsersStats, Effect::Log("only local".into())], &mut pending);
        assert!(app.executing);
        assert_eq!(pending.len(), 1);
        let outcome = pending.next().await.unwrap().unwrap();
        assert!(matches!(outcome, ExecOutcome::TotalUsers(Ok(13))));
    }
}
