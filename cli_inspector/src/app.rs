use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode};
use halite_core::{DecodePhase, Spectator};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::config::ViewerPrefs;
use crate::ui::{draw_ui, EngineStatus, UiState};

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);
const INPUT_POLL: Duration = Duration::from_millis(16);

/// Output of the engine process, forwarded by the reader tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Stdout(String),
    Stderr(String),
    Exited(Option<i32>),
}

/// Requests from the UI thread to the task that owns the engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    StopEngine,
    Quit,
}

pub struct InspectorApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    spectator: Spectator,
    events: UnboundedReceiver<EngineEvent>,
    control: UnboundedSender<ControlRequest>,
    log_receiver: Receiver<String>,
    last_drawn_frame: Option<u64>,
    dirty: bool,
    reported_game_over: bool,
}

impl InspectorApp {
    pub fn new(
        events: UnboundedReceiver<EngineEvent>,
        control: UnboundedSender<ControlRequest>,
        log_receiver: Receiver<String>,
        prefs: ViewerPrefs,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state: UiState::new(prefs),
            spectator: Spectator::new(),
            events,
            control,
            log_receiver,
            last_drawn_frame: None,
            dirty: true,
            reported_game_over: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let mut last_draw = Instant::now();

        loop {
            while let Ok(event) = self.events.try_recv() {
                self.handle_event(event);
            }

            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
                self.dirty = true;
            }

            self.pump_spectator();

            let signal = self.spectator.signal();
            if signal.advanced_since(self.last_drawn_frame)
                || self.dirty
                || last_draw.elapsed() >= REDRAW_INTERVAL
            {
                self.terminal
                    .draw(|frame| draw_ui(frame, &self.ui_state, &self.spectator))?;
                if signal.ready {
                    self.last_drawn_frame = Some(signal.frame);
                }
                self.dirty = false;
                last_draw = Instant::now();
            }

            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Left => self.ui_state.scroll(-1, 0, self.spectator.world()),
                        KeyCode::Right => self.ui_state.scroll(1, 0, self.spectator.world()),
                        KeyCode::Up => self.ui_state.scroll(0, -1, self.spectator.world()),
                        KeyCode::Down => self.ui_state.scroll(0, 1, self.spectator.world()),
                        KeyCode::Char('g') => {
                            let aesthetic = self.ui_state.cycle_aesthetic();
                            info!("Grid aesthetic set to {}", aesthetic.label());
                        }
                        KeyCode::Char('t') => {
                            let one_based = self.ui_state.toggle_turn_numbering();
                            info!(one_based, "Turn numbering toggled");
                        }
                        _ => {}
                    }
                    self.dirty = true;
                }
            }
        }

        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        let _ = self.control.send(ControlRequest::Quit);
        Ok(())
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Stdout(text) => self.spectator.receive(&text),
            EngineEvent::Stderr(line) => {
                if self.spectator.receive_side_channel(&line) {
                    self.dirty = true;
                }
            }
            EngineEvent::Exited(code) => {
                info!(?code, "engine.exited");
                if self.ui_state.engine != EngineStatus::DecodeFailed {
                    self.ui_state.engine = EngineStatus::Exited(code);
                }
                self.dirty = true;
            }
        }
    }

    fn pump_spectator(&mut self) {
        if self.spectator.phase() == DecodePhase::Failed {
            return;
        }
        if let Err(err) = self.spectator.pump() {
            error!("Stopped decoding engine output: {}", err);
            self.ui_state.engine = EngineStatus::DecodeFailed;
            self.dirty = true;
            if self.control.send(ControlRequest::StopEngine).is_err() {
                error!("Engine control channel closed");
            }
            return;
        }

        if self.spectator.is_finished() && !self.reported_game_over {
            self.reported_game_over = true;
            let snapshot = self.spectator.snapshot();
            info!(
                turn = snapshot.header.turn,
                frame = snapshot.header.frame,
                hash = %format!("{:016x}", snapshot.header.hash),
                "Game over"
            );
        }
    }
}
