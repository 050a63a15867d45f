use std::collections::VecDeque;

use halite_core::{DecodePhase, PlayerId, Spectator, World};
use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::{GridAesthetic, ViewerPrefs};

const PLAYER_COLORS: [Color; 4] = [
    Color::Rgb(0xc5, 0xec, 0x98),
    Color::Rgb(0xff, 0x99, 0x99),
    Color::Rgb(0xff, 0xbe, 0x00),
    Color::Rgb(0x66, 0xcc, 0xcc),
];

/// Terminal columns used per grid cell.
const CELL_WIDTH: u16 = 2;
const INFOBOX_WIDTH: u16 = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Running,
    Exited(Option<i32>),
    DecodeFailed,
}

pub struct UiState {
    pub offset_x: i64,
    pub offset_y: i64,
    pub prefs: ViewerPrefs,
    pub engine: EngineStatus,
    pub logs: VecDeque<String>,
    pub max_logs: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(ViewerPrefs::default())
    }
}

impl UiState {
    pub fn new(prefs: ViewerPrefs) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            prefs,
            engine: EngineStatus::Running,
            logs: VecDeque::new(),
            max_logs: 6,
        }
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }

    /// Moves the viewport; offsets wrap around the torus.
    pub fn scroll(&mut self, dx: i64, dy: i64, world: &World) {
        if world.width() == 0 || world.height() == 0 {
            return;
        }
        self.offset_x = (self.offset_x + dx).rem_euclid(world.width() as i64);
        self.offset_y = (self.offset_y + dy).rem_euclid(world.height() as i64);
    }

    pub fn cycle_aesthetic(&mut self) -> GridAesthetic {
        self.prefs.grid_aesthetic = self.prefs.grid_aesthetic.next();
        self.prefs.grid_aesthetic
    }

    pub fn toggle_turn_numbering(&mut self) -> bool {
        self.prefs.turns_start_at_one = !self.prefs.turns_start_at_one;
        self.prefs.turns_start_at_one
    }

    /// World coordinate shown at a viewport position.
    pub fn screen_to_world(&self, sx: i64, sy: i64, world: &World) -> (i64, i64) {
        (
            wrap_coord(sx + self.offset_x, world.width()),
            wrap_coord(sy + self.offset_y, world.height()),
        )
    }
}

pub fn wrap_coord(value: i64, size: usize) -> i64 {
    if size == 0 {
        return 0;
    }
    value.rem_euclid(size as i64)
}

pub fn player_color(player: PlayerId) -> Color {
    PLAYER_COLORS[player.rem_euclid(PLAYER_COLORS.len() as i64) as usize]
}

pub fn ship_glyph(direction: Option<halite_core::Direction>) -> char {
    match direction {
        Some(halite_core::Direction::North) => '^',
        Some(halite_core::Direction::South) => 'v',
        Some(halite_core::Direction::East) => '>',
        Some(halite_core::Direction::West) => '<',
        None => 'o',
    }
}

pub fn turn_label(world: &World, prefs: &ViewerPrefs) -> String {
    let max = world
        .max_turns()
        .map_or_else(|| "?".to_string(), |max| max.to_string());
    match world.turn() {
        Some(turn) => {
            let shown = if prefs.turns_start_at_one { turn + 1 } else { turn };
            format!("turn {shown}/{max}")
        }
        None => format!("turn -/{max}"),
    }
}

pub fn free_halite_label(world: &World) -> String {
    match world.free_halite_percent() {
        Some(percent) => format!("halite {} ({}%)", world.free_halite(), percent),
        None => format!("halite {}", world.free_halite()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occupant {
    Empty,
    Structure(PlayerId),
    Ship { owner: PlayerId, glyph: char },
}

/// Structures first, ships drawn over them.
fn occupancy(world: &World) -> Vec<(Option<PlayerId>, Occupant)> {
    let width = world.width();
    let mut grid = vec![(None, Occupant::Empty); width * world.height()];
    let index = |x: i64, y: i64| {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < width && y < world.height()).then(|| y * width + x)
    };
    for dropoff in world.dropoffs().values() {
        if let Some(slot) = index(dropoff.x, dropoff.y) {
            grid[slot] = (Some(dropoff.owner), Occupant::Structure(dropoff.owner));
        }
    }
    for ship in world.ships().values() {
        if let Some(slot) = index(ship.x, ship.y) {
            grid[slot].1 = Occupant::Ship {
                owner: ship.owner,
                glyph: ship_glyph(ship.direction),
            };
        }
    }
    grid
}

pub fn draw_ui(frame: &mut Frame, state: &UiState, spectator: &Spectator) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(state.max_logs as u16 + 2),
        ])
        .split(frame.size());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(INFOBOX_WIDTH)])
        .split(rows[1]);

    draw_header(frame, rows[0], state, spectator);
    draw_map(frame, body[0], state, spectator.world());
    draw_infobox(frame, body[1], state, spectator);
    draw_logs(frame, rows[2], state);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &UiState, spectator: &Spectator) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Halite Inspector");
    let status = match (state.engine, spectator.phase()) {
        (EngineStatus::DecodeFailed, _) => {
            Span::styled("Decode failed", Style::default().fg(Color::Red))
        }
        (_, DecodePhase::Finished) => {
            Span::styled("Game over", Style::default().fg(Color::Yellow))
        }
        (EngineStatus::Exited(code), _) => {
            let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
            Span::styled(
                format!("Engine exited ({code})"),
                Style::default().fg(Color::Yellow),
            )
        }
        (EngineStatus::Running, DecodePhase::SteadyState) => {
            Span::styled("Live", Style::default().fg(Color::Green))
        }
        (EngineStatus::Running, _) => {
            Span::styled("Waiting for game", Style::default().fg(Color::Cyan))
        }
    };
    let line = Line::from(vec![
        status,
        Span::raw(" | q quit | arrows scroll | g grid | t turn numbering"),
    ]);
    let text = Paragraph::new(line).wrap(Wrap { trim: true });
    frame.render_widget(block, area);
    frame.render_widget(
        text,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_map(frame: &mut Frame, area: Rect, state: &UiState, world: &World) {
    let block = Block::default().borders(Borders::ALL).title(format!(
        "Map [{}]",
        state.prefs.grid_aesthetic.label()
    ));
    let inner = area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });
    frame.render_widget(block, area);
    if world.width() == 0 || world.height() == 0 {
        return;
    }

    let grid = occupancy(world);
    let columns = (inner.width / CELL_WIDTH).min(world.width() as u16);
    let visible_rows = inner.height.min(world.height() as u16);
    let lines: Vec<Line> = (0..visible_rows)
        .map(|sy| {
            let spans: Vec<Span> = (0..columns)
                .map(|sx| {
                    let (x, y) = state.screen_to_world(sx as i64, sy as i64, world);
                    let halite = world.map().get(x, y).unwrap_or(0);
                    let grey = state.prefs.grid_aesthetic.shade(halite);
                    let (structure, occupant) = grid[y as usize * world.width() + x as usize];
                    let background = structure.map_or(Color::Rgb(grey, grey, grey), player_color);
                    match occupant {
                        Occupant::Ship { owner, glyph } => {
                            let foreground = if structure.is_some() {
                                Color::Black
                            } else {
                                player_color(owner)
                            };
                            Span::styled(
                                format!("{glyph} "),
                                Style::default()
                                    .fg(foreground)
                                    .bg(background)
                                    .add_modifier(Modifier::BOLD),
                            )
                        }
                        Occupant::Structure(_) | Occupant::Empty => {
                            Span::styled("  ", Style::default().bg(background))
                        }
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_infobox(frame: &mut Frame, area: Rect, state: &UiState, spectator: &Spectator) {
    let world = spectator.world();
    let block = Block::default().borders(Borders::ALL).title("Game");
    let mut lines = Vec::new();

    if let Some(constants) = world.constants() {
        lines.push(Line::from(format!(
            "seed {}  {}x{}",
            constants.seed,
            world.width(),
            world.height()
        )));
    }
    lines.push(Line::from(free_halite_label(world)));
    lines.push(Line::from(turn_label(world, &state.prefs)));

    for player in world.standings() {
        let Some(stats) = world.player_stats(player) else {
            continue;
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            spectator.player_name(player),
            Style::default()
                .fg(player_color(player))
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!(
            " ships {}/{}  drops {}",
            stats.ships, stats.built, stats.dropoffs
        )));
        lines.push(Line::from(format!(
            " carried {}  budget {}",
            stats.carried, stats.budget
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}
