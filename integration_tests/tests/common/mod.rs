#![allow(dead_code)]

use anyhow::Result;
use halite_core::{Spectator, Step, WorldSnapshot};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Default)]
pub struct PlayerTurn {
    pub budget: i64,
    /// (id, x, y, halite)
    pub ships: Vec<(i64, i64, i64, i64)>,
    /// (id, x, y)
    pub dropoffs: Vec<(i64, i64, i64)>,
}

#[derive(Debug, Clone, Default)]
pub struct TurnScript {
    pub players: Vec<PlayerTurn>,
    /// (x, y, halite)
    pub updates: Vec<(i64, i64, i64)>,
}

/// Text an engine would print for one game, built record by record.
#[derive(Debug, Clone)]
pub struct GameScript {
    pub width: i64,
    pub height: i64,
    pub max_turns: i64,
    pub seed: u64,
    pub own_player: i64,
    /// Factory position per player.
    pub factories: Vec<(i64, i64)>,
    pub map: Vec<i64>,
    pub turns: Vec<TurnScript>,
}

impl GameScript {
    pub fn metadata(&self) -> String {
        format!(
            r#"{{"DEFAULT_MAP_WIDTH":{},"DEFAULT_MAP_HEIGHT":{},"MAX_TURNS":{},"game_seed":{},"CAPACITY":1000}}"#,
            self.width, self.height, self.max_turns, self.seed
        )
    }

    pub fn preamble(&self) -> String {
        let mut lines = vec![
            self.metadata(),
            format!("{} {}", self.factories.len(), self.own_player),
        ];
        for (player, (x, y)) in self.factories.iter().enumerate() {
            lines.push(format!("{player} {x} {y}"));
        }
        lines.push(format!("{} {}", self.width, self.height));
        for row in self.map.chunks(self.width.max(1) as usize) {
            lines.push(join(row.iter()));
        }
        lines.join("\n") + "\n"
    }

    /// Frame text for `turns[index]`, numbered from 1 like the engine does.
    pub fn turn_frame(&self, index: usize) -> String {
        let turn = &self.turns[index];
        let mut lines = vec![(index + 1).to_string()];
        for (player, record) in turn.players.iter().enumerate() {
            lines.push(format!(
                "{} {} {} {}",
                player,
                record.ships.len(),
                record.dropoffs.len(),
                record.budget
            ));
            for (id, x, y, halite) in &record.ships {
                lines.push(format!("{id} {x} {y} {halite}"));
            }
            for (id, x, y) in &record.dropoffs {
                lines.push(format!("{id} {x} {y}"));
            }
        }
        lines.push(turn.updates.len().to_string());
        for (x, y, halite) in &turn.updates {
            lines.push(format!("{x} {y} {halite}"));
        }
        lines.join("\n") + "\n"
    }

    pub fn text(&self) -> String {
        let mut text = self.preamble();
        for index in 0..self.turns.len() {
            text.push_str(&self.turn_frame(index));
        }
        text
    }

    pub fn tokens(&self) -> Vec<String> {
        self.text().split_whitespace().map(str::to_string).collect()
    }
}

fn join<'a>(values: impl Iterator<Item = &'a i64>) -> String {
    values
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two players on a 4x3 map; runs `max_turns + 1` frames so the game ends.
///
/// Player 0 sails ship 0 east around the map and builds ship 2 on turn 3.
/// Player 1 sails ship 1 south until it sinks on turn 3, builds ship 3 on
/// turn 4 and keeps dropoff 5 from turn 2 on.
pub fn sample_game(max_turns: i64) -> GameScript {
    let width = 4;
    let height = 3;
    let map: Vec<i64> = (0..width * height).map(|i| (i * 7) % 50 + 10).collect();

    let turns = (0..=max_turns)
        .map(|k| {
            let mut first = PlayerTurn {
                budget: 1000 + 10 * k,
                ships: vec![(0, k % width, 0, (k * 10).min(1000))],
                dropoffs: Vec::new(),
            };
            if k >= 3 {
                first.ships.push((2, 0, 2, 0));
            }

            let mut second = PlayerTurn {
                budget: 1000 + 20 * k,
                ..PlayerTurn::default()
            };
            if k < 3 {
                second.ships.push((1, 2, (1 + k) % height, 5));
            }
            if k >= 4 {
                second.ships.push((3, 2, 1, 0));
            }
            if k >= 2 {
                second.dropoffs.push((5, 3, 2));
            }

            TurnScript {
                players: vec![first, second],
                updates: vec![(k % width, 0, k)],
            }
        })
        .collect();

    GameScript {
        width,
        height,
        max_turns,
        seed: 1_234_567,
        own_player: 0,
        factories: vec![(0, 0), (2, 1)],
        map,
        turns,
    }
}

/// Feeds `chunks` in order and snapshots the world after every commit.
pub fn replay<I, S>(chunks: I) -> Result<(Spectator, Vec<WorldSnapshot>)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut spectator = Spectator::new();
    let mut snapshots = Vec::new();
    for chunk in chunks {
        spectator.receive(chunk.as_ref());
        loop {
            match spectator.step()? {
                Step::Pending | Step::Finished => break,
                Step::Committed { .. } => snapshots.push(spectator.snapshot()),
                Step::Advanced(_) => {}
            }
        }
    }
    Ok((spectator, snapshots))
}

/// Regroups `tokens` into chunks of 1..=max_tokens tokens at random.
pub fn random_chunks(tokens: &[String], seed: u64, max_tokens: usize) -> Vec<String> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut chunks = Vec::new();
    let mut rest = tokens;
    while !rest.is_empty() {
        let size = rng.gen_range(1..=max_tokens).min(rest.len());
        let (head, tail) = rest.split_at(size);
        let separator = if rng.gen_bool(0.5) { "\n" } else { " " };
        chunks.push(head.join(" ") + separator);
        rest = tail;
    }
    chunks
}
