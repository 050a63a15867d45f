use std::collections::{BTreeMap, BTreeSet};

use halite_proto::{Direction, GameConstants};

pub type PlayerId = i64;
pub type EntityId = i64;

/// Factories get synthetic ids counting down from here so they never collide
/// with the non-negative ids the engine assigns to ships and dropoffs.
pub const FACTORY_ID_BASE: EntityId = -1000;

pub fn factory_id(index: usize) -> EntityId {
    FACTORY_ID_BASE - index as EntityId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    pub owner: PlayerId,
    pub id: EntityId,
    pub x: i64,
    pub y: i64,
    pub halite: i64,
    pub direction: Option<Direction>,
    /// Zero-based turn of the last frame that mentioned this ship.
    pub time_seen: i64,
    /// Commit count of the last frame that mentioned this ship.
    pub seen_in_frame: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropoff {
    pub owner: PlayerId,
    pub id: EntityId,
    pub x: i64,
    pub y: i64,
    pub factory: bool,
}

/// Per-cell halite on a `width` x `height` grid, stored row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HaliteMap {
    width: usize,
    height: usize,
    cells: Vec<i64>,
}

impl HaliteMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<i64> {
        self.index(x, y).map(|index| self.cells[index])
    }

    /// Overwrites a cell and returns its previous value, or `None` off-grid.
    pub fn set(&mut self, x: i64, y: i64, halite: i64) -> Option<i64> {
        let index = self.index(x, y)?;
        Some(std::mem::replace(&mut self.cells[index], halite))
    }

    /// Sum over every cell, recomputed from scratch.
    ///
    /// Wrapping, like the running free total, so the two stay comparable even
    /// when sentinel values reach the grid.
    pub fn total(&self) -> i64 {
        self.cells
            .iter()
            .fold(0i64, |acc, value| acc.wrapping_add(*value))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub budget: i64,
    pub ships: u32,
    pub dropoffs: u32,
    pub carried: i64,
    /// Ships ever built; survives every reset.
    pub built: u32,
}

impl PlayerStats {
    pub fn reset_live(&mut self) {
        self.budget = 0;
        self.ships = 0;
        self.dropoffs = 0;
        self.carried = 0;
    }
}

/// What a consumer polls before reading the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadySignal {
    /// At least one turn frame has been committed.
    pub ready: bool,
    /// Number of turn frames committed so far.
    pub frame: u64,
}

impl ReadySignal {
    /// True when a frame exists that the caller has not seen yet.
    pub fn advanced_since(&self, last_seen: Option<u64>) -> bool {
        self.ready && last_seen != Some(self.frame)
    }
}

/// The reconstructed game, mutated only by the decoder.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub(crate) constants: Option<GameConstants>,
    pub(crate) own_player: Option<PlayerId>,
    pub(crate) player_count: usize,
    pub(crate) map: HaliteMap,
    pub(crate) turn: Option<i64>,
    pub(crate) free_halite: i64,
    pub(crate) initial_free_halite: i64,
    pub(crate) ships: BTreeMap<EntityId, Ship>,
    pub(crate) seen_ships: BTreeSet<EntityId>,
    pub(crate) dropoffs: BTreeMap<EntityId, Dropoff>,
    pub(crate) stats: Vec<PlayerStats>,
    pub(crate) signal: ReadySignal,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constants(&self) -> Option<&GameConstants> {
        self.constants.as_ref()
    }

    pub fn own_player(&self) -> Option<PlayerId> {
        self.own_player
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn width(&self) -> usize {
        self.map.width()
    }

    pub fn height(&self) -> usize {
        self.map.height()
    }

    pub fn map(&self) -> &HaliteMap {
        &self.map
    }

    /// Zero-based turn of the last committed frame.
    pub fn turn(&self) -> Option<i64> {
        self.turn
    }

    pub fn max_turns(&self) -> Option<i64> {
        self.constants.as_ref().map(|constants| constants.max_turns)
    }

    pub fn free_halite(&self) -> i64 {
        self.free_halite
    }

    pub fn initial_free_halite(&self) -> i64 {
        self.initial_free_halite
    }

    /// Remaining free halite as a whole percentage of the initial amount.
    pub fn free_halite_percent(&self) -> Option<i64> {
        if self.initial_free_halite <= 0 {
            return None;
        }
        Some(self.free_halite.saturating_mul(100) / self.initial_free_halite)
    }

    pub fn ships(&self) -> &BTreeMap<EntityId, Ship> {
        &self.ships
    }

    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    pub fn dropoffs(&self) -> &BTreeMap<EntityId, Dropoff> {
        &self.dropoffs
    }

    pub fn stats(&self) -> &[PlayerStats] {
        &self.stats
    }

    pub fn player_stats(&self, player: PlayerId) -> Option<&PlayerStats> {
        usize::try_from(player)
            .ok()
            .and_then(|index| self.stats.get(index))
    }

    pub fn signal(&self) -> ReadySignal {
        self.signal
    }

    pub fn is_ready(&self) -> bool {
        self.signal.ready
    }

    /// The last committed frame was the game's final turn.
    pub fn is_final_turn(&self) -> bool {
        matches!((self.turn, self.max_turns()), (Some(turn), Some(max)) if turn == max)
    }

    /// Player ids in display order: by id during play, richest first once the
    /// final turn has been committed.
    pub fn standings(&self) -> Vec<PlayerId> {
        let mut order: Vec<PlayerId> = (0..self.player_count as PlayerId).collect();
        if self.is_final_turn() {
            order.sort_by_key(|player| {
                std::cmp::Reverse(self.player_stats(*player).map_or(0, |stats| stats.budget))
            });
        }
        order
    }

    pub(crate) fn stats_mut(&mut self, player: PlayerId) -> Option<&mut PlayerStats> {
        usize::try_from(player)
            .ok()
            .and_then(|index| self.stats.get_mut(index))
    }

    pub(crate) fn set_constants(&mut self, constants: GameConstants) {
        self.constants = Some(constants);
    }

    pub(crate) fn set_players(&mut self, count: usize, own_player: PlayerId) {
        self.player_count = count;
        self.own_player = Some(own_player);
    }

    pub(crate) fn add_factory(&mut self, index: usize, owner: PlayerId, x: i64, y: i64) {
        let id = factory_id(index);
        self.dropoffs.insert(
            id,
            Dropoff {
                owner,
                id,
                x,
                y,
                factory: true,
            },
        );
    }

    pub(crate) fn init_map(&mut self, width: usize, height: usize) {
        self.map = HaliteMap::new(width, height);
        self.stats = vec![PlayerStats::default(); self.player_count];
        self.free_halite = 0;
        self.initial_free_halite = 0;
    }

    /// Fills the grid row-major from `values` and seeds the free totals.
    pub(crate) fn load_initial_map(&mut self, values: impl IntoIterator<Item = i64>) {
        for (cell, value) in self.map.cells.iter_mut().zip(values) {
            *cell = value;
        }
        self.free_halite = self.map.total();
        self.initial_free_halite = self.free_halite;
    }
}
