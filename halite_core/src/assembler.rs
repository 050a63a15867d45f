//! Resumable decoder for the engine's stdout stream.
//!
//! Every call to [`FrameAssembler::step`] makes one decode attempt. An attempt
//! either finds everything its phase needs already buffered and consumes it,
//! or returns [`Step::Pending`] having consumed nothing, so the caller can push
//! more text and simply call again.

use halite_proto::GameConstants;
use halite_stream::{decode_turn_frame, TokenBuffer};
use tracing::{error, info, trace};

use crate::reconcile::apply_turn_frame;
use crate::world::World;
use crate::DecodeError;

/// Upper bound on the announced player count, well past any real game.
pub const PLAYER_LIMIT: i64 = 1024;

/// Largest accepted map side. Engine maps top out at 64.
pub const MAP_DIMENSION_LIMIT: usize = 4096;

const PLAYER_HEADER_TOKENS: usize = 2;
const FACTORY_TOKENS: usize = 3;
const DIMENSION_TOKENS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePhase {
    #[default]
    AwaitingMetadata,
    AwaitingPlayerCount,
    AwaitingFactories,
    AwaitingMapDimensions,
    AwaitingInitialMap,
    SteadyState,
    /// The final turn has been committed; later input is left alone.
    Finished,
    /// A fatal preamble error was reported; nothing more is decoded.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Not enough input buffered for the current phase.
    Pending,
    /// A preamble record was consumed and the decoder moved to this phase.
    Advanced(DecodePhase),
    /// A turn frame was applied to the world.
    Committed { turn: i64, frame: u64 },
    Finished,
}

#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: TokenBuffer,
    phase: DecodePhase,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(&mut self, text: &str) {
        self.buffer.receive(text);
    }

    pub fn phase(&self) -> DecodePhase {
        self.phase
    }

    pub fn buffered_tokens(&self) -> usize {
        self.buffer.count()
    }

    pub fn total_tokens(&self) -> u64 {
        self.buffer.total_received()
    }

    /// Makes one decode attempt against `world`.
    pub fn step(&mut self, world: &mut World) -> Result<Step, DecodeError> {
        let result = match self.phase {
            DecodePhase::AwaitingMetadata => self.read_metadata(world),
            DecodePhase::AwaitingPlayerCount => self.read_player_count(world),
            DecodePhase::AwaitingFactories => self.read_factories(world),
            DecodePhase::AwaitingMapDimensions => self.read_map_dimensions(world),
            DecodePhase::AwaitingInitialMap => self.read_initial_map(world),
            DecodePhase::SteadyState => Ok(self.read_turn(world)),
            DecodePhase::Finished => Ok(Step::Finished),
            DecodePhase::Failed => Err(DecodeError::Halted),
        };

        if let Err(err) = &result {
            if self.phase != DecodePhase::Failed {
                error!(target: "halite::decode", phase = ?self.phase, error = %err, "decode.fatal");
                self.phase = DecodePhase::Failed;
            }
        }
        result
    }

    /// Steps until the decoder runs out of input or the game ends, returning
    /// how many turn frames were committed.
    pub fn pump(&mut self, world: &mut World) -> Result<usize, DecodeError> {
        let mut committed = 0;
        loop {
            match self.step(world)? {
                Step::Pending | Step::Finished => return Ok(committed),
                Step::Committed { .. } => committed += 1,
                Step::Advanced(_) => {}
            }
        }
    }

    fn advance(&mut self, phase: DecodePhase) -> Result<Step, DecodeError> {
        self.phase = phase;
        Ok(Step::Advanced(phase))
    }

    /// The payload is one compact JSON token; anything else is fatal.
    fn read_metadata(&mut self, world: &mut World) -> Result<Step, DecodeError> {
        let Some(raw) = self.buffer.take_token() else {
            return Ok(Step::Pending);
        };
        let constants = GameConstants::from_json_str(&raw)
            .map_err(|source| DecodeError::Metadata { raw, source })?;

        info!(
            target: "halite::decode",
            width = constants.map_width,
            height = constants.map_height,
            max_turns = constants.max_turns,
            seed = constants.seed,
            "game.new"
        );
        world.set_constants(constants);
        self.advance(DecodePhase::AwaitingPlayerCount)
    }

    fn read_player_count(&mut self, world: &mut World) -> Result<Step, DecodeError> {
        if self.buffer.count() < PLAYER_HEADER_TOKENS {
            return Ok(Step::Pending);
        }

        let players = self.buffer.take_int();
        let own_player = self.buffer.take_int();
        if !(1..=PLAYER_LIMIT).contains(&players) {
            return Err(DecodeError::InvalidPlayerCount(players));
        }

        world.set_players(players as usize, own_player);
        self.advance(DecodePhase::AwaitingFactories)
    }

    fn read_factories(&mut self, world: &mut World) -> Result<Step, DecodeError> {
        let players = world.player_count();
        if self.buffer.count() < players * FACTORY_TOKENS {
            return Ok(Step::Pending);
        }

        for index in 0..players {
            let owner = self.buffer.take_int();
            let x = self.buffer.take_int();
            let y = self.buffer.take_int();
            world.add_factory(index, owner, x, y);
        }
        self.advance(DecodePhase::AwaitingMapDimensions)
    }

    fn read_map_dimensions(&mut self, world: &mut World) -> Result<Step, DecodeError> {
        if self.buffer.count() < DIMENSION_TOKENS {
            return Ok(Step::Pending);
        }

        let width = self.buffer.take_int();
        let height = self.buffer.take_int();
        let Some((w, h)) = map_extent(width, height) else {
            return Err(DecodeError::InvalidDimensions { width, height });
        };
        if let Some(constants) = world.constants() {
            if (constants.map_width, constants.map_height) != (width, height) {
                return Err(DecodeError::DimensionMismatch {
                    width,
                    height,
                    expected_width: constants.map_width,
                    expected_height: constants.map_height,
                });
            }
        }

        world.init_map(w, h);
        self.advance(DecodePhase::AwaitingInitialMap)
    }

    fn read_initial_map(&mut self, world: &mut World) -> Result<Step, DecodeError> {
        let cells = world.width() * world.height();
        if self.buffer.count() < cells {
            return Ok(Step::Pending);
        }

        let buffer = &self.buffer;
        world.load_initial_map((0..cells).map(|index| buffer.peek_int(index)));
        self.buffer.discard_prefix(cells);

        info!(
            target: "halite::decode",
            width = world.width(),
            height = world.height(),
            free_halite = world.free_halite(),
            "map.loaded"
        );
        self.advance(DecodePhase::SteadyState)
    }

    fn read_turn(&mut self, world: &mut World) -> Step {
        let Some((frame, length)) = decode_turn_frame(&self.buffer, world.player_count()) else {
            return Step::Pending;
        };

        apply_turn_frame(world, &frame);
        self.buffer.discard_prefix(length);

        let turn = world.turn().unwrap_or_default();
        let committed = world.signal().frame;
        trace!(target: "halite::decode", turn, tokens = length, "frame.committed");

        if world.is_final_turn() {
            info!(
                target: "halite::decode",
                turn,
                total_tokens = self.buffer.total_received(),
                "game.over"
            );
            self.phase = DecodePhase::Finished;
        }

        Step::Committed {
            turn,
            frame: committed,
        }
    }
}

/// Both sides within `1..=MAP_DIMENSION_LIMIT` and the cell storage
/// addressable.
fn map_extent(width: i64, height: i64) -> Option<(usize, usize)> {
    let side = |value: i64| {
        usize::try_from(value)
            .ok()
            .filter(|side| (1..=MAP_DIMENSION_LIMIT).contains(side))
    };
    let (w, h) = (side(width)?, side(height)?);
    w.checked_mul(h)?.checked_mul(std::mem::size_of::<i64>())?;
    Some((w, h))
}
