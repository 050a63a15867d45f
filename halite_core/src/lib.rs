//! Spectator core for Halite-style engines.
//!
//! Rebuilds the game world from the engine's viewer output one turn at a
//! time. Text is pushed into a [`Spectator`], [`Spectator::pump`] decodes and
//! applies every complete frame, and consumers read the committed [`World`]
//! once its [`ReadySignal`] has moved on.
//!
//! ```text
//! stdout text ─▶ TokenBuffer ─▶ FrameAssembler ─▶ reconcile ─▶ World ─▶ ReadySignal
//! stderr line ─▶ side_channel ─▶ PlayerNames
//! ```

pub mod assembler;
mod error;
pub mod reconcile;
pub mod side_channel;
mod snapshot;
mod spectator;
pub mod world;

pub use assembler::{DecodePhase, FrameAssembler, Step, PLAYER_LIMIT};
pub use error::DecodeError;
pub use halite_proto::{Direction, GameConstants, WorldSnapshot};
pub use reconcile::{apply_turn_frame, infer_direction};
pub use side_channel::PlayerNames;
pub use snapshot::capture_snapshot;
pub use spectator::Spectator;
pub use world::{
    factory_id, Dropoff, EntityId, HaliteMap, PlayerId, PlayerStats, ReadySignal, Ship, World,
    FACTORY_ID_BASE,
};
