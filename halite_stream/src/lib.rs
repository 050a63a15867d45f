//! Token-level plumbing for the engine's stdout stream.
//!
//! The engine writes whitespace-separated integers with no framing, and the
//! pipe delivers them in chunks that need not line up with records. This crate
//! keeps the raw tokens ([`TokenBuffer`]) and knows the shape of one turn
//! ([`frame`]): how many tokens it needs and how to read it by peeking.

pub mod frame;
mod token_buffer;

pub use frame::{
    decode_turn_frame, required_frame_tokens, CellUpdate, DropoffRecord, PlayerRecord,
    ShipRecord, TurnFrame,
};
pub use token_buffer::{TokenBuffer, INVALID_INT};
