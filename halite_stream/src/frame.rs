//! Shape of one steady-state turn frame.
//!
//! ```text
//! turn_number
//! per player: player_id ship_count dropoff_count budget
//!             ship_count    x (ship_id x y halite)
//!             dropoff_count x (dropoff_id x y)
//! update_count
//! update_count x (x y halite)
//! ```
//!
//! The ship and dropoff counts live inside the frame, so its length is only
//! known after peeking them one player at a time.

use tracing::warn;

use crate::TokenBuffer;

const TURN_NUMBER_TOKENS: usize = 1;
const PLAYER_HEADER_TOKENS: usize = 4;
const SHIP_TOKENS: usize = 4;
const DROPOFF_TOKENS: usize = 3;
const UPDATE_COUNT_TOKENS: usize = 1;
const CELL_UPDATE_TOKENS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipRecord {
    pub id: i64,
    pub x: i64,
    pub y: i64,
    pub halite: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropoffRecord {
    pub id: i64,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub player_id: i64,
    pub budget: i64,
    pub ships: Vec<ShipRecord>,
    pub dropoffs: Vec<DropoffRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellUpdate {
    pub x: i64,
    pub y: i64,
    pub halite: i64,
}

/// One decoded turn, as the engine numbered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnFrame {
    pub turn_number: i64,
    pub players: Vec<PlayerRecord>,
    pub cell_updates: Vec<CellUpdate>,
}

/// Smallest possible frame: every player owns nothing and no cell changed.
pub fn minimum_frame_tokens(players: usize) -> usize {
    TURN_NUMBER_TOKENS
        .saturating_add(players.saturating_mul(PLAYER_HEADER_TOKENS))
        .saturating_add(UPDATE_COUNT_TOKENS)
}

/// Exact token length of the frame at the front of `buffer`, or `None` while
/// the buffer does not hold all of it yet.
///
/// Only peeks, so calling it again after more input arrives is always safe.
pub fn required_frame_tokens(buffer: &TokenBuffer, players: usize) -> Option<usize> {
    let available = buffer.count();
    let mut needed = minimum_frame_tokens(players);
    if available < needed {
        return None;
    }

    let mut cursor = TURN_NUMBER_TOKENS;
    for _ in 0..players {
        let ships = peek_count(buffer, cursor + 1);
        let dropoffs = peek_count(buffer, cursor + 2);
        let body = ships
            .saturating_mul(SHIP_TOKENS)
            .saturating_add(dropoffs.saturating_mul(DROPOFF_TOKENS));

        needed = needed.saturating_add(body);
        if available < needed {
            return None;
        }
        cursor += PLAYER_HEADER_TOKENS + body;
    }

    let updates = peek_count(buffer, cursor);
    needed = needed.saturating_add(updates.saturating_mul(CELL_UPDATE_TOKENS));
    if available < needed {
        return None;
    }

    Some(needed)
}

/// Decodes the frame at the front of `buffer` without consuming it.
///
/// Returns the frame together with its token length; the caller discards
/// that many tokens once the frame has been applied.
pub fn decode_turn_frame(buffer: &TokenBuffer, players: usize) -> Option<(TurnFrame, usize)> {
    let length = required_frame_tokens(buffer, players)?;
    let mut reader = PeekReader { buffer, cursor: 0 };

    let turn_number = reader.int();
    let mut player_records = Vec::with_capacity(players);
    for _ in 0..players {
        let player_id = reader.int();
        let ship_count = reader.count();
        let dropoff_count = reader.count();
        let budget = reader.int();

        let mut ships = Vec::with_capacity(ship_count);
        for _ in 0..ship_count {
            ships.push(ShipRecord {
                id: reader.int(),
                x: reader.int(),
                y: reader.int(),
                halite: reader.int(),
            });
        }

        let mut dropoffs = Vec::with_capacity(dropoff_count);
        for _ in 0..dropoff_count {
            dropoffs.push(DropoffRecord {
                id: reader.int(),
                x: reader.int(),
                y: reader.int(),
            });
        }

        player_records.push(PlayerRecord {
            player_id,
            budget,
            ships,
            dropoffs,
        });
    }

    let update_count = reader.count();
    let mut cell_updates = Vec::with_capacity(update_count);
    for _ in 0..update_count {
        cell_updates.push(CellUpdate {
            x: reader.int(),
            y: reader.int(),
            halite: reader.int(),
        });
    }

    debug_assert_eq!(reader.cursor, length);

    Some((
        TurnFrame {
            turn_number,
            players: player_records,
            cell_updates,
        },
        length,
    ))
}

struct PeekReader<'a> {
    buffer: &'a TokenBuffer,
    cursor: usize,
}

impl PeekReader<'_> {
    fn int(&mut self) -> i64 {
        let value = self.buffer.peek_int(self.cursor);
        self.cursor += 1;
        value
    }

    fn count(&mut self) -> usize {
        let raw = self.buffer.peek_int(self.cursor);
        let value = usize::try_from(raw).unwrap_or_else(|_| {
            warn!(
                target: "halite::stream",
                index = self.cursor,
                value = raw,
                "frame.count_invalid"
            );
            0
        });
        debug_assert_eq!(value, peek_count(self.buffer, self.cursor));
        self.cursor += 1;
        value
    }
}

/// Count at `index` as sizing sees it; anything but a non-negative integer
/// reads as zero. Silent, since a pending frame is sized again on every
/// retry; [`PeekReader::count`] reports the bad token once the frame decodes.
fn peek_count(buffer: &TokenBuffer, index: usize) -> usize {
    buffer
        .try_peek_int(index)
        .and_then(|raw| usize::try_from(raw).ok())
        .unwrap_or(0)
}
