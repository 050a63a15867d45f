//! Data contracts shared by the Halite spectator crates.
//!
//! Two payloads arrive from the engine as JSON: the metadata token that opens
//! the stdout stream ([`GameConstants`]) and the `viewer_info` lines on the
//! stderr side channel ([`ViewerInfo`]). The remaining types form the
//! serialisable read view of a committed frame ([`WorldSnapshot`]).

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::hash::{BuildHasher, Hasher};

/// Substring that identifies a side-channel payload line.
pub const VIEWER_INFO_MARKER: &str = "viewer_info";

/// Engine constants announced once at the start of the stream.
///
/// Only the four fields the decoder relies on are typed; every other key the
/// engine sends is preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameConstants {
    #[serde(rename = "DEFAULT_MAP_WIDTH")]
    pub map_width: i64,
    #[serde(rename = "DEFAULT_MAP_HEIGHT")]
    pub map_height: i64,
    #[serde(rename = "MAX_TURNS")]
    pub max_turns: i64,
    #[serde(rename = "game_seed")]
    pub seed: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GameConstants {
    pub fn from_json_str(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// Looks up an engine-specific constant that is not modelled explicitly.
    pub fn extra_i64(&self, key: &str) -> Option<i64> {
        self.extra.get(key).and_then(serde_json::Value::as_i64)
    }
}

/// Presentational metadata published on the engine's side channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewerInfo {
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ViewerInfoEnvelope {
    viewer_info: ViewerInfo,
}

pub fn decode_viewer_info_json(data: &str) -> serde_json::Result<ViewerInfo> {
    serde_json::from_str::<ViewerInfoEnvelope>(data).map(|envelope| envelope.viewer_info)
}

/// Last observed movement of a ship on the toroidal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub frame: u64,
    pub turn: i64,
    pub width: i64,
    pub height: i64,
    pub ship_count: u32,
    pub dropoff_count: u32,
    pub free_halite: i64,
    pub initial_free_halite: i64,
    pub hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShipState {
    pub id: i64,
    pub owner: i64,
    pub x: i64,
    pub y: i64,
    pub halite: i64,
    pub direction: Option<Direction>,
    pub time_seen: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DropoffState {
    pub id: i64,
    pub owner: i64,
    pub x: i64,
    pub y: i64,
    pub factory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerState {
    pub id: i64,
    pub budget: i64,
    pub ships: u32,
    pub dropoffs: u32,
    pub carried: i64,
    pub built: u32,
}

/// Read view of the world after a committed frame.
///
/// Entity vectors are ordered by id and `cells` is row-major, so two
/// snapshots of the same world compare (and hash) equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub header: SnapshotHeader,
    pub ships: Vec<ShipState>,
    pub dropoffs: Vec<DropoffState>,
    pub players: Vec<PlayerState>,
    pub cells: Vec<i64>,
}

impl WorldSnapshot {
    pub fn finalize(mut self) -> Self {
        self.header.ship_count = self.ships.len() as u32;
        self.header.dropoff_count = self.dropoffs.len() as u32;
        self.header.hash = hash_snapshot(&self);
        self
    }
}

pub fn hash_snapshot(snapshot: &WorldSnapshot) -> u64 {
    let mut clone = snapshot.clone();
    clone.header.hash = 0;
    let encoded = bincode::serialize(&clone).expect("snapshot serialization for hashing");
    let mut hasher = RandomState::with_seeds(0, 0, 0, 0).build_hasher();
    hasher.write(&encoded);
    hasher.finish()
}

pub fn encode_snapshot_json(snapshot: &WorldSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}

pub fn decode_snapshot_json(data: &str) -> serde_json::Result<WorldSnapshot> {
    serde_json::from_str(data)
}
