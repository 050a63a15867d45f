use halite_proto::WorldSnapshot;
use tracing::info;

use crate::assembler::{DecodePhase, FrameAssembler, Step};
use crate::side_channel::{classify_line, PlayerNames, SideChannelLine};
use crate::snapshot::capture_snapshot;
use crate::world::{PlayerId, ReadySignal, World};
use crate::DecodeError;

/// One watched game: the decoder, the world it writes and display names.
///
/// Owned by a single driver. Text goes in through [`Spectator::receive`] and
/// [`Spectator::receive_side_channel`]; [`Spectator::pump`] decodes whatever
/// is complete; readers get `&World` and poll [`Spectator::signal`].
#[derive(Debug, Default)]
pub struct Spectator {
    assembler: FrameAssembler,
    world: World,
    names: PlayerNames,
}

impl Spectator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(&mut self, text: &str) {
        self.assembler.receive(text);
    }

    /// Handles one stderr line. Returns true when it updated presentation
    /// state; plain engine output is logged.
    pub fn receive_side_channel(&mut self, line: &str) -> bool {
        match classify_line(line) {
            SideChannelLine::ViewerInfo(info) => {
                self.names.apply(&info);
                true
            }
            SideChannelLine::Malformed => false,
            SideChannelLine::Output => {
                info!(target: "halite::engine", "{}", line);
                false
            }
        }
    }

    pub fn step(&mut self) -> Result<Step, DecodeError> {
        self.assembler.step(&mut self.world)
    }

    pub fn pump(&mut self) -> Result<usize, DecodeError> {
        self.assembler.pump(&mut self.world)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn signal(&self) -> ReadySignal {
        self.world.signal()
    }

    pub fn phase(&self) -> DecodePhase {
        self.assembler.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.assembler.phase() == DecodePhase::Finished
    }

    pub fn player_name(&self, player: PlayerId) -> String {
        self.names.name(player)
    }

    pub fn buffered_tokens(&self) -> usize {
        self.assembler.buffered_tokens()
    }

    pub fn total_tokens(&self) -> u64 {
        self.assembler.total_tokens()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        capture_snapshot(&self.world)
    }
}
