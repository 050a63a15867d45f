//! Out-of-band engine output (stderr).
//!
//! Nothing read here can influence decoding of the main stream; the only
//! state it touches is [`PlayerNames`].

use halite_proto::{decode_viewer_info_json, ViewerInfo, VIEWER_INFO_MARKER};
use tracing::debug;

use crate::world::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideChannelLine {
    ViewerInfo(ViewerInfo),
    /// Looked like a payload but did not parse.
    Malformed,
    /// Ordinary engine output.
    Output,
}

pub fn classify_line(line: &str) -> SideChannelLine {
    if !line.contains(VIEWER_INFO_MARKER) {
        return SideChannelLine::Output;
    }
    let (Some(open), Some(close)) = (line.find('{'), line.rfind('}')) else {
        return SideChannelLine::Output;
    };
    if close < open {
        return SideChannelLine::Output;
    }

    match decode_viewer_info_json(&line[open..=close]) {
        Ok(info) => SideChannelLine::ViewerInfo(info),
        Err(err) => {
            debug!(target: "halite::side_channel", error = %err, "viewer_info.malformed");
            SideChannelLine::Malformed
        }
    }
}

/// Display names for players, defaulting to `Player <id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerNames {
    names: Vec<String>,
}

impl PlayerNames {
    pub fn apply(&mut self, info: &ViewerInfo) {
        if info.names.len() > self.names.len() {
            self.names.resize(info.names.len(), String::new());
        }
        for (slot, name) in self.names.iter_mut().zip(&info.names) {
            slot.clone_from(name);
        }
    }

    pub fn name(&self, player: PlayerId) -> String {
        usize::try_from(player)
            .ok()
            .and_then(|index| self.names.get(index))
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Player {player}"))
    }
}
