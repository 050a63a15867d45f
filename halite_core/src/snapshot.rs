use halite_proto::{DropoffState, PlayerState, ShipState, SnapshotHeader, WorldSnapshot};

use crate::world::World;

/// Copies the committed world into its serialisable form.
pub fn capture_snapshot(world: &World) -> WorldSnapshot {
    let ships = world
        .ships()
        .values()
        .map(|ship| ShipState {
            id: ship.id,
            owner: ship.owner,
            x: ship.x,
            y: ship.y,
            halite: ship.halite,
            direction: ship.direction,
            time_seen: ship.time_seen,
        })
        .collect();

    let dropoffs = world
        .dropoffs()
        .values()
        .map(|dropoff| DropoffState {
            id: dropoff.id,
            owner: dropoff.owner,
            x: dropoff.x,
            y: dropoff.y,
            factory: dropoff.factory,
        })
        .collect();

    let players = world
        .stats()
        .iter()
        .enumerate()
        .map(|(index, stats)| PlayerState {
            id: index as i64,
            budget: stats.budget,
            ships: stats.ships,
            dropoffs: stats.dropoffs,
            carried: stats.carried,
            built: stats.built,
        })
        .collect();

    let header = SnapshotHeader {
        frame: world.signal().frame,
        turn: world.turn().unwrap_or(-1),
        width: world.width() as i64,
        height: world.height() as i64,
        free_halite: world.free_halite(),
        initial_free_halite: world.initial_free_halite(),
        ..SnapshotHeader::default()
    };

    WorldSnapshot {
        header,
        ships,
        dropoffs,
        players,
        cells: world.map().cells().to_vec(),
    }
    .finalize()
}
