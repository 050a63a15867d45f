//! Applies a decoded turn frame to the world.
//!
//! A frame is applied in one call, so anything holding `&World` between
//! calls sees either the previous turn or the new one, never a mix.

use std::collections::btree_map::Entry;

use halite_proto::Direction;
use halite_stream::{CellUpdate, DropoffRecord, ShipRecord, TurnFrame};
use tracing::{debug, warn};

use crate::world::{Dropoff, PlayerId, Ship, World};

pub fn apply_turn_frame(world: &mut World, frame: &TurnFrame) {
    for stats in &mut world.stats {
        stats.reset_live();
    }

    // The engine numbers turns from 1.
    let turn = frame.turn_number.saturating_sub(1);
    world.turn = Some(turn);
    // Turn numbers can repeat or go bad; the commit count cannot.
    let generation = world.signal.frame + 1;

    for player in &frame.players {
        let owner = player.player_id;
        match world.stats_mut(owner) {
            Some(stats) => stats.budget = player.budget,
            None => warn!(
                target: "halite::reconcile",
                player = owner,
                players = world.player_count,
                "frame.unknown_player"
            ),
        }

        for record in &player.ships {
            upsert_ship(world, owner, record, turn, generation);
        }
        for record in &player.dropoffs {
            merge_dropoff(world, owner, record);
        }
    }

    prune_ships(world, turn, generation);
    apply_cell_updates(world, &frame.cell_updates);

    world.signal.ready = true;
    world.signal.frame += 1;
}

fn upsert_ship(
    world: &mut World,
    owner: PlayerId,
    record: &ShipRecord,
    turn: i64,
    generation: u64,
) {
    match world.ships.entry(record.id) {
        Entry::Vacant(slot) => {
            slot.insert(Ship {
                owner,
                id: record.id,
                x: record.x,
                y: record.y,
                halite: record.halite,
                direction: None,
                time_seen: turn,
                seen_in_frame: generation,
            });
        }
        Entry::Occupied(mut slot) => {
            let ship = slot.get_mut();
            ship.direction = infer_direction((ship.x, ship.y), (record.x, record.y));
            ship.owner = owner;
            ship.x = record.x;
            ship.y = record.y;
            ship.halite = record.halite;
            ship.time_seen = turn;
            ship.seen_in_frame = generation;
        }
    }

    let first_sighting = world.seen_ships.insert(record.id);
    if let Some(stats) = world.stats_mut(owner) {
        if first_sighting {
            stats.built += 1;
        }
        stats.ships += 1;
        stats.carried = stats.carried.wrapping_add(record.halite);
    }
}

fn merge_dropoff(world: &mut World, owner: PlayerId, record: &DropoffRecord) {
    world.dropoffs.entry(record.id).or_insert_with(|| Dropoff {
        owner,
        id: record.id,
        x: record.x,
        y: record.y,
        factory: false,
    });

    if let Some(stats) = world.stats_mut(owner) {
        stats.dropoffs += 1;
    }
}

fn prune_ships(world: &mut World, turn: i64, generation: u64) {
    let before = world.ships.len();
    world.ships.retain(|_, ship| ship.seen_in_frame == generation);
    let destroyed = before - world.ships.len();
    if destroyed > 0 {
        debug!(target: "halite::reconcile", turn, destroyed, "ships.pruned");
    }
}

fn apply_cell_updates(world: &mut World, updates: &[CellUpdate]) {
    for update in updates {
        match world.map.set(update.x, update.y, update.halite) {
            Some(previous) => {
                world.free_halite = world
                    .free_halite
                    .wrapping_sub(previous)
                    .wrapping_add(update.halite);
            }
            None => warn!(
                target: "halite::reconcile",
                x = update.x,
                y = update.y,
                "cell_update.off_grid"
            ),
        }
    }
}

/// Direction of a single step between two positions on a wrapping grid.
///
/// A ship moves at most one cell along one axis per turn, so a jump of more
/// than one cell means it crossed the edge going the other way.
pub fn infer_direction(from: (i64, i64), to: (i64, i64)) -> Option<Direction> {
    let (old_x, old_y) = from;
    let (x, y) = to;

    if x < old_x {
        Some(if old_x.abs_diff(x) == 1 {
            Direction::West
        } else {
            Direction::East
        })
    } else if x > old_x {
        Some(if x.abs_diff(old_x) == 1 {
            Direction::East
        } else {
            Direction::West
        })
    } else if y < old_y {
        Some(if old_y.abs_diff(y) == 1 {
            Direction::North
        } else {
            Direction::South
        })
    } else if y > old_y {
        Some(if y.abs_diff(old_y) == 1 {
            Direction::South
        } else {
            Direction::North
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halite_stream::PlayerRecord;

    fn world_with_map(players: usize, width: usize, height: usize, cells: &[i64]) -> World {
        let mut world = World::new();
        world.set_players(players, 0);
        world.init_map(width, height);
        world.load_initial_map(cells.iter().copied());
        world
    }

    fn ship(id: i64, x: i64, y: i64, halite: i64) -> ShipRecord {
        ShipRecord { id, x, y, halite }
    }

    fn frame(turn_number: i64, players: Vec<PlayerRecord>, updates: Vec<CellUpdate>) -> TurnFrame {
        TurnFrame {
            turn_number,
            players,
            cell_updates: updates,
        }
    }

    fn player(player_id: i64, budget: i64, ships: Vec<ShipRecord>) -> PlayerRecord {
        PlayerRecord {
            player_id,
            budget,
            ships,
            dropoffs: Vec::new(),
        }
    }

    #[test]
    fn direction_table_on_width_ten() {
        assert_eq!(infer_direction((9, 0), (0, 0)), Some(Direction::East));
        assert_eq!(infer_direction((0, 0), (9, 0)), Some(Direction::West));
        assert_eq!(infer_direction((3, 0), (4, 0)), Some(Direction::East));
        assert_eq!(infer_direction((4, 0), (3, 0)), Some(Direction::West));
        assert_eq!(infer_direction((4, 4), (4, 4)), None);
    }

    #[test]
    fn vertical_moves_wrap_too() {
        assert_eq!(infer_direction((2, 5), (2, 4)), Some(Direction::North));
        assert_eq!(infer_direction((2, 4), (2, 5)), Some(Direction::South));
        assert_eq!(infer_direction((2, 0), (2, 7)), Some(Direction::North));
        assert_eq!(infer_direction((2, 7), (2, 0)), Some(Direction::South));
    }

    #[test]
    fn sentinel_positions_do_not_overflow() {
        let far = halite_stream::INVALID_INT;
        assert_eq!(infer_direction((5, 0), (far, 0)), Some(Direction::East));
        assert_eq!(infer_direction((far, 0), (5, 0)), Some(Direction::West));
    }

    #[test]
    fn ship_lifecycle_across_frames() {
        let mut world = world_with_map(1, 4, 4, &[0; 16]);

        apply_turn_frame(
            &mut world,
            &frame(1, vec![player(0, 1000, vec![ship(1, 0, 0, 0), ship(2, 3, 3, 5)])], vec![]),
        );
        assert_eq!(world.turn(), Some(0));
        assert_eq!(world.ships().len(), 2);
        assert_eq!(world.player_stats(0).unwrap().built, 2);
        assert_eq!(world.ship(1).unwrap().direction, None);

        // Ship 1 steps east, ship 2 vanishes, ship 3 appears.
        apply_turn_frame(
            &mut world,
            &frame(2, vec![player(0, 900, vec![ship(1, 1, 0, 20), ship(3, 0, 0, 0)])], vec![]),
        );
        assert!(world.ship(2).is_none());
        let moved = world.ship(1).unwrap();
        assert_eq!((moved.x, moved.y, moved.halite), (1, 0, 20));
        assert_eq!(moved.direction, Some(Direction::East));
        assert_eq!(moved.time_seen, 1);
        assert_eq!(moved.seen_in_frame, 2);

        let stats = world.player_stats(0).unwrap();
        assert_eq!(stats.ships, 2);
        assert_eq!(stats.built, 3);
        assert_eq!(stats.carried, 20);
        assert_eq!(stats.budget, 900);

        // Staying put clears the direction.
        apply_turn_frame(
            &mut world,
            &frame(3, vec![player(0, 900, vec![ship(1, 1, 0, 20)])], vec![]),
        );
        assert_eq!(world.ship(1).unwrap().direction, None);
        assert_eq!(world.player_stats(0).unwrap().built, 3);
    }

    #[test]
    fn repeated_turn_number_still_prunes_missing_ships() {
        let mut world = world_with_map(1, 4, 4, &[0; 16]);

        apply_turn_frame(
            &mut world,
            &frame(5, vec![player(0, 1000, vec![ship(1, 0, 0, 0), ship(2, 1, 1, 0)])], vec![]),
        );
        apply_turn_frame(
            &mut world,
            &frame(5, vec![player(0, 1000, vec![ship(1, 0, 0, 0)])], vec![]),
        );

        assert!(world.ship(2).is_none());
        assert_eq!(world.ships().len(), 1);
        assert_eq!(world.ship(1).unwrap().seen_in_frame, 2);
        assert_eq!(world.signal().frame, 2);
    }

    #[test]
    fn returning_ship_id_is_not_rebuilt() {
        let mut world = world_with_map(1, 4, 4, &[0; 16]);
        apply_turn_frame(&mut world, &frame(1, vec![player(0, 0, vec![ship(8, 0, 0, 0)])], vec![]));
        apply_turn_frame(&mut world, &frame(2, vec![player(0, 0, vec![])], vec![]));
        assert!(world.ship(8).is_none());

        apply_turn_frame(&mut world, &frame(3, vec![player(0, 0, vec![ship(8, 2, 2, 0)])], vec![]));
        let revived = world.ship(8).unwrap();
        assert_eq!(revived.direction, None);
        assert_eq!(world.player_stats(0).unwrap().built, 1);
    }

    #[test]
    fn live_stats_are_rebuilt_each_frame() {
        let mut world = world_with_map(2, 2, 2, &[0; 4]);
        apply_turn_frame(
            &mut world,
            &frame(
                1,
                vec![
                    player(0, 100, vec![ship(1, 0, 0, 10)]),
                    player(1, 200, vec![ship(2, 1, 1, 30)]),
                ],
                vec![],
            ),
        );
        apply_turn_frame(
            &mut world,
            &frame(2, vec![player(0, 50, vec![]), player(1, 250, vec![ship(2, 1, 0, 35)])], vec![]),
        );

        let first = world.player_stats(0).unwrap();
        assert_eq!((first.budget, first.ships, first.carried, first.built), (50, 0, 0, 1));
        let second = world.player_stats(1).unwrap();
        assert_eq!((second.budget, second.ships, second.carried, second.built), (250, 1, 35, 1));
    }

    #[test]
    fn dropoffs_persist_and_never_move() {
        let mut world = world_with_map(1, 4, 4, &[0; 16]);
        world.add_factory(0, 0, 1, 1);

        let mut record = player(0, 0, vec![]);
        record.dropoffs = vec![DropoffRecord { id: 4, x: 2, y: 3 }];
        apply_turn_frame(&mut world, &frame(1, vec![record.clone()], vec![]));
        assert_eq!(world.player_stats(0).unwrap().dropoffs, 1);

        record.dropoffs = vec![DropoffRecord { id: 4, x: 0, y: 0 }];
        apply_turn_frame(&mut world, &frame(2, vec![record], vec![]));
        let dropoff = &world.dropoffs()[&4];
        assert_eq!((dropoff.x, dropoff.y, dropoff.factory), (2, 3, false));

        apply_turn_frame(&mut world, &frame(3, vec![player(0, 0, vec![])], vec![]));
        assert_eq!(world.dropoffs().len(), 2);
        assert!(world.dropoffs()[&crate::world::factory_id(0)].factory);
        assert_eq!(world.player_stats(0).unwrap().dropoffs, 0);
    }

    #[test]
    fn cell_updates_conserve_free_total() {
        let mut world = world_with_map(1, 2, 2, &[5, 6, 7, 8]);
        apply_turn_frame(
            &mut world,
            &frame(
                1,
                vec![player(0, 0, vec![])],
                vec![
                    CellUpdate { x: 1, y: 0, halite: 1 },
                    CellUpdate { x: 0, y: 1, halite: 20 },
                    CellUpdate { x: 1, y: 0, halite: 0 },
                ],
            ),
        );
        assert_eq!(world.map().cells(), &[5, 0, 20, 8]);
        assert_eq!(world.free_halite(), 33);
        assert_eq!(world.free_halite(), world.map().total());
        assert_eq!(world.initial_free_halite(), 26);
    }

    #[test]
    fn off_grid_updates_are_skipped() {
        let mut world = world_with_map(1, 2, 2, &[5, 6, 7, 8]);
        apply_turn_frame(
            &mut world,
            &frame(
                1,
                vec![player(0, 0, vec![])],
                vec![
                    CellUpdate { x: 2, y: 0, halite: 100 },
                    CellUpdate { x: halite_stream::INVALID_INT, y: 0, halite: 100 },
                ],
            ),
        );
        assert_eq!(world.free_halite(), 26);
        assert_eq!(world.free_halite(), world.map().total());
    }

    #[test]
    fn unknown_player_keeps_ships_without_stats() {
        let mut world = world_with_map(1, 2, 2, &[0; 4]);
        apply_turn_frame(&mut world, &frame(1, vec![player(5, 70, vec![ship(1, 0, 0, 0)])], vec![]));
        assert_eq!(world.ship(1).unwrap().owner, 5);
        assert_eq!(world.player_stats(0).unwrap().ships, 0);
        assert!(world.player_stats(5).is_none());
    }

    #[test]
    fn each_commit_advances_signal() {
        let mut world = world_with_map(1, 2, 2, &[0; 4]);
        assert!(!world.is_ready());
        apply_turn_frame(&mut world, &frame(1, vec![player(0, 0, vec![])], vec![]));
        apply_turn_frame(&mut world, &frame(2, vec![player(0, 0, vec![])], vec![]));
        assert_eq!(
            world.signal(),
            crate::world::ReadySignal {
                ready: true,
                frame: 2
            }
        );
    }
}
