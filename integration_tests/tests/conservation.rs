mod common;

use anyhow::Result;
use common::{replay, sample_game};
use halite_core::{Spectator, Step};

#[test]
fn free_total_matches_cell_sum_after_every_commit() -> Result<()> {
    let script = sample_game(8);
    let (spectator, snapshots) = replay([script.text()])?;

    let initial: i64 = script.map.iter().sum();
    for snapshot in &snapshots {
        assert_eq!(snapshot.header.free_halite, snapshot.cells.iter().sum::<i64>());
        assert_eq!(snapshot.header.initial_free_halite, initial);
    }
    assert_eq!(spectator.world().free_halite(), spectator.world().map().total());
    Ok(())
}

#[test]
fn final_map_reflects_every_update() -> Result<()> {
    let script = sample_game(6);
    let (spectator, _) = replay([script.text()])?;
    let world = spectator.world();

    let row: Vec<i64> = (0..4).filter_map(|x| world.map().get(x, 0)).collect();
    assert_eq!(row, vec![4, 5, 6, 3]);
    assert_eq!(world.free_halite(), 318);
    assert_eq!(world.initial_free_halite(), 382);
    assert_eq!(world.free_halite_percent(), Some(83));
    Ok(())
}

#[test]
fn strict_prefixes_never_mutate() -> Result<()> {
    let script = sample_game(4);
    let mut spectator = Spectator::new();
    spectator.receive(&script.preamble());
    spectator.pump()?;
    spectator.receive(&script.turn_frame(0));
    spectator.pump()?;
    let before = spectator.snapshot();

    let frame: Vec<String> = script
        .turn_frame(1)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    for token in &frame[..frame.len() - 1] {
        spectator.receive(token);
        for _ in 0..3 {
            assert_eq!(spectator.step()?, Step::Pending);
        }
        assert_eq!(spectator.snapshot(), before);
    }
    assert_eq!(spectator.buffered_tokens(), frame.len() - 1);

    spectator.receive(&frame[frame.len() - 1]);
    assert!(matches!(spectator.step()?, Step::Committed { turn: 1, frame: 2 }));
    assert_eq!(spectator.buffered_tokens(), 0);
    assert_eq!(spectator.step()?, Step::Pending);
    Ok(())
}

#[test]
fn commit_consumes_exactly_one_frame() -> Result<()> {
    let script = sample_game(4);
    let mut spectator = Spectator::new();
    spectator.receive(&script.preamble());
    spectator.pump()?;

    let next = script.turn_frame(1);
    let next_len = next.split_whitespace().count();
    spectator.receive(&script.turn_frame(0));
    spectator.receive(&next[..next.find('\n').unwrap_or(next.len())]);

    assert!(matches!(spectator.step()?, Step::Committed { turn: 0, .. }));
    assert_eq!(spectator.buffered_tokens(), 1);
    assert_eq!(spectator.step()?, Step::Pending);

    spectator.receive(&next[next.find('\n').unwrap_or(next.len())..]);
    assert!(matches!(spectator.step()?, Step::Committed { turn: 1, .. }));
    assert_eq!(spectator.buffered_tokens(), 0);
    assert_eq!(next_len, 1 + 4 + 4 + 4 + 4 + 1 + 3);
    Ok(())
}
