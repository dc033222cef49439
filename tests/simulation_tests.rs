use std::collections::HashSet;
use std::ops::ControlFlow;

use lifegrid::Grid;
use lifegrid::RuleSet;
use lifegrid::Simulation;
use lifegrid::grid::Charmap;
use lifegrid::rle;
use lifegrid::rle::RleError;
use proptest::prelude::*;

const DOTS: Charmap = Charmap {
    alive: 'o',
    dead: '.',
};

fn grids() -> impl Strategy<Value = Grid> {
    (1usize..8, 1usize..8).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<bool>(), w * h)
            .prop_map(move |cells| Grid::from_rows(cells.chunks(w)).unwrap())
    })
}

fn rules() -> impl Strategy<Value = RuleSet> {
    prop::sample::select(RuleSet::registry().map(|(_, rule)| rule).collect::<Vec<_>>())
}

/// Live neighbors of `(x, y)`, counted the slow way.
fn count_by_hand(grid: &Grid, x: usize, y: usize, wrap: bool) -> u8 {
    let (w, h) = (grid.width() as isize, grid.height() as isize);
    let mut seen = HashSet::new();

    for dy in -1..=1 {
        for dx in -1..=1 {
            let (nx, ny) = (x as isize + dx, y as isize + dy);
            let (nx, ny) = if wrap {
                (nx.rem_euclid(w), ny.rem_euclid(h))
            } else if (0..w).contains(&nx) && (0..h).contains(&ny) {
                (nx, ny)
            } else {
                continue;
            };

            if (nx, ny) != (x as isize, y as isize) {
                seen.insert((nx as usize, ny as usize));
            }
        }
    }

    seen.into_iter().filter(|&(x, y)| grid.is_alive(x, y)).count() as u8
}

proptest! {
    #[test]
    fn neighbor_count_matches_by_hand(grid in grids(), wrap in any::<bool>()) {
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let count = grid.live_neighbor_count(x, y, wrap);

                prop_assert!(count <= 8);
                prop_assert_eq!(count, count_by_hand(&grid, x, y, wrap));
            }
        }
    }

    #[test]
    fn crop_undoes_pad(grid in grids(), t in 0usize..4, b in 0usize..4, l in 0usize..4, r in 0usize..4) {
        let padded = grid.pad(t, b, l, r).unwrap();

        prop_assert_eq!(padded.width(), grid.width() + l + r);
        prop_assert_eq!(padded.height(), grid.height() + t + b);
        prop_assert_eq!(padded.population(), grid.population());
        prop_assert_eq!(padded.crop(l, t, grid.width(), grid.height()).unwrap(), grid);
    }

    #[test]
    fn resize_undoes_pad_bottom_right(grid in grids(), b in 0usize..4, r in 0usize..4) {
        let padded = grid.pad_bottom(b).unwrap().pad_right(r).unwrap();

        prop_assert_eq!(padded.resize(grid.width(), grid.height()).unwrap(), grid);
    }

    #[test]
    fn step_keeps_dimensions(grid in grids(), rule in rules(), wrap in any::<bool>()) {
        let next = rule.step(&grid, wrap);

        prop_assert_eq!((next.width(), next.height()), (grid.width(), grid.height()));
    }

    #[test]
    fn encoded_grids_parse_back(grid in grids(), rule in rules()) {
        let text = rle::encode(&grid, &rule);
        let pattern = rle::parse(&text).unwrap();

        prop_assert_eq!(pattern.rule(), rule);
        prop_assert_eq!(pattern.seed(), grid);
    }
}

#[test]
fn pulsar_has_period_three() -> anyhow::Result<()> {
    let text = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/rle_pats/pulsar.rle"
    ))?;
    let start = rle::parse(&text)?.seed().pad_all(3)?;

    let mut sim = Simulation::new(start.clone(), RuleSet::default(), false);
    let mut seen = Vec::new();

    sim.run(Some(3), &mut |grid: &Grid, _: u64| {
        seen.push(grid.clone());
        ControlFlow::Continue(())
    })?;

    assert_ne!(seen[0], start);
    assert_ne!(seen[1], start);
    assert_eq!(seen[2], start);

    Ok(())
}

#[test]
fn glider_crosses_the_torus() {
    let glider = Grid::from_alive(8, 8, [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]).unwrap();
    let mut sim = Simulation::new(glider.clone(), RuleSet::default(), true);

    for _ in 0..4 {
        sim.tick();
    }
    assert_eq!(sim.grid().population(), 5);
    assert_ne!(sim.grid(), &glider);

    for _ in 4..32 {
        sim.tick();
    }
    assert_eq!(sim.grid(), &glider);
    assert_eq!(sim.generation(), 32);
}

#[test]
fn block_is_stable() {
    let filled = Grid::from_rows([[true; 2]; 2]).unwrap();
    let inside = Grid::from_alive(6, 6, [(2, 2), (3, 2), (2, 3), (3, 3)]).unwrap();
    let on_edge = Grid::from_alive(6, 6, [(5, 5), (0, 5), (5, 0), (0, 0)]).unwrap();

    for (block, wrap) in [
        (&filled, true),
        (&filled, false),
        (&inside, true),
        (&inside, false),
        (&on_edge, true),
    ] {
        let mut sim = Simulation::new(block.clone(), RuleSet::default(), wrap);

        for generation in 1..=12 {
            assert_eq!(sim.tick(), block, "wrap: {wrap}, generation {generation}");
        }
    }
}

#[test]
fn glider_render() {
    let glider = Grid::from_alive(5, 5, [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]).unwrap();
    let mut sim = Simulation::new(glider, RuleSet::default(), false);

    for _ in 0..4 {
        sim.tick();
    }

    insta::assert_snapshot!(sim.grid().render(&DOTS).trim_end(), @r"
    .....
    ..o..
    ...o.
    .ooo.
    .....
    ");
}

#[test]
fn incomplete_header() {
    assert!(matches!(
        rle::parse("x = 2\nbo!"),
        Err(RleError::InvalidHeader { line: 1, .. })
    ));
}
