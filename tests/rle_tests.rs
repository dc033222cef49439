use std::path::Path;

use lifegrid::RuleSet;
use lifegrid::rle;

const PATTERN_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/rle_pats");

fn read_pattern(name: &str) -> anyhow::Result<String> {
    Ok(std::fs::read_to_string(Path::new(PATTERN_DIR).join(name))?)
}

#[test]
fn test_patterns() -> anyhow::Result<()> {
    let pattern_dir = std::fs::read_dir(PATTERN_DIR)?;
    let mut tested = 0;
    let mut failed = Vec::new();

    for entry in pattern_dir {
        let path = entry?.path();
        let text = std::fs::read_to_string(&path)?;

        match rle::parse(&text) {
            Ok(pattern) => {
                let grid = pattern.seed();
                assert_eq!(
                    (grid.width(), grid.height()),
                    (pattern.width(), pattern.height()),
                    "{path:?}"
                );
                assert!(grid.population() > 0, "{path:?} is empty");
                assert!(pattern.name().is_some(), "{path:?} has no name");

                tested += 1;
            }
            Err(e) => failed.push((path.clone(), e)),
        }
    }

    if !failed.is_empty() {
        for (path, err) in &failed {
            eprintln!("Failed to parse {:?}: {:#}", path, err);
        }

        panic!(
            "{}/{} patterns failed to parse",
            failed.len(),
            tested + failed.len()
        );
    }

    println!("Successfully parsed {} RLE patterns", tested);

    Ok(())
}

#[test]
fn glider() -> anyhow::Result<()> {
    let text = read_pattern("glider.rle")?;
    let pattern = rle::parse(&text)?;

    assert_eq!(pattern.name(), Some("Glider"));
    assert_eq!(pattern.author(), Some("Richard K. Guy"));
    assert_eq!(pattern.rule(), RuleSet::default());
    assert_eq!(
        pattern.seed().live_cells().collect::<Vec<_>>(),
        [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
    );

    Ok(())
}

#[test]
fn gosper_glider_gun() -> anyhow::Result<()> {
    let text = read_pattern("gosper_glider_gun.rle")?;
    let pattern = rle::parse(&text)?;
    let grid = pattern.seed();

    assert_eq!((grid.width(), grid.height()), (36, 9));
    assert_eq!(grid.population(), 36);
    assert_eq!(pattern.comments().len(), 4);

    // The row continued on the next line
    assert_eq!(
        grid.live_cells().filter(|&(_, y)| y == 5).collect::<Vec<_>>(),
        [
            (0, 5),
            (1, 5),
            (10, 5),
            (14, 5),
            (16, 5),
            (17, 5),
            (22, 5),
            (24, 5)
        ]
    );

    Ok(())
}

#[test]
fn pulsar() -> anyhow::Result<()> {
    let text = read_pattern("pulsar.rle")?;
    let grid = rle::parse(&text)?.seed();

    assert_eq!((grid.width(), grid.height()), (13, 13));
    assert_eq!(grid.population(), 48);

    // Symmetric both ways
    for (x, y) in grid.live_cells() {
        assert!(grid.is_alive(12 - x, y));
        assert!(grid.is_alive(x, 12 - y));
    }

    Ok(())
}

#[test]
fn survival_birth_rule_comment_with_crlf() -> anyhow::Result<()> {
    let text = read_pattern("replicator.rle")?;
    let pattern = rle::parse(&text)?;

    assert_eq!(pattern.rule(), RuleSet::named("replicator")?);
    assert_eq!(pattern.rule_name(), Some("1357/1357"));
    assert_eq!(pattern.seed().population(), 12);

    Ok(())
}

#[test]
fn topology_is_ignored() -> anyhow::Result<()> {
    let text = read_pattern("torus_blinker.rle")?;
    let pattern = rle::parse(&text)?;

    assert_eq!(pattern.rule(), RuleSet::default());
    assert_eq!(pattern.seed().to_string().trim_end(), "•••");

    Ok(())
}

#[test]
fn encode_round_trips_patterns() -> anyhow::Result<()> {
    for name in ["glider.rle", "gosper_glider_gun.rle", "pulsar.rle"] {
        let text = read_pattern(name)?;
        let pattern = rle::parse(&text)?;
        let grid = pattern.seed();

        let encoded = rle::encode(&grid, &pattern.rule());
        let decoded = rle::parse(&encoded)?;

        assert_eq!(decoded.seed(), grid, "{name}");
        assert_eq!(decoded.rule(), pattern.rule(), "{name}");
    }

    Ok(())
}
