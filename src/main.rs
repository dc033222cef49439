use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use lifegrid::config::Config;
use lifegrid::io::TerminalSink;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Optional RLE pattern to start from
    let config = Config {
        pattern: env::args_os().nth(1).map(PathBuf::from),
        ..Config::default()
    };

    let mut sim = config
        .build(&mut rand::thread_rng())
        .context("Failed to set up the simulation")?;

    let mut sink = TerminalSink::stdout(config.delay).context("Failed to set up the terminal")?;
    let ran = sim.run(config.generations, &mut sink)?;
    drop(sink);

    println!(
        "Ran {ran} generations of {}, {} cells alive",
        sim.rule(),
        sim.grid().population()
    );

    Ok(())
}
