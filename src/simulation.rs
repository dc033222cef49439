use std::io;
use std::ops::ControlFlow;
use std::sync::mpsc;

use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::grid::Grid;
use crate::rule_set::RuleSet;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Renderer I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Consumer of the generations produced by [`Simulation::run`].
pub trait GenerationSink {
    /// Receive generation number `generation`, right after it was computed. Returning
    /// `ControlFlow::Break` stops the run.
    fn accept(&mut self, grid: &Grid, generation: u64) -> Result<ControlFlow<()>, SinkError>;

    /// Called once when the run ends, however it ended.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<F> GenerationSink for F
where
    F: FnMut(&Grid, u64) -> ControlFlow<()>,
{
    fn accept(&mut self, grid: &Grid, generation: u64) -> Result<ControlFlow<()>, SinkError> {
        Ok(self(grid, generation))
    }
}

/// A message sent by [`ChannelSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An owned copy of a generation
    Generation { index: u64, grid: Grid },

    /// The run is over, no more frames will follow
    End,
}

/// Forwards every generation over a channel, so a renderer can live on another thread.
///
/// The run stops as soon as the receiving end is dropped.
pub struct ChannelSink {
    sender: mpsc::Sender<Frame>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<Frame>) -> Self {
        Self { sender }
    }

    /// Create a sink along with the receiver its frames go to.
    pub fn channel() -> (Self, mpsc::Receiver<Frame>) {
        let (sender, receiver) = mpsc::channel();

        (Self::new(sender), receiver)
    }
}

impl GenerationSink for ChannelSink {
    fn accept(&mut self, grid: &Grid, generation: u64) -> Result<ControlFlow<()>, SinkError> {
        let frame = Frame::Generation {
            index: generation,
            grid: grid.clone(),
        };

        if self.sender.send(frame).is_err() {
            debug!("Frame receiver hung up");

            return Ok(ControlFlow::Break(()));
        }

        Ok(ControlFlow::Continue(()))
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        // The receiver may already be gone, in which case nobody is waiting for the end
        let _ = self.sender.send(Frame::End);

        Ok(())
    }
}

/// Drives a grid through successive generations of a rule.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid,
    rule: RuleSet,
    wrap: bool,
    generation: u64,
}

impl Simulation {
    pub fn new(grid: Grid, rule: RuleSet, wrap: bool) -> Self {
        Self {
            grid,
            rule,
            wrap,
            generation: 0,
        }
    }

    /// The current generation
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rule(&self) -> RuleSet {
        self.rule
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    /// Number of ticks so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Advance by one generation and return it.
    pub fn tick(&mut self) -> &Grid {
        self.grid = self.rule.step(&self.grid, self.wrap);
        self.generation += 1;

        trace!(
            generation = self.generation,
            population = self.grid.population(),
            "Tick"
        );

        &self.grid
    }

    /// Tick `generations` times, or until the sink breaks if `None`, handing every new
    /// generation to `sink`. Returns how many generations were computed.
    ///
    /// No pacing happens here; a sink that wants frames spaced out has to wait on its own.
    pub fn run<S>(&mut self, generations: Option<u64>, sink: &mut S) -> Result<u64, SinkError>
    where
        S: GenerationSink + ?Sized,
    {
        info!(
            width = self.grid.width(),
            height = self.grid.height(),
            rule = %self.rule,
            wrap = self.wrap,
            ?generations,
            "Starting simulation"
        );

        let mut ran = 0;

        let res = loop {
            if generations.is_some_and(|n| ran >= n) {
                break Ok(());
            }

            self.tick();
            ran += 1;

            match sink.accept(&self.grid, self.generation) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => {
                    debug!(generation = self.generation, "Sink stopped the simulation");
                    break Ok(());
                }
                Err(e) => break Err(e),
            }
        };

        let finished = sink.finish();
        res?;
        finished?;

        info!(ran, generation = self.generation, "Simulation finished");

        Ok(ran)
    }
}
