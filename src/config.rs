use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::grid::Grid;
use crate::grid::GridError;
use crate::rle;
use crate::rle::RleError;
use crate::rule_set::RuleError;
use crate::rule_set::RuleSet;
use crate::simulation::Simulation;

/// Padding around a loaded pattern, and half the side of a random grid.
const DEFAULT_PADDING: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("Minimum live cell count {min} exceeds maximum {max}")]
    LiveBounds { min: usize, max: usize },

    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),

    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),

    #[error("Invalid pattern {}: {source}", .path.display())]
    Pattern {
        path: PathBuf,
        #[source]
        source: RleError,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything needed to set up and pace a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Width of a random grid. Ignored when a pattern is loaded.
    pub width: usize,

    /// Height of a random grid. Ignored when a pattern is loaded.
    pub height: usize,

    /// RLE file to start from instead of a random grid
    pub pattern: Option<PathBuf>,

    /// Rule name or notation. Falls back to the pattern's rule, then standard life.
    pub rule: Option<String>,

    pub wrap: bool,

    /// Bounds on the live cells of a random grid. Default to the whole grid.
    pub min_live: Option<usize>,
    pub max_live: Option<usize>,

    /// Dead cells added on every side of a loaded pattern
    pub padding: usize,

    /// Time between two frames
    pub delay: Duration,

    /// Number of generations to run, or `None` to run until stopped
    pub generations: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 2 * DEFAULT_PADDING,
            height: 2 * DEFAULT_PADDING,
            pattern: None,
            rule: None,
            wrap: true,
            min_live: None,
            max_live: None,
            padding: DEFAULT_PADDING,
            delay: Duration::from_millis(70),
            generations: Some(1000),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }

        if let (Some(min), Some(max)) = (self.min_live, self.max_live) {
            if min > max {
                return Err(ConfigError::LiveBounds { min, max });
            }
        }

        self.rule_set()?;

        Ok(())
    }

    /// The explicitly configured rule, if any.
    pub fn rule_set(&self) -> Result<Option<RuleSet>, RuleError> {
        self.rule.as_deref().map(str::parse).transpose()
    }

    /// Build the initial simulation: the padded pattern if one is configured, otherwise a
    /// random grid.
    pub fn build<R>(&self, rng: &mut R) -> Result<Simulation, ConfigError>
    where
        R: Rng + ?Sized,
    {
        self.validate()?;

        let rule = self.rule_set()?;

        let (grid, rule) = match &self.pattern {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;

                let pattern = rle::parse(&text).map_err(|source| ConfigError::Pattern {
                    path: path.clone(),
                    source,
                })?;

                let grid = pattern.seed().pad_all(self.padding)?;

                (grid, rule.unwrap_or(pattern.rule()))
            }
            None => {
                let grid = Grid::try_new(self.width, self.height)?;
                let min = self.min_live.unwrap_or(0);
                let max = self.max_live.unwrap_or(self.width * self.height);

                (grid.fill_random(min, max, rng)?, rule.unwrap_or_default())
            }
        };

        debug!(
            width = grid.width(),
            height = grid.height(),
            population = grid.population(),
            %rule,
            "Built simulation"
        );

        Ok(Simulation::new(grid, rule, self.wrap))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::rule_set::B3S23;

    fn write_pattern(name: &str, text: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lifegrid-{}-{name}.rle", std::process::id()));
        fs::write(&path, text).unwrap();

        path
    }

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!((config.width, config.height, config.padding), (40, 40, 20));
        assert!(config.wrap);
        assert_eq!(config.generations, Some(1000));
        assert_eq!(config.delay, Duration::from_millis(70));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = Config {
            width: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGrid { .. })));

        let config = Config {
            min_live: Some(5),
            max_live: Some(4),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LiveBounds { min: 5, max: 4 })
        ));

        let config = Config {
            rule: Some("not a rule".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Rule(RuleError::UnknownRule { .. }))
        ));
    }

    #[test]
    fn random_grid_respects_bounds() {
        let config = Config {
            width: 8,
            height: 6,
            min_live: Some(10),
            max_live: Some(12),
            rule: Some("highlife".to_string()),
            wrap: false,
            ..Config::default()
        };

        let sim = config.build(&mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!((sim.grid().width(), sim.grid().height()), (8, 6));
        assert!((10..=12).contains(&sim.grid().population()));
        assert_eq!(sim.rule(), "B36/S23".parse::<RuleSet>().unwrap());
        assert!(!sim.wrap());
    }

    #[test]
    fn live_bounds_larger_than_grid() {
        let config = Config {
            width: 2,
            height: 2,
            max_live: Some(5),
            ..Config::default()
        };

        assert!(matches!(
            config.build(&mut StdRng::seed_from_u64(1)),
            Err(ConfigError::Grid(GridError::LiveBounds { .. }))
        ));
    }

    #[test]
    fn oversized_random_grid() {
        let config = Config {
            width: usize::MAX,
            height: 2,
            ..Config::default()
        };

        assert!(matches!(
            config.build(&mut StdRng::seed_from_u64(1)),
            Err(ConfigError::Grid(GridError::Overflow))
        ));
    }

    #[test]
    fn pattern_is_padded_and_keeps_its_rule() {
        let path = write_pattern("padded", "x = 3, y = 1, rule = B36/S23\n3o!");
        let config = Config {
            pattern: Some(path.clone()),
            padding: 2,
            ..Config::default()
        };

        let sim = config.build(&mut StdRng::seed_from_u64(1)).unwrap();
        fs::remove_file(path).unwrap();

        assert_eq!(
            sim.grid(),
            &Grid::from_alive(7, 5, [(2, 2), (3, 2), (4, 2)]).unwrap()
        );
        assert_eq!(sim.rule(), RuleSet::named("highlife").unwrap());
    }

    #[test]
    fn explicit_rule_overrides_pattern() {
        let path = write_pattern("override", "x = 1, y = 1, rule = B36/S23\no!");
        let config = Config {
            pattern: Some(path.clone()),
            rule: Some("B3/S23".to_string()),
            ..Config::default()
        };

        let sim = config.build(&mut StdRng::seed_from_u64(1)).unwrap();
        fs::remove_file(path).unwrap();

        assert_eq!(sim.rule(), B3S23);
    }

    #[test]
    fn pattern_errors_carry_the_path() {
        let path = write_pattern("broken", "x = 2\nbo!");
        let config = Config {
            pattern: Some(path.clone()),
            ..Config::default()
        };

        let err = config.build(&mut StdRng::seed_from_u64(1)).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(
            &err,
            ConfigError::Pattern { path: p, source: RleError::InvalidHeader { .. } } if p == &path
        ));
    }

    #[test]
    fn missing_pattern_file() {
        let config = Config {
            pattern: Some(Path::new("/nonexistent/lifegrid.rle").to_path_buf()),
            ..Config::default()
        };

        assert!(matches!(
            config.build(&mut StdRng::seed_from_u64(1)),
            Err(ConfigError::Io { .. })
        ));
    }
}
