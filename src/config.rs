use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::fixed_math::{set_arithmetic_mode, ArithmeticMode};
use crate::pathfinding::DEFAULT_SLOW_SEARCH_EXPANSIONS;

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";

/// Static configuration loaded once at startup. Every peer of a lockstep
/// session must load the same values: changing them mid-game breaks
/// determinism.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct InitialConfig {
    /// Overflow handling for `Fixed` operators on the simulation thread.
    pub arithmetic_mode: ArithmeticMode,
    /// Points to reserve up front in a navigation graph. Zero reserves
    /// nothing.
    pub point_capacity: usize,
    /// Searches expanding more points than this log a warning.
    pub slow_search_expansions: usize,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            arithmetic_mode: ArithmeticMode::default(),
            point_capacity: 0,
            slow_search_expansions: DEFAULT_SLOW_SEARCH_EXPANSIONS,
        }
    }
}

impl InitialConfig {
    /// Install the configured arithmetic mode on the calling thread and
    /// return the mode it replaced.
    pub fn apply(&self) -> ArithmeticMode {
        let previous = set_arithmetic_mode(self.arithmetic_mode);
        info!("Arithmetic mode: {:?}", self.arithmetic_mode);
        previous
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

/// Load the initial configuration from a RON file.
///
/// Never fails: a missing or malformed file logs an error and yields
/// [`InitialConfig::default`].
pub fn load_initial_config(path: impl AsRef<Path>) -> InitialConfig {
    let path = path.as_ref();

    match std::fs::read_to_string(path) {
        Ok(contents) => match ron::from_str::<InitialConfig>(&contents) {
            Ok(config) => {
                info!("Loaded initial config from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to parse initial config: {}", e);
                error!("Using default InitialConfig");
                InitialConfig::default()
            }
        },
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            error!("Using default InitialConfig");
            InitialConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_math::{arithmetic_mode, with_arithmetic_mode};
    use std::io::Write;

    #[test]
    fn parses_partial_file_with_defaults() {
        let config: InitialConfig = ron::from_str("(point_capacity: 128)").unwrap();
        assert_eq!(config.point_capacity, 128);
        assert_eq!(config.slow_search_expansions, DEFAULT_SLOW_SEARCH_EXPANSIONS);
        assert_eq!(config.arithmetic_mode, ArithmeticMode::default());
    }

    #[test]
    fn ron_round_trip() {
        let config = InitialConfig {
            arithmetic_mode: ArithmeticMode::Fast,
            point_capacity: 10,
            slow_search_expansions: 20,
        };
        let text = config.to_ron().unwrap();
        assert!(text.contains("Fast"));
        assert_eq!(ron::from_str::<InitialConfig>(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_initial_config(dir.path().join("nope.ron"));
        assert_eq!(config, InitialConfig::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(point_capacity: \"lots\")").unwrap();
        assert_eq!(load_initial_config(file.path()), InitialConfig::default());
    }

    #[test]
    fn loads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(arithmetic_mode: Checked, slow_search_expansions: 7)").unwrap();
        let config = load_initial_config(file.path());
        assert_eq!(config.arithmetic_mode, ArithmeticMode::Checked);
        assert_eq!(config.slow_search_expansions, 7);
    }

    #[test]
    fn apply_installs_mode() {
        with_arithmetic_mode(ArithmeticMode::Checked, || {
            let config = InitialConfig {
                arithmetic_mode: ArithmeticMode::Fast,
                ..InitialConfig::default()
            };
            assert_eq!(config.apply(), ArithmeticMode::Checked);
            assert_eq!(arithmetic_mode(), ArithmeticMode::Fast);
        });
    }
}
