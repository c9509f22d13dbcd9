//! Reward layouts: the static, load-once description of where each reward
//! sits for every block of trials.
//!
//! The on-disk document is JSON:
//!
//! ```json
//! {
//!   "configurations": [
//!     { "configName": "ABCD_1", "rewardPositions": [{"x": 0, "y": 0.5, "z": 5}, ...] }
//!   ],
//!   "trialsPerConfig": 3
//! }
//! ```

use crate::error::LayoutError;
use crate::grid::GridPosition;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every configuration carries exactly this many reward slots (A..D), even
/// when its sequence only uses the first three.
pub const REWARD_SLOTS: usize = 4;

const REWARD_LETTERS: [char; REWARD_SLOTS] = ['A', 'B', 'C', 'D'];

/// Letter label for a reward slot (`0 -> 'A'`).
pub fn reward_letter(index: usize) -> char {
    REWARD_LETTERS.get(index).copied().unwrap_or('?')
}

/// Whether a configuration name denotes the short, three-reward sequence.
pub fn is_short_sequence_name(name: &str) -> bool {
    name.starts_with("ABC") && !name.starts_with("ABCD")
}

/// One named layout of four reward locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardConfiguration {
    pub name: String,
    pub reward_positions: [GridPosition; REWARD_SLOTS],
}

impl RewardConfiguration {
    pub fn new(name: impl Into<String>, reward_positions: [GridPosition; REWARD_SLOTS]) -> Self {
        Self {
            name: name.into(),
            reward_positions,
        }
    }

    /// 3 for ABC-type configurations, 4 otherwise.
    pub fn sequence_length(&self) -> usize {
        if self.is_short_sequence() {
            3
        } else {
            4
        }
    }

    pub fn is_short_sequence(&self) -> bool {
        is_short_sequence_name(&self.name)
    }

    /// Trial type label written to the event log.
    pub fn trial_type(&self) -> &'static str {
        if self.is_short_sequence() {
            "ABC"
        } else {
            "ABCD"
        }
    }

    /// Whether any of the four reward positions differ from `other` by more
    /// than `tolerance`.
    pub fn layout_differs(&self, other: &RewardConfiguration, tolerance: f32) -> bool {
        self.reward_positions
            .iter()
            .zip(other.reward_positions.iter())
            .any(|(a, b)| !a.approx_eq(b, tolerance))
    }
}

/// All configurations for a session plus the repetition count per block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSet {
    configurations: Vec<RewardConfiguration>,
    trials_per_config: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutDocument {
    configurations: Vec<RawConfiguration>,
    trials_per_config: i64,
}

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    #[serde(rename = "configName", alias = "name")]
    name: String,
    #[serde(rename = "rewardPositions", alias = "reward_positions")]
    reward_positions: Vec<GridPosition>,
}

impl ConfigurationSet {
    /// Build a set directly, validating the same invariants as the loader.
    pub fn new(
        configurations: Vec<RewardConfiguration>,
        trials_per_config: u32,
    ) -> Result<Self, LayoutError> {
        if configurations.is_empty() {
            return Err(LayoutError::NoConfigurations);
        }
        if trials_per_config == 0 {
            return Err(LayoutError::TrialsPerConfig(0));
        }
        for (index, config) in configurations.iter().enumerate() {
            validate_named(index, &config.name, &config.reward_positions)?;
        }
        Ok(Self {
            configurations,
            trials_per_config,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LayoutError> {
        let doc: LayoutDocument = serde_json::from_str(raw)?;

        if doc.trials_per_config < 1 {
            return Err(LayoutError::TrialsPerConfig(doc.trials_per_config));
        }
        let trials_per_config = u32::try_from(doc.trials_per_config)
            .map_err(|_| LayoutError::TrialsPerConfig(doc.trials_per_config))?;

        let mut configurations = Vec::with_capacity(doc.configurations.len());
        for (index, raw) in doc.configurations.into_iter().enumerate() {
            let positions: [GridPosition; REWARD_SLOTS] = raw
                .reward_positions
                .as_slice()
                .try_into()
                .map_err(|_| LayoutError::PositionCount {
                    index,
                    name: raw.name.clone(),
                    found: raw.reward_positions.len(),
                })?;
            configurations.push(RewardConfiguration::new(raw.name, positions));
        }

        let set = Self::new(configurations, trials_per_config)?;
        tracing::info!(
            "Loaded {} configurations ({} trials each)",
            set.len(),
            set.trials_per_config
        );
        Ok(set)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn get(&self, index: usize) -> Option<&RewardConfiguration> {
        self.configurations.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewardConfiguration> {
        self.configurations.iter()
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn trials_per_config(&self) -> u32 {
        self.trials_per_config
    }
}

impl std::ops::Index<usize> for ConfigurationSet {
    type Output = RewardConfiguration;

    fn index(&self, index: usize) -> &RewardConfiguration {
        &self.configurations[index]
    }
}

fn validate_named(
    index: usize,
    name: &str,
    positions: &[GridPosition; REWARD_SLOTS],
) -> Result<(), LayoutError> {
    if name.trim().is_empty() {
        return Err(LayoutError::EmptyName { index });
    }
    if positions.iter().any(|p| !p.is_finite()) {
        return Err(LayoutError::NonFiniteCoordinate {
            index,
            name: name.to_string(),
        });
    }
    Ok(())
}
