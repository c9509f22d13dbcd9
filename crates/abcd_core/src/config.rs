use crate::grid::ArenaBounds;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub participant: ParticipantInfo,
    pub movement: MovementConfig,
    pub arena: ArenaBounds,
    pub rewards: RewardConfig,
    pub memorization: MemorizationConfig,
    pub presentation: PresentationConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

impl TaskConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied and the result is validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    /// Load from path, or use defaults (with env overrides) if the file does not exist.
    /// A file that exists but cannot be read, parsed or validated is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .with_context(|| format!("Invalid config file: {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Config file {} not found, using defaults", path.display());
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to read config file: {}", path.display()))),
        }
    }

    fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: TaskConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the movement and reward logic cannot run with.
    pub fn validate(&self) -> Result<()> {
        let movement = &self.movement;
        positive("movement.grid_step", movement.grid_step)?;
        positive("movement.move_speed", movement.move_speed)?;
        positive("movement.rotation_speed", movement.rotation_speed)?;
        positive("movement.arrival_epsilon", movement.arrival_epsilon)?;
        positive("movement.angle_epsilon", movement.angle_epsilon)?;

        let rewards = &self.rewards;
        positive("rewards.hit_radius", rewards.hit_radius)?;
        positive("rewards.leave_radius", rewards.leave_radius)?;
        non_negative("rewards.completion_delay_secs", rewards.completion_delay_secs)?;
        non_negative("rewards.layout_tolerance", rewards.layout_tolerance)?;

        let memorization = &self.memorization;
        non_negative("memorization.reward_display_secs", memorization.reward_display_secs)?;
        non_negative(
            "memorization.pause_between_rewards_secs",
            memorization.pause_between_rewards_secs,
        )?;
        non_negative(
            "memorization.pause_between_sequences_secs",
            memorization.pause_between_sequences_secs,
        )?;
        non_negative("memorization.lead_out_secs", memorization.lead_out_secs)?;

        let arena = &self.arena;
        non_negative("arena.tolerance", arena.tolerance)?;
        if !(arena.left.is_finite() && arena.right.is_finite() && arena.left < arena.right) {
            bail!("arena.left ({}) must be below arena.right ({})", arena.left, arena.right);
        }
        if !(arena.bottom.is_finite() && arena.top.is_finite() && arena.bottom < arena.top) {
            bail!("arena.bottom ({}) must be below arena.top ({})", arena.bottom, arena.top);
        }

        if self.session.tick_hz == 0 {
            bail!("session.tick_hz must be greater than 0");
        }
        Ok(())
    }

    /// Apply environment variable overrides on top of file-based config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ABCD_PARTICIPANT_ID") {
            self.participant.participant_id = v;
        }
        if let Ok(v) = std::env::var("ABCD_STUDY_ID") {
            self.participant.study_id = v;
        }
        if let Ok(v) = std::env::var("ABCD_SESSION_ID") {
            self.participant.session_id = v;
        }
        if let Ok(v) = std::env::var("ABCD_LAYOUT_PATH") {
            self.session.layout_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ABCD_LOG_DIR") {
            self.logging.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ABCD_PRESENTATION") {
            match v.parse() {
                Ok(mode) => self.presentation.mode = mode,
                Err(e) => tracing::warn!("Ignoring ABCD_PRESENTATION: {}", e),
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

/// Who is being tested. Copied onto every event record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParticipantInfo {
    pub participant_id: String,
    pub study_id: String,
    pub session_id: String,
}

impl Default for ParticipantInfo {
    fn default() -> Self {
        Self {
            participant_id: "TEST_P001".to_string(),
            study_id: "pilot_study".to_string(),
            session_id: "001".to_string(),
        }
    }
}

impl ParticipantInfo {
    pub fn new(
        participant_id: impl Into<String>,
        study_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            study_id: study_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Parse the `PID|STUDY|SESSION` form handed over by web launchers.
    /// Extra `|`-separated parts are ignored.
    pub fn parse_pipe(info: &str) -> Result<Self> {
        let parts: Vec<&str> = info.split('|').map(str::trim).collect();
        if parts.len() < 3 {
            bail!(
                "participant info '{}' must look like PID|STUDY|SESSION",
                info
            );
        }
        if parts[..3].iter().any(|p| p.is_empty()) {
            bail!("participant info '{}' has an empty part", info);
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// Discrete movement tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Distance between neighbouring grid cells.
    pub grid_step: f32,
    /// Translation speed in units per second.
    pub move_speed: f32,
    /// Rotation speed in degrees per second.
    pub rotation_speed: f32,
    /// Distance below which a translation counts as arrived.
    pub arrival_epsilon: f32,
    /// Angle (degrees) below which a rotation counts as arrived.
    pub angle_epsilon: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            grid_step: 10.3,
            move_speed: 5.0,
            rotation_speed: 100.0,
            arrival_epsilon: 0.01,
            angle_epsilon: 0.01,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// A confirm closer than this to the next reward is a hit.
    pub hit_radius: f32,
    /// A revealed marker is hidden once the avatar is farther than this.
    pub leave_radius: f32,
    /// Delay between finding the last reward and the next repetition.
    pub completion_delay_secs: f32,
    /// Per-position tolerance when deciding whether two layouts are identical.
    pub layout_tolerance: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            hit_radius: 0.01,
            leave_radius: 0.05,
            completion_delay_secs: 2.0,
            layout_tolerance: 0.01,
        }
    }
}

impl RewardConfig {
    pub fn completion_delay(&self) -> Duration {
        secs(self.completion_delay_secs)
    }
}

/// Timing of the overview replay shown before free navigation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorizationConfig {
    pub repetitions: u32,
    pub reward_display_secs: f32,
    pub pause_between_rewards_secs: f32,
    pub pause_between_sequences_secs: f32,
    pub lead_out_secs: f32,
}

impl Default for MemorizationConfig {
    fn default() -> Self {
        Self {
            repetitions: 2,
            reward_display_secs: 1.5,
            pause_between_rewards_secs: 0.5,
            pause_between_sequences_secs: 1.0,
            lead_out_secs: 1.0,
        }
    }
}

impl MemorizationConfig {
    pub fn reward_display(&self) -> Duration {
        secs(self.reward_display_secs)
    }

    pub fn pause_between_rewards(&self) -> Duration {
        secs(self.pause_between_rewards_secs)
    }

    pub fn pause_between_sequences(&self) -> Duration {
        secs(self.pause_between_sequences_secs)
    }

    pub fn lead_out(&self) -> Duration {
        secs(self.lead_out_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Full-screen overview replay, then first person with a corner mini-map.
    #[default]
    Classic,
    /// Straight into first person with the mini-map; never replays.
    FreeNavigation,
}

impl FromStr for PresentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "classic" => Ok(PresentationMode::Classic),
            "free_navigation" | "free" => Ok(PresentationMode::FreeNavigation),
            other => Err(format!("unknown presentation mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub mode: PresentationMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Csv,
    Jsonl,
}

impl LogFormat {
    pub fn extension(self) -> &'static str {
        match self {
            LogFormat::Csv => "csv",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(LogFormat::Csv),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub output_dir: PathBuf,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            format: LogFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub layout_path: PathBuf,
    /// Simulation ticks per second.
    pub tick_hz: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout_path: PathBuf::from("layouts.json"),
            tick_hz: 60,
        }
    }
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{} must be a positive number, got {}", name, value);
    }
    Ok(())
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        bail!("{} must be zero or positive, got {}", name, value);
    }
    Ok(())
}

fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0))
}

// ============================================================================
// Tests
// ============================================================================
