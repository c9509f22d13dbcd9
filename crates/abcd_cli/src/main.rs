use abcd_core::{
    reward_letter, ConfigurationSet, EventLog, LogFormat, ParticipantInfo, PresentationMode,
    TaskConfig,
};
use abcd_recorder::open_sink;
use abcd_task::{adapter_for, Session};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

mod logging;
mod realtime;
mod replay;
mod script;

#[derive(Parser, Debug)]
#[command(name = "abcd", author, version, about = "ABCD reward-sequence navigation task", long_about = None)]
struct Cli {
    /// Path to the TOML task config
    #[arg(short, long, default_value = "task.toml", global = true)]
    config: PathBuf,

    /// Emit operator logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Also write operator logs to a daily file in this directory
    #[arg(long, global = true)]
    trace_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a session in real time, reading keys from stdin
    Run(SessionArgs),

    /// Run a session from a script of timed inputs
    Replay {
        #[command(flatten)]
        session: SessionArgs,

        /// Script of `<seconds> <action>` lines
        #[arg(long)]
        script: PathBuf,

        /// Seconds to keep ticking after the last scripted action
        #[arg(long, default_value_t = 5.0)]
        linger: f64,
    },

    /// Validate a layout document and list its configurations
    Check {
        /// Layout JSON (defaults to the configured layout path)
        #[arg(long)]
        layouts: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Layout JSON
    #[arg(long)]
    layouts: Option<PathBuf>,

    /// Participant as PID|STUDY|SESSION
    #[arg(short, long, env = "ABCD_PARTICIPANT_INFO")]
    participant: Option<String>,

    /// classic or free_navigation
    #[arg(long)]
    mode: Option<PresentationMode>,

    /// csv or jsonl
    #[arg(long)]
    format: Option<LogFormat>,

    /// Directory for results files
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SessionArgs {
    fn apply(&self, config: &mut TaskConfig) -> Result<()> {
        if let Some(path) = &self.layouts {
            config.session.layout_path = path.clone();
        }
        if let Some(info) = &self.participant {
            config.participant = ParticipantInfo::parse_pipe(info)?;
        }
        if let Some(mode) = self.mode {
            config.presentation.mode = mode;
        }
        if let Some(format) = self.format {
            config.logging.format = format;
        }
        if let Some(dir) = &self.output {
            config.logging.output_dir = dir.clone();
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let guard = logging::init_tracing(cli.log_json, cli.trace_dir.as_deref());

    if let Err(e) = dispatch(cli).await {
        error!("{:#}", e);
        drop(guard);
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = TaskConfig::load_or_default(&cli.config)?;

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut config)?;
            let session = build_session(&config)?;
            realtime::run(session, config.session.tick_interval()).await
        }
        Command::Replay {
            session: args,
            script,
            linger,
        } => {
            args.apply(&mut config)?;
            let text = std::fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            let entries = script::parse_script(&text)
                .with_context(|| format!("Invalid script {}", script.display()))?;
            let session = build_session(&config)?;
            let snapshot = replay::run(session, &entries, config.session.tick_interval(), linger);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        Command::Check { layouts } => {
            let path = layouts.unwrap_or(config.session.layout_path);
            check(&path, config.rewards.layout_tolerance)
        }
    }
}

fn load_layouts(path: &std::path::Path) -> Result<ConfigurationSet> {
    ConfigurationSet::from_path(path)
        .with_context(|| format!("Failed to load reward layouts from {}", path.display()))
}

fn build_session(config: &TaskConfig) -> Result<Session> {
    let layouts = load_layouts(&config.session.layout_path)?;
    let opened = open_sink(&config.logging, &config.participant)?;
    let log = EventLog::new(opened.sink, config.participant.clone());
    info!(
        "Participant {} / study {} / session {} (run {})",
        config.participant.participant_id,
        config.participant.study_id,
        config.participant.session_id,
        log.run_id()
    );
    Ok(Session::new(
        config,
        layouts,
        adapter_for(config.presentation.mode),
        log,
    ))
}

fn check(path: &std::path::Path, tolerance: f32) -> Result<()> {
    let layouts = load_layouts(path)?;
    println!(
        "{}: {} configurations, {} trials each",
        path.display(),
        layouts.len(),
        layouts.trials_per_config()
    );
    let mut previous = None;
    for (index, config) in layouts.iter().enumerate() {
        let positions: Vec<String> = config
            .reward_positions
            .iter()
            .take(config.sequence_length())
            .enumerate()
            .map(|(i, p)| format!("{}={}", reward_letter(i), p))
            .collect();
        let replay = match previous {
            Some(prev) if !config.layout_differs(prev, tolerance) => " (same layout, no replay)",
            _ => "",
        };
        println!(
            "  [{}] {} {}: {}{}",
            index,
            config.name,
            config.trial_type(),
            positions.join(" "),
            replay
        );
        previous = Some(config);
    }
    Ok(())
}
