//! wordcue CLI
//!
//! Word-judgement reaction-time experiments with EEG triggers.

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wordcue::{
    config::Config,
    core::{summarize, IntroOutcome, ManifestBuilder, Session, SystemClock, WordList},
    display::TerminalScreen,
    export::{read_results, save_and_record},
    ledger::SessionLedger,
    participant::{self, Gender, IntakeDefaults, IntakeError},
    trigger::{open_port, TriggerPort, RESET_CODE},
    trigger_code_table, VERSION,
};

const LOG_ENV: &str = "WORDCUE_LOG";

#[derive(Parser)]
#[command(name = "wordcue")]
#[command(version = VERSION)]
#[command(about = "Word-judgement reaction-time experiments with EEG triggers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment session
    Run {
        /// Participant ID (asked for if omitted)
        #[arg(long)]
        id: Option<String>,

        /// Participant age (asked for if omitted)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=120))]
        age: Option<u32>,

        /// Participant gender: female, male or other (asked for if omitted)
        #[arg(long)]
        gender: Option<Gender>,

        /// Word file (overrides config)
        #[arg(long)]
        words: Option<PathBuf>,

        /// Folder for result files (overrides config)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Session length in seconds (overrides config)
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Trigger device file (overrides config)
        #[arg(long)]
        trigger_device: Option<PathBuf>,

        /// Byte offset for the trigger device, e.g. 888 for LPT1 on /dev/port
        #[arg(long)]
        trigger_offset: Option<u64>,

        /// Skip consent and instruction screens
        #[arg(long)]
        skip_intro: bool,

        /// Seed for condition and word randomisation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check a word file and show how many words each condition has
    Words {
        /// Word file (defaults to the configured one)
        path: Option<PathBuf>,
    },

    /// Summarise an existing result file
    Report {
        /// Result CSV written by `run`
        file: PathBuf,
    },

    /// Show cumulative session statistics
    Status,

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },

    /// Display consent text, instructions and trigger codes
    Consent,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            id,
            age,
            gender,
            words,
            output,
            duration_secs,
            trigger_device,
            trigger_offset,
            skip_intro,
            seed,
        } => {
            let mut config = load_config();
            if let Some(path) = words {
                config.word_list = path;
            }
            if let Some(path) = output {
                config.save_folder = path;
            }
            if let Some(secs) = duration_secs {
                config.session_duration = Duration::from_secs(secs);
            }
            if trigger_device.is_some() {
                config.trigger.device = trigger_device;
            }
            if trigger_offset.is_some() {
                config.trigger.offset = trigger_offset;
            }

            let defaults = IntakeDefaults { id, age, gender };
            cmd_run(config, defaults, skip_intro, seed);
        }
        Commands::Words { path } => {
            init_stderr_tracing();
            cmd_words(path);
        }
        Commands::Report { file } => {
            init_stderr_tracing();
            cmd_report(&file);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config { init } => {
            cmd_config(init);
        }
        Commands::Consent => {
            cmd_consent();
        }
    }
}

fn cmd_run(config: Config, defaults: IntakeDefaults, skip_intro: bool, seed: Option<u64>) {
    println!("wordcue v{VERSION}");
    println!();

    if let Err(e) = config.validate() {
        exit_with(e);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    init_file_tracing(&config.data_path.join("wordcue.log"));

    // Load words before taking over the terminal so problems are visible.
    let delimiter = config.delimiter_byte().unwrap_or_else(|e| exit_with(e));
    let words = WordList::load(&config.word_list, delimiter).unwrap_or_else(|e| exit_with(e));
    let counts = words.count_by_condition();
    for condition in &config.conditions {
        let n = counts.get(&Some(condition.id)).copied().unwrap_or(0);
        println!("  Condition {} ({}): {} words", condition.id, condition.prompt, n);
        if n == 0 {
            eprintln!("Warning: No words for condition {}", condition.id);
        }
    }
    println!(
        "  Session duration: {}s",
        config.session_duration.as_secs()
    );
    match &config.trigger.device {
        Some(device) => println!("  Trigger device: {}", device.display()),
        None => println!("  Trigger device: none (codes are only logged)"),
    }
    println!();

    let stdin = std::io::stdin();
    let participant = match participant::collect(defaults, &mut stdin.lock(), &mut std::io::stdout())
    {
        Ok(p) => p,
        Err(IntakeError::Cancelled) => {
            println!("Intake cancelled.");
            return;
        }
        Err(e) => exit_with(e),
    };

    let mut port = open_port(&config.trigger).unwrap_or_else(|e| exit_with(e));
    let mut ledger = SessionLedger::with_persistence(config.data_path.join("ledger.json"));
    let manifests = ManifestBuilder::new();
    let clock = SystemClock::new();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!(
        session = %manifests.session_id(),
        participant = %participant.id,
        "starting session"
    );

    if skip_intro {
        // The intro normally clears the line before the first trial.
        port.write(RESET_CODE).unwrap_or_else(|e| exit_with(e));
    }

    let mut screen = TerminalScreen::new(config.abort_key).unwrap_or_else(|e| exit_with(e));
    let result = {
        let mut session = Session::new(
            &config,
            &participant,
            &mut screen,
            &mut port,
            &clock,
            &mut rng,
        );
        let intro = if skip_intro {
            Ok(IntroOutcome::Completed)
        } else {
            session.run_intro()
        };
        match intro {
            Ok(IntroOutcome::Completed) => session.run(&words).map(Some),
            Ok(IntroOutcome::Aborted) => Ok(None),
            Err(e) => Err(e),
        }
    };
    // Restore the terminal before printing anything.
    drop(screen);
    let _ = port.write(RESET_CODE);

    let outcome = match result {
        Ok(Some(outcome)) => outcome,
        Ok(None) => {
            println!("Experiment quit before the first trial.");
            return;
        }
        Err(e) => exit_with(e),
    };

    if outcome.end_reason == wordcue::EndReason::Aborted {
        println!("Experiment quit by user.");
    }

    let summary = summarize(&outcome.results);
    match save_and_record(
        &config.save_folder,
        &participant,
        &outcome,
        &summary,
        &manifests,
        &mut ledger,
    ) {
        Ok(saved) => {
            if let Some(ref path) = saved.data_file {
                println!("Data saved to: {}", path.display());
            }
            println!("Manifest saved to: {}", saved.manifest_file.display());
        }
        Err(e) => {
            // Show what was collected before failing.
            println!();
            println!("{summary}");
            exit_with(format!("could not save results: {e}"));
        }
    }

    println!();
    println!("{summary}");

    if let Err(e) = ledger.save() {
        eprintln!("Warning: Could not save session ledger: {e}");
    }
}

fn cmd_words(path: Option<PathBuf>) {
    let config = load_config();
    if let Err(e) = config.validate() {
        exit_with(e);
    }
    let path = path.unwrap_or(config.word_list.clone());

    let delimiter = config.delimiter_byte().unwrap_or_else(|e| exit_with(e));
    let words = WordList::load(&path, delimiter).unwrap_or_else(|e| exit_with(e));

    println!("Word list: {}", path.display());
    println!("  Total words: {}", words.len());

    let counts = words.count_by_condition();
    for condition in &config.conditions {
        let n = counts.get(&Some(condition.id)).copied().unwrap_or(0);
        println!("  Condition {} ({}): {}", condition.id, condition.prompt, n);
    }

    let unused: Vec<String> = counts
        .iter()
        .filter_map(|(c, n)| match c {
            Some(id) if config.condition(*id).is_none() => Some(format!("{id} ({n})")),
            _ => None,
        })
        .collect();
    if !unused.is_empty() {
        println!("  Not in any configured condition: {}", unused.join(", "));
    }
    if let Some(n) = counts.get(&None) {
        println!("  Missing or invalid condition: {n}");
    }
}

fn cmd_report(file: &Path) {
    let results = read_results(file).unwrap_or_else(|e| exit_with(e));
    println!("{}", file.display());
    println!();
    println!("{}", summarize(&results));
}

fn cmd_status() {
    let config = load_config();

    println!("wordcue Status");
    println!("==============");
    println!();
    println!("Configuration:");
    println!("  Word list: {}", config.word_list.display());
    println!("  Save folder: {}", config.save_folder.display());
    println!(
        "  Session duration: {}s",
        config.session_duration.as_secs()
    );
    match &config.trigger.device {
        Some(device) => println!("  Trigger device: {}", device.display()),
        None => println!("  Trigger device: none"),
    }
    println!();

    let ledger_path = config.data_path.join("ledger.json");
    if ledger_path.exists() {
        let ledger = SessionLedger::with_persistence(ledger_path);
        println!("{}", ledger.summary());
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config(init: bool) {
    let config = load_config();

    if init {
        if let Err(e) = config.save() {
            exit_with(e);
        }
        println!("Configuration written.");
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_consent() {
    let config = load_config();

    println!("{}", config.consent_text.join("\n\n"));
    println!();
    println!("{}", config.instruction_text.join("\n\n"));
    println!();
    println!("Trigger codes:");
    println!("{}", trigger_code_table(&config));
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| exit_with(e))
}

fn exit_with(e: impl Display) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr for commands that do not take over the terminal.
fn init_stderr_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to a file while the stimulus display owns the terminal.
fn init_file_tracing(path: &Path) {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter())
                .try_init();
        }
        Err(e) => {
            // No logs rather than log lines drawn over the stimuli.
            eprintln!("Warning: Could not open log file {}: {e}", path.display());
        }
    }
}
