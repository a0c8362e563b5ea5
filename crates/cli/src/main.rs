use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use lrgen_codegen::{EmitConfig, Target};
use lrgen_ir::ParserStates;
use tracing::{debug, info};

/// Output format for diagnostics and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Language of the generated parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    /// Tables and reducer lambdas for the Python runtime
    Python,
    /// Typed tables and a reduce dispatcher for the Rust runtime
    Rust,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Python => Target::Python,
            TargetArg::Rust => Target::Rust,
        }
    }
}

/// LR parser generator backend.
#[derive(Parser)]
#[command(name = "lrgen", version, about = "LR parser generator backend")]
struct Cli {
    /// Output format for errors and reports (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a parser from parser-table IR JSON
    Generate {
        /// Path to the IR JSON document
        input: PathBuf,
        /// Target language
        #[arg(long, value_enum)]
        target: TargetArg,
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emitter configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that IR JSON can be generated for every target
    Check {
        /// Path to the IR JSON document
        input: PathBuf,
        /// Emitter configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            input,
            target,
            out,
            config,
        } => {
            cmd_generate(
                &input,
                target.into(),
                out.as_deref(),
                config.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Check { input, config } => {
            cmd_check(&input, config.as_deref(), cli.output, cli.quiet);
        }
    }
}

// ── generate ─────────────────────────────────────────────────────────

fn cmd_generate(
    input: &Path,
    target: Target,
    out: Option<&Path>,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let states = load_states(input, output, quiet);
    let config = load_config(config_path, output, quiet);

    // Render fully before touching the output file.
    let text = match lrgen_codegen::render(&states, target, &config) {
        Ok(text) => text,
        Err(e) => {
            let msg = format!("error generating {} parser: {}", target, e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    match out {
        Some(path) => {
            if let Err(e) = fs::write(path, &text) {
                let msg = format!("error writing '{}': {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
            info!(path = %path.display(), bytes = text.len(), "wrote {} parser", target);
            if !quiet && output == OutputFormat::Text {
                eprintln!("Generated {} parser: {}", target, path.display());
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if let Err(e) = handle
                .write_all(text.as_bytes())
                .and_then(|_| handle.flush())
            {
                let msg = format!("error writing output: {}", e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        }
    }
}

// ── check ────────────────────────────────────────────────────────────

fn cmd_check(input: &Path, config_path: Option<&Path>, output: OutputFormat, quiet: bool) {
    let states = load_states(input, output, quiet);
    let config = load_config(config_path, output, quiet);

    for target in [Target::Python, Target::Rust] {
        if let Err(e) = lrgen_codegen::render(&states, target, &config) {
            let msg = format!("{}: {} target: {}", input.display(), target, e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
        debug!(%target, "dry run succeeded");
    }

    let terminals = states.terminals().len();
    let nonterminals = states.live_nonterminals().len();
    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "ok": true,
                "states": states.states.len(),
                "productions": states.prods.len(),
                "terminals": terminals,
                "nonterminals": nonterminals,
                "goals": states
                    .init_state_map
                    .keys()
                    .map(|goal| goal.pretty())
                    .collect::<Vec<_>>(),
            });
            println!("{}", report);
        }
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "{}: ok ({} states, {} productions, {} terminals, {} nonterminals)",
                    input.display(),
                    states.states.len(),
                    states.prods.len(),
                    terminals,
                    nonterminals
                );
            }
        }
    }
}

// ── helpers ──────────────────────────────────────────────────────────

fn load_states(path: &Path, output: OutputFormat, quiet: bool) -> ParserStates {
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match lrgen_ir::from_json(&text) {
        Ok(states) => {
            info!(
                path = %path.display(),
                states = states.states.len(),
                prods = states.prods.len(),
                "loaded IR"
            );
            states
        }
        Err(e) => {
            let msg = format!("error loading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>, output: OutputFormat, quiet: bool) -> EmitConfig {
    let Some(path) = path else {
        return EmitConfig::default();
    };
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading config '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            let msg = format!("error parsing config '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
