//! partitura — evaluate an instruction program and print the resolved score.
//!
//! The program is the parser's output written as YAML (a `ScoreProgram`).
//! Without a program file a short built-in demo is evaluated: a piano and a
//! violin playing against a global tempo change.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use partitura::config::EvalConfig;
use partitura::eval::{Instruction, NoteSpec, RestSpec};
use partitura::score::{InstrumentCall, InstrumentReference};
use partitura::{evaluate_with, Score, ScoreProgram};

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Parser)]
#[command(name = "partitura")]
#[command(version, about = "Evaluate a music-notation instruction program into a score", long_about = None)]
struct Cli {
    /// YAML instruction program (default: built-in demo)
    program: Option<PathBuf>,

    /// Config file path (default: ~/.partitura/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    format: Format,
}

/// Two parts: piano plays a scale fragment and a chord, violin answers
/// after a rest. Tempo is set globally before either starts.
fn demo_program() -> ScoreProgram {
    ScoreProgram {
        globals: vec![Instruction::set("tempo", 100.0)],
        parts: vec![
            InstrumentCall::single(
                InstrumentReference::new("piano"),
                vec![
                    Instruction::note(NoteSpec::new('c').length(4)),
                    Instruction::note(NoteSpec::new('e').length(8)),
                    Instruction::note(NoteSpec::new('g').length(8)),
                    Instruction::Chord(vec![
                        Instruction::note(NoteSpec::new('c').length(2)),
                        Instruction::note(NoteSpec::new('e')),
                        Instruction::note(NoteSpec::new('g')),
                    ]),
                ],
            ),
            InstrumentCall::single(
                InstrumentReference::new("violin").nicknamed("solo"),
                vec![
                    Instruction::rest(RestSpec::new().length(2)),
                    Instruction::set("octave", ">"),
                    Instruction::note(NoteSpec::new('e').length(4).slurred()),
                    Instruction::note(NoteSpec::new('f').sharp()),
                ],
            ),
        ],
    }
}

fn load_program(path: &Path) -> Result<ScoreProgram, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_yaml::from_str(&content).map_err(|e| format!("invalid program {}: {e}", path.display()))
}

fn render(score: &Score, format: Format) -> Result<String, String> {
    match format {
        Format::Yaml => serde_yaml::to_string(score).map_err(|e| e.to_string()),
        Format::Json => serde_json::to_string_pretty(score).map_err(|e| e.to_string()),
    }
}

fn run(cli: &Cli) -> Result<String, String> {
    let config = match &cli.config {
        Some(path) => EvalConfig::from_path(path).map_err(|e| e.to_string())?,
        None => EvalConfig::load().unwrap_or_default(),
    };
    let program = match &cli.program {
        Some(path) => load_program(path)?,
        None => demo_program(),
    };

    let registry = config.registry().map_err(|e| e.to_string())?;
    let score = evaluate_with(&program, registry, config.catalog()).map_err(|e| e.to_string())?;
    log::info!(
        "evaluated {} instrument instance(s) from {} call(s)",
        score.len(),
        program.parts.len()
    );
    render(&score, cli.format)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("partitura: {e}");
            std::process::exit(1);
        }
    }
}
