use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use clap::builder::RangedU64ValueParser;
use vellum_editor::config::{self, DEFAULT_CONFIG_PATH};
use vellum_editor::{Command, CommandOutcome, EditorConfig, SceneEditor};

/// Vellum editor arguments.
#[derive(Parser, Debug)]
#[command(
    name = "vellum-editor",
    version,
    about = "Headless Vellum layer editor",
    long_about = "Edits the layers of a 2D scene with undo and redo.\n\n\
                  Commands are read from --script or, without it, from standard input. \
                  Type \"help\" for the command list."
)]
struct Args {
    /// Configuration file. Defaults to ./editor.toml when present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Maximum number of undo steps, overriding the configuration.
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_undo: Option<usize>,

    /// Run commands from a file and stop at the first failure.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Session name shown in the title.
    #[arg(long, default_value = "untitled")]
    name: String,
}

fn load(args: &Args) -> Result<EditorConfig, config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };
    if let Some(max_undo) = args.max_undo {
        config.max_undo = max_undo;
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let loaded = load(&args);

    let level = loaded
        .as_ref()
        .ok()
        .and_then(|c| c.log_level.clone())
        .unwrap_or_else(|| "info".into());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut editor = match SceneEditor::new(args.name.clone(), &config) {
        Ok(editor) => editor,
        Err(e) => {
            log::error!("Failed to build the initial scene: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.script {
        Some(path) => match File::open(path) {
            Ok(file) => run(&mut editor, BufReader::new(file), false),
            Err(e) => {
                log::error!("failed to open {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => run(&mut editor, io::stdin().lock(), true),
    };

    match result {
        Ok(()) => {
            log::info!("Closing \"{}\"", editor.title());
            ExitCode::SUCCESS
        }
        Err(line) => {
            log::error!("Script stopped at line {line}");
            ExitCode::FAILURE
        }
    }
}

/// Runs commands until the input ends or `quit`.
///
/// In interactive mode failures are reported and skipped; otherwise the
/// first failure stops the run and its line number is returned.
fn run(editor: &mut SceneEditor, input: impl BufRead, interactive: bool) -> Result<(), usize> {
    let mut stdout = io::stdout();
    if interactive {
        let _ = write!(stdout, "{}> ", editor.title());
        let _ = stdout.flush();
    }

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to read input: {e}");
                return Err(line_number);
            }
        };

        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            let outcome = trimmed
                .parse::<Command>()
                .map_err(|e| e.to_string())
                .and_then(|command| editor.run_command(command).map_err(|e| e.to_string()));

            match outcome {
                Ok(CommandOutcome::Quit) => return Ok(()),
                Ok(CommandOutcome::Continue(Some(text))) => {
                    let _ = writeln!(stdout, "{text}");
                }
                Ok(CommandOutcome::Continue(None)) => {}
                Err(e) => {
                    log::warn!("{trimmed}: {e}");
                    if !interactive {
                        return Err(line_number);
                    }
                }
            }
        }

        if interactive {
            let _ = write!(stdout, "{}> ", editor.title());
            let _ = stdout.flush();
        }
    }
    Ok(())
}
