use clap::{ArgAction, Parser, Subcommand};
use imgshrink::compression::RustCompressor;
use imgshrink::config::{self, AppConfig, CONFIG_FILE_NAME};
use imgshrink::dragdrop::{DragEvent, DropSurface};
use imgshrink::preview::FsPlatform;
use imgshrink::workbench::{Intake, Workbench};
use imgshrink::{intake, output, report};
use log::{debug, error};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};

type Bench = Workbench<RustCompressor, FsPlatform>;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imgshrink")]
#[command(about = "Shrink images to a size budget")]
#[command(long_about = "\
Shrink images to a size budget

Every accepted image is scaled so its longest edge fits the max dimension,
re-encoded, and shrunk further until it fits the max size. The result is
saved as compressed_<name> in the download directory.

Settings come from, in increasing priority:
  stock defaults → imgshrink.toml → command-line flags

Run 'imgshrink gen-config' to generate a documented imgshrink.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file [default: ./imgshrink.toml when present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Flags that override the range controls and download location.
#[derive(clap::Args, Clone, Default)]
struct ControlArgs {
    /// Target size in MB (0.1-10)
    #[arg(long)]
    max_size_mb: Option<f64>,

    /// Longest edge in pixels (100-4096)
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Encoder quality hint (0.1-1.0)
    #[arg(long)]
    quality: Option<f32>,

    /// Where downloads are saved
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Compress one image and save the result
    Compress {
        file: PathBuf,

        #[command(flatten)]
        controls: ControlArgs,

        /// Print the result as JSON instead of panels
        #[arg(long)]
        json: bool,

        /// Also write an HTML before/after page
        #[arg(long)]
        report: Option<PathBuf>,

        /// Compress only; do not save the result
        #[arg(long)]
        no_download: bool,
    },
    /// Interactive session: drop files onto the terminal, adjust, download
    Session(ControlArgs),
    /// Print a stock imgshrink.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
        Command::Compress {
            file,
            controls,
            json,
            report,
            no_download,
        } => {
            let config = resolve_config(cli.config.as_deref())?;
            let bench = build_workbench(&config, &controls)?;
            run_compress(bench, &file, json, report.as_deref(), no_download).await
        }
        Command::Session(controls) => {
            let config = resolve_config(cli.config.as_deref())?;
            let bench = build_workbench(&config, &controls)?;
            run_session(bench).await
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn resolve_config(explicit: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => {
            debug!("looking for ./{CONFIG_FILE_NAME}");
            config::load_config(Path::new("."))
        }
    }
}

fn build_workbench(config: &AppConfig, args: &ControlArgs) -> Result<Bench, Box<dyn std::error::Error>> {
    let mut controls = config.compression.to_controls();
    if let Some(mb) = args.max_size_mb {
        controls.set_max_size_mb(mb);
    }
    if let Some(px) = args.max_dimension {
        controls.set_max_dimension(px);
    }
    if let Some(q) = args.quality {
        controls.set_quality(q);
    }
    let download_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.download_dir.clone());

    Ok(Workbench::new(RustCompressor::new(), FsPlatform::new(download_dir)?)
        .with_controls(controls)
        .with_base_options(config.compression.to_base_options())
        .with_download_prefix(config.output.download_prefix.clone()))
}

async fn run_compress(
    mut bench: Bench,
    path: &Path,
    json: bool,
    report_path: Option<&Path>,
    no_download: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let file = intake::read_file(path)?;
    let outcome = bench.select_file(file).await;

    let saved = match &outcome {
        Ok(Intake::Rejected) => return Ok(ExitCode::from(2)),
        Ok(Intake::Accepted) if !no_download => bench.download()?,
        Ok(Intake::Accepted) => None,
        Err(e) => {
            error!("{e}");
            None
        }
    };

    let view = bench.view();
    if let Some(report_path) = report_path {
        report::write_report(&view, report_path)?;
    }
    if json {
        let doc = serde_json::json!({ "view": view, "saved_to": saved });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        output::print_panel(&view);
        if let Some(saved) = &saved {
            println!("Saved {saved}");
        }
    }

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// One line of the interactive session.
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Size(f64),
    Dimension(u32),
    Quality(f32),
    Recompress,
    Download,
    Cancel,
    Reset,
    Status,
    Help,
    Quit,
    /// Anything else is treated as a dropped path.
    Drop(String),
    Invalid(String),
}

fn parse_command(line: &str) -> SessionCommand {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((w, a)) => (w, a.trim()),
        None => (line, ""),
    };
    let number = |cmd: fn(f64) -> SessionCommand| match arg.parse::<f64>() {
        Ok(v) => cmd(v),
        Err(_) => SessionCommand::Invalid(format!("{word} needs a number, got {arg:?}")),
    };
    match word {
        "size" => number(SessionCommand::Size),
        "dimension" => match arg.parse::<u32>() {
            Ok(v) => SessionCommand::Dimension(v),
            Err(_) => SessionCommand::Invalid(format!("dimension needs whole pixels, got {arg:?}")),
        },
        "quality" => number(|v| SessionCommand::Quality(v as f32)),
        "recompress" if arg.is_empty() => SessionCommand::Recompress,
        "download" if arg.is_empty() => SessionCommand::Download,
        "cancel" if arg.is_empty() => SessionCommand::Cancel,
        "reset" if arg.is_empty() => SessionCommand::Reset,
        "" | "status" if arg.is_empty() => SessionCommand::Status,
        "help" | "?" if arg.is_empty() => SessionCommand::Help,
        "quit" | "exit" | "q" if arg.is_empty() => SessionCommand::Quit,
        _ => SessionCommand::Drop(line.to_string()),
    }
}

/// Run a compressing workbench call while still reading stdin, so `cancel`
/// can reach it. Other lines wait in `$queued`.
macro_rules! while_reading_stdin {
    ($bench:ident, $lines:ident, $stdin_open:ident, $queued:ident, $call:expr) => {{
        let handle = $bench.cancel_handle();
        let work = $call;
        tokio::pin!(work);
        loop {
            tokio::select! {
                result = &mut work => break result,
                line = $lines.next_line(), if $stdin_open => match line {
                    Ok(Some(l)) if parse_command(&l) == SessionCommand::Cancel => {
                        handle.cancel();
                    }
                    Ok(Some(l)) => $queued.push_back(l),
                    Ok(None) | Err(_) => $stdin_open = false,
                },
            }
        }
    }};
}

async fn run_session(mut bench: Bench) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let surface = DropSurface::new();
    bench.activate(&surface);
    output::print_session_help();
    output::print_panel(&bench.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut queued: VecDeque<String> = VecDeque::new();
    loop {
        let line = match queued.pop_front() {
            Some(line) => line,
            None if stdin_open => match lines.next_line().await? {
                Some(line) => line,
                None => break,
            },
            None => break,
        };
        match parse_command(&line) {
            SessionCommand::Quit => break,
            SessionCommand::Help => {
                output::print_session_help();
                continue;
            }
            SessionCommand::Invalid(msg) => {
                eprintln!("! {msg}");
                continue;
            }
            SessionCommand::Size(mb) => bench.controls_mut().set_max_size_mb(mb),
            SessionCommand::Dimension(px) => bench.controls_mut().set_max_dimension(px),
            SessionCommand::Quality(q) => bench.controls_mut().set_quality(q),
            SessionCommand::Status => {}
            SessionCommand::Cancel => {
                bench.cancel();
            }
            SessionCommand::Reset => bench.reset(),
            SessionCommand::Download => match bench.download() {
                Ok(Some(saved)) => println!("Saved {saved}"),
                Ok(None) => eprintln!("! nothing to download yet"),
                Err(e) => eprintln!("! {e}"),
            },
            SessionCommand::Recompress => {
                if let Err(e) = while_reading_stdin!(bench, lines, stdin_open, queued, bench.recompress()) {
                    error!("{e}");
                }
            }
            SessionCommand::Drop(raw) => {
                let path = intake::parse_dropped_path(&raw);
                let file = match intake::read_file(Path::new(&path)) {
                    Ok(file) => file,
                    Err(e) => {
                        eprintln!("! {e}");
                        continue;
                    }
                };
                let name = file.name.clone();
                surface.emit(DragEvent::Enter);
                surface.emit(DragEvent::Drop(vec![file]));
                match while_reading_stdin!(bench, lines, stdin_open, queued, bench.process_pending()) {
                    Ok(outcomes) => {
                        for outcome in outcomes {
                            println!("{}", output::format_intake(&name, outcome));
                        }
                    }
                    Err(e) => error!("{e}"),
                }
            }
        }
        output::print_panel(&bench.view());
    }

    bench.deactivate();
    Ok(ExitCode::SUCCESS)
}
