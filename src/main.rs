use std::io::{self, BufRead, Write};
use std::panic;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use jsonl_grid::command::Command;
use jsonl_grid::config::{Config, FileModeStore, ModeStore};
use jsonl_grid::document::DocumentEvent;
use jsonl_grid::protocol::{HostMessage, RendererMessage};
use jsonl_grid::session::Session;
use jsonl_grid::storage::FileStorage;
use jsonl_grid::theme::Theme;

const LOG_ENV: &str = "JSONL_GRID_LOG";

struct Args {
    file_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    state_path: Option<PathBuf>,
    chunk_size: Option<usize>,
    read_only: bool,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        file_path: None,
        config_path: None,
        state_path: None,
        chunk_size: None,
        read_only: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                parsed.config_path = Some(PathBuf::from(required_value(&args, i, "--config")));
                i += 2;
            }
            "--state" => {
                parsed.state_path = Some(PathBuf::from(required_value(&args, i, "--state")));
                i += 2;
            }
            "--chunk-size" => {
                let value = required_value(&args, i, "--chunk-size");
                match value.parse::<usize>() {
                    Ok(n) if n > 0 => parsed.chunk_size = Some(n),
                    _ => {
                        eprintln!("Invalid chunk size: '{}'. Use a positive number of rows.", value);
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            "--read-only" => {
                parsed.read_only = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
            _ => {
                parsed.file_path = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    parsed
}

fn required_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires an argument", flag);
            std::process::exit(1);
        }
    }
}

/// Log panics before the default hook runs
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        if let Some(location) = info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                "panic occurred"
            );
        } else {
            error!("panic occurred");
        }

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            error!(message = %s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            error!(message = %s);
        }

        default_hook(info);
    }));
}

fn print_help() {
    eprintln!("jsonl-grid - headless host for the JSON Lines grid renderer protocol");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    jsonl-grid [OPTIONS] <FILE>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config <PATH>      Load settings from a TOML file");
    eprintln!("    --chunk-size <ROWS>      Rows per data chunk (default 500)");
    eprintln!("    --state <PATH>           File remembering the panel mode");
    eprintln!("    --read-only              Reject edits and saves");
    eprintln!("    -h, --help               Print this help message");
    eprintln!();
    eprintln!("Renderer messages are read from stdin as JSON lines; host messages are");
    eprintln!("written to stdout. Lines starting with ':' are commands:");
    eprintln!("    :w [PATH]  :wq  :q  :q!  :u  :redo  :e!  :mode <MODE>  :theme <NAME>");
    eprintln!();
    eprintln!("Logging goes to stderr and is filtered by {} (default: info).", LOG_ENV);
}

fn load_config(args: &Args) -> Config {
    let mut config = match &args.config_path {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    config
}

enum Flow {
    Continue,
    Quit,
}

fn emit(out: &mut impl Write, messages: &[HostMessage]) -> io::Result<()> {
    for message in messages {
        serde_json::to_writer(&mut *out, message).map_err(io::Error::other)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

fn run_command(
    command: Command,
    session: &mut Session,
    mode_store: Option<&FileModeStore>,
    out: &mut impl Write,
) -> io::Result<Flow> {
    match command {
        Command::Write => {
            if let Err(e) = session.save() {
                error!(error = %e, "save failed");
            }
        }
        Command::WriteAs(path) => {
            if let Err(e) = session.save_as(path) {
                error!(error = %e, "save failed");
            }
        }
        Command::WriteQuit => match session.save() {
            Ok(()) => return Ok(Flow::Quit),
            Err(e) => error!(error = %e, "save failed"),
        },
        Command::Quit => {
            if session.document().is_dirty() {
                warn!("unsaved changes (use :q! to discard)");
            } else {
                return Ok(Flow::Quit);
            }
        }
        Command::ForceQuit => return Ok(Flow::Quit),
        Command::Undo => emit(out, &session.undo())?,
        Command::Redo => emit(out, &session.redo())?,
        Command::Revert => match session.revert() {
            Ok(messages) => emit(out, &messages)?,
            Err(e) => error!(error = %e, "revert failed"),
        },
        Command::Mode(mode) => match mode_store {
            Some(store) => {
                if let Err(e) = store.save(mode) {
                    error!(error = %e, "failed to store panel mode");
                }
            }
            None => warn!(%mode, "no --state file given, panel mode not stored"),
        },
        Command::Theme(theme) => emit(out, &[session.set_theme(theme)])?,
        Command::ThemeList => info!(themes = %Theme::builtin_names().join(", "), "available themes"),
        Command::Unknown(cmd) => warn!(command = %cmd, "unknown command"),
    }
    Ok(Flow::Continue)
}

fn log_events(session: &mut Session) {
    for event in session.take_events() {
        match event {
            DocumentEvent::HistoryChanged { label, can_undo, can_redo } => {
                debug!(%label, can_undo, can_redo, "history changed");
            }
            DocumentEvent::Saved { path } => info!(path = %path.display(), "saved"),
            DocumentEvent::Reverted => info!("reverted"),
            DocumentEvent::ParseWarnings(errors) => {
                warn!(skipped = errors.len(), "lines skipped while loading")
            }
            DocumentEvent::ContentChanged => {}
        }
    }
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    install_panic_hook();

    let args = parse_args();
    let config = load_config(&args);

    let Some(file_path) = args.file_path.clone() else {
        print_help();
        std::process::exit(1);
    };

    let mut session = Session::open(&file_path, Box::new(FileStorage), &config)
        .map_err(|e| {
            error!(error = %e, "failed to open document");
            io::Error::other(e.to_string())
        })?
        .with_read_only(args.read_only);
    info!(path = %file_path.display(), chunk_size = config.chunk_size, "jsonl-grid started");
    log_events(&mut session);

    let mode_store = args.state_path.as_ref().map(FileModeStore::new);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let flow = if let Some(input) = trimmed.strip_prefix(':') {
            match Command::parse(input) {
                Some(command) => run_command(command, &mut session, mode_store.as_ref(), &mut stdout)?,
                None => Flow::Continue,
            }
        } else {
            match serde_json::from_str::<RendererMessage>(trimmed) {
                Ok(message) => emit(&mut stdout, &session.handle(message))?,
                Err(e) => warn!(error = %e, "skipping unreadable message"),
            }
            Flow::Continue
        };

        log_events(&mut session);
        if let Flow::Quit = flow {
            break;
        }
    }

    info!("jsonl-grid stopped");
    Ok(())
}
