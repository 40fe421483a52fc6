use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{LevelFilter, error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, WriteLogger};

use catascope::event_source::KeyboardEventSource;
use catascope::main_app::{App, run_app_with_event_source};
use catascope::{panic_handler, settings};

#[derive(Parser)]
#[command(name = "catascope", version, about = "Terminal PDF catalog viewer")]
struct Cli {
    /// Directory containing catalog PDFs
    #[arg(default_value = ".")]
    library: PathBuf,

    /// Open a single catalog directly instead of starting on the list
    #[arg(long)]
    open: Option<PathBuf>,

    /// Log verbosity (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) -> Result<()> {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);
    let log_path = dirs::cache_dir()
        .map(|dir| dir.join("catascope"))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .map_or_else(|| PathBuf::from("catascope.log"), |dir| dir.join("catascope.log"));
    WriteLogger::init(level, Config::default(), File::create(log_path)?)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    settings::load_settings();
    panic_handler::initialize_panic_handler();

    info!("starting catascope");

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli.library);
    if let Some(path) = cli.open {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        app.open_catalog(path, name);
    }

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("application error: {err:?}");
        println!("{err:?}");
    }

    info!("shutting down catascope");
    Ok(())
}
