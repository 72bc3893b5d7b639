// Echoes of Time terminal client.
// Sets up logging, the async runtime, and the terminal, then runs the app loop.

mod api;
mod app;
mod cache;
mod config;
mod error;
mod event;
mod feedback;
mod logging;
mod state;
mod ui;

use std::io::{self, Stdout};
use std::process::ExitCode;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::api::{ApiClient, StoryApi};
use crate::app::App;
use crate::config::Config;
use crate::error::Result;

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn main() -> ExitCode {
    let logging = logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            eprintln!("echoes: {}", e);
            if let Some(logging) = &logging {
                eprintln!("logs: {}", logging.log_dir().display());
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = Config::from_env()?;
    tracing::info!(api_url = %config.api_url, "starting");

    let runtime = tokio::runtime::Runtime::new()?;
    // Lets the UI thread spawn tasks onto the runtime's workers
    let _runtime = runtime.enter();

    let client = ApiClient::new(config.api_url.clone(), config.request_timeout)?;
    let base_url = client.base_url().clone();
    let api: Arc<dyn StoryApi> = Arc::new(client);
    let (events, mut receiver) = event::channel();

    let mut app = App::new(
        api,
        events,
        base_url,
        config.generation_timeout,
        cache::preferences_path(),
    );
    app.start(config.credentials.clone());

    let mut terminal = init_terminal()?;
    let result = app.run(&mut terminal, &mut receiver);
    restore_terminal()?;
    result?;

    tracing::info!("exiting");
    Ok(())
}

fn init_terminal() -> io::Result<Tui> {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        previous(info);
    }));

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(io::stdout()))
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}
