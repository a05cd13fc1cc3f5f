//! wxpanel - current weather and a daily forecast in the terminal
//!
//! A terminal UI application that shows current conditions and a multi-day
//! forecast for one location, fetched from the Open-Meteo API.

use std::fs::{File, OpenOptions};
use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wxpanel::adapter::WeatherAdapter;
use wxpanel::app::{App, AppState};
use wxpanel::cache::CacheManager;
use wxpanel::cli::{Cli, StartupConfig};
use wxpanel::config::AppConfig;
use wxpanel::data::ForecastClient;
use wxpanel::presentation::Dashboard;
use wxpanel::refresh::{self, RefreshConfig, RefreshHandle};
use wxpanel::ui;

type BoxError = Box<dyn std::error::Error>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wxpanel=info"))
}

/// Logs to stderr; used when the terminal is not taken over
fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .try_init();
}

/// Logs to `wxpanel.log` in the cache directory so output does not corrupt the UI
///
/// Logging is dropped if the file cannot be opened.
fn init_file_logging() {
    match open_log_file() {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn open_log_file() -> Option<File> {
    let cache = CacheManager::new()?;
    cache.ensure_dir().ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(cache.dir().join("wxpanel.log"))
        .ok()
}

/// Builds the forecast client from settings, with an on-disk cache unless disabled
fn build_adapter(config: &AppConfig) -> Result<WeatherAdapter, BoxError> {
    let mut client = ForecastClient::with_timeout(config.timeout())?
        .with_base_url(config.base_url.clone())
        .with_retry(config.retry_policy());

    if config.cache {
        if let Some(cache) = CacheManager::new() {
            client = client.with_cache(cache, config.cache_ttl_minutes);
        }
    }

    Ok(WeatherAdapter::new(client, config.forecast_request()))
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match app.state {
        AppState::Loading => {
            render_loading(frame);
        }
        AppState::Dashboard => {
            ui::render_dashboard(frame, app);
        }
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading forecast...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Fetches once and prints the panels as plain text
async fn run_once(
    adapter: WeatherAdapter,
    mut dashboard: Dashboard,
    location_label: &str,
) -> Result<(), BoxError> {
    adapter.fetch_and_apply(&mut dashboard).await?;
    print!("{}", ui::to_plain_text(&dashboard, location_label));
    Ok(())
}

/// Polls keys and refresh results until the user quits
fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    handle: &mut RefreshHandle,
) -> Result<(), BoxError> {
    loop {
        // Render UI
        terminal.draw(|f| render_ui(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        while let Some(message) = refresh::try_recv(handle) {
            app.handle_refresh_message(message);
        }

        if app.take_refresh_request() && !handle.request_refresh() {
            debug!("Refresh already queued");
        }

        // Check if we should quit
        if app.should_quit {
            return Ok(());
        }
    }
}

fn run_tui(
    adapter: WeatherAdapter,
    dashboard: Dashboard,
    config: &AppConfig,
) -> Result<(), BoxError> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app =
        App::new(dashboard, config.location_label()).with_stale_after(config.cache_ttl_minutes);
    let mut handle = RefreshHandle::spawn(
        adapter,
        RefreshConfig {
            interval: config.refresh_interval(),
        },
    );

    let result = event_loop(&mut terminal, &mut app, &mut handle);

    // Cancels any fetch still running
    handle.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!("wxpanel closed");
    result
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    // Configuration errors are reported before the terminal is touched
    let startup = StartupConfig::from_cli(&cli)?;
    let config = startup.config;
    let dashboard = Dashboard::initialize_layout(config.dashboard_config())?;
    let adapter = build_adapter(&config)?;

    if startup.once {
        init_stderr_logging();
        run_once(adapter, dashboard, &config.location_label()).await
    } else {
        init_file_logging();
        info!(location = %config.location_label(), days = config.forecast_days, "wxpanel starting");
        run_tui(adapter, dashboard, &config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wxpanel: {}", e);
            ExitCode::FAILURE
        }
    }
}
