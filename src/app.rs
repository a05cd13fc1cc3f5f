//! Application state management for wxpanel
//!
//! This module contains the main application state, handling keyboard input
//! and applying results from the background refresh task.

use chrono::{DateTime, Duration, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::warn;

use crate::data::forecast::DEFAULT_CACHE_TTL_MINUTES;
use crate::presentation::{Dashboard, ForecastUpdate};
use crate::refresh::RefreshMessage;

/// Application state enum representing the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for the first fetch to finish
    Loading,
    /// Panels are on screen, filled or not
    Dashboard,
}

/// Severity of the footer status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// One-line message shown in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// Main application struct managing state and data
#[derive(Debug)]
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// The panels being displayed
    pub dashboard: Dashboard,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating a refresh has been requested
    pub refresh_requested: bool,
    /// A fetch is currently running
    pub refreshing: bool,
    /// Age past which shown data counts as stale
    pub stale_after: Duration,
    /// Footer message from the last refresh
    pub status: Option<StatusMessage>,
    /// Location shown in the header
    pub location_label: String,
}

impl App {
    /// Creates an App around an initialized (empty) dashboard
    ///
    /// # Arguments
    /// * `dashboard` - Layout created by `Dashboard::initialize_layout`
    /// * `location_label` - Header text naming the location
    pub fn new(dashboard: Dashboard, location_label: impl Into<String>) -> Self {
        Self {
            state: AppState::Loading,
            dashboard,
            should_quit: false,
            show_help: false,
            refresh_requested: false,
            refreshing: false,
            stale_after: Duration::minutes(DEFAULT_CACHE_TTL_MINUTES as i64),
            status: None,
            location_label: location_label.into(),
        }
    }

    /// Treats data older than `minutes` (at least one) as stale
    ///
    /// Matches the cache TTL, so only an expired cache entry served while
    /// the API is down shows up as stale.
    pub fn with_stale_after(mut self, minutes: u64) -> Self {
        let minutes = i64::try_from(minutes.max(1)).unwrap_or(i64::MAX / 60_000);
        self.stale_after = Duration::minutes(minutes);
        self
    }

    /// Whether the shown data was fetched more than `stale_after` before `now`
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.dashboard
            .updated_at()
            .is_some_and(|fetched_at| now - fetched_at > self.stale_after)
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// Key mappings:
    /// - `q` or `Esc`: Quit the application
    /// - `r`: Refresh the forecast
    /// - `?`: Show help overlay
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') if self.state == AppState::Dashboard => {
                self.refresh_requested = true;
            }
            KeyCode::Char('?') if self.state == AppState::Dashboard => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// Takes the pending refresh request, if any
    ///
    /// Requests made while a fetch is running are dropped.
    pub fn take_refresh_request(&mut self) -> bool {
        let requested = self.refresh_requested && !self.refreshing;
        self.refresh_requested = false;
        requested
    }

    /// Applies a message from the background refresh task
    pub fn handle_refresh_message(&mut self, message: RefreshMessage) {
        match message {
            RefreshMessage::RefreshStarted => {
                self.refreshing = true;
                self.status = Some(StatusMessage::info("Refreshing..."));
            }
            RefreshMessage::Updated(update) => {
                self.refreshing = false;
                self.apply_update(&update);
                self.state = AppState::Dashboard;
            }
            RefreshMessage::RefreshFailed(error) => {
                self.refreshing = false;
                self.status = Some(StatusMessage::error(format!("Refresh failed: {}", error)));
                self.state = AppState::Dashboard;
            }
        }
    }

    fn apply_update(&mut self, update: &ForecastUpdate) {
        match self.dashboard.apply_update(update) {
            Ok(()) if self.is_stale(Utc::now()) => {
                let fetched = update.fetched_at.with_timezone(&Local);
                warn!(fetched_at = %update.fetched_at, "Showing stale forecast");
                self.status = Some(StatusMessage::warning(format!(
                    "Offline: showing forecast from {}",
                    fetched.format("%a %H:%M")
                )));
            }
            Ok(()) => {
                self.status = None;
            }
            Err(e) => {
                warn!(error = %e, "Update rejected by dashboard");
                self.status = Some(StatusMessage::error(format!("Display error: {}", e)));
            }
        }
    }
}
