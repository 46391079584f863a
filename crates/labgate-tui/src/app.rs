//! Application state management for the labgate TUI.
//!
//! `App` owns the session store and all UI state: which overlay is showing,
//! the login form contents, and the inline login error. Rendering and input
//! handling read and mutate it from the main loop.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use labgate_core::{Directory, FileBackend, LoginError, SessionData, SessionStore};

use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    pub store: SessionStore<FileBackend>,

    pub state: AppState,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        let storage_dir = Config::storage_dir().unwrap_or_else(|_| PathBuf::from("./cache"));

        let mut store = SessionStore::new(Directory::demo(), FileBackend::new(storage_dir));
        store.subscribe(|session| match session {
            Some(data) => info!(username = %data.username, "Session changed"),
            None => info!("Session cleared"),
        });

        Ok(Self::with_parts(config, store))
    }

    /// Build an app from explicit parts. The username is prefilled from the
    /// config's remembered last login; the password always starts empty.
    pub fn with_parts(config: Config, store: SessionStore<FileBackend>) -> Self {
        let login_username = config.last_username.clone().unwrap_or_default();

        Self {
            config,
            store,
            state: AppState::Normal,
            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,
        }
    }

    /// Pick up a persisted session from a previous run. Returns whether the
    /// app is authenticated afterwards.
    pub fn restore(&mut self) -> bool {
        self.store.restore()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn session(&self) -> Option<&SessionData> {
        self.store.session()
    }

    /// Show the login overlay with focus on the first empty field.
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form.
    ///
    /// On success the overlay closes and the last username is remembered.
    /// On failure an inline error is shown and the overlay stays open; an
    /// existing session, if any, is untouched.
    pub fn attempt_login(&mut self) {
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        self.login_error = None;

        match self.store.login(&username, &password) {
            Ok(()) => {
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!("Login successful");
            }
            Err(LoginError::InvalidCredentials) => {
                info!("Login rejected");
                self.login_error = Some("Invalid username or password".to_string());
            }
        }
    }

    /// Sign out and return to the login overlay.
    pub fn logout(&mut self) {
        self.store.logout();
        self.login_password.clear();
        self.start_login();
    }
}

fn is_valid_input_char(c: char) -> bool {
    // Allow printable chars, reject control chars
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
