//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes, dispatching on the
//! current overlay first.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{can_add_password_char, can_add_username_char, App, AppState, LoginFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key);
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('l') => {
            if app.is_authenticated() {
                app.logout();
            }
        }
        KeyCode::Enter => {
            if !app.is_authenticated() {
                app.start_login();
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            // Move to next field
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            // Move to previous field
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => {
            match app.login_focus {
                LoginFocus::Username => {
                    app.login_focus = LoginFocus::Password;
                }
                LoginFocus::Password => {
                    app.login_focus = LoginFocus::Button;
                }
                LoginFocus::Button => {
                    // On failure login_error is set and the overlay stays up
                    app.attempt_login();
                }
            }
        }
        KeyCode::Backspace => {
            match app.login_focus {
                LoginFocus::Username => {
                    app.login_username.pop();
                }
                LoginFocus::Password => {
                    app.login_password.pop();
                }
                LoginFocus::Button => {}
            }
        }
        KeyCode::Char(c) => {
            match app.login_focus {
                LoginFocus::Username => {
                    if can_add_username_char(app.login_username.len(), c) {
                        app.login_username.push(c);
                    }
                }
                LoginFocus::Password => {
                    if can_add_password_char(app.login_password.len(), c) {
                        app.login_password.push(c);
                    }
                }
                LoginFocus::Button => {
                    // Ignore character input on button
                }
            }
        }
        _ => {}
    }
    Ok(false)
}
