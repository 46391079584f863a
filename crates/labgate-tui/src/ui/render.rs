use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use labgate_core::SessionData;

use crate::app::{App, AppState, LoginFocus};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  labgate";
    let help_hint = "[?] Help";
    let title_len = title.len();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title_len as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(session) = app.session() {
        render_member_area(frame, area, session);
    } else {
        render_guest_area(frame, area);
    }
}

/// Protected content, visible only while authenticated.
fn render_member_area(frame: &mut Frame, area: Rect, session: &SessionData) {
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Welcome, "),
            Span::styled(session.label().to_string(), styles::title_style()),
        ]),
        Line::from(vec![
            Span::styled("  Account: ", styles::muted_style()),
            Span::raw(session.username.clone()),
            Span::styled("  Role: ", styles::muted_style()),
            Span::raw(session.role.display_name()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  ── Member area ──────────────────────────────",
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from("  · Lab meeting notes and internal announcements"),
        Line::from("  · Equipment booking calendar"),
        Line::from("  · Shared datasets and drafts"),
        Line::from(""),
        Line::from(Span::styled(
            "  This block is hidden from guests.",
            styles::success_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(Span::styled(" Member Area ", styles::title_style()));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_guest_area(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from("  You are browsing as a guest."),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Press "),
            Span::styled("Enter", styles::help_key_style()),
            Span::raw(" to sign in and see the member area."),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false))
        .title(Span::styled(" Guests ", styles::muted_style()));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (status, status_style) = match app.session() {
        Some(session) => (
            format!(
                " Signed in as {} ({})",
                session.label(),
                session.role.display_name()
            ),
            styles::success_style(),
        ),
        None => (" Not signed in".to_string(), styles::muted_style()),
    };

    let keys = if app.is_authenticated() {
        "[l] sign out  [q] quit "
    } else {
        "[Enter] sign in  [q] quit "
    };

    let padding = padding_between(area.width, &status, keys);
    let line = Line::from(vec![
        Span::styled(status, status_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(keys, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    // Fixed size dialog - grows by two rows when showing an error
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(46, height, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = vec![];

    lines.push(Line::from(Span::styled(
        "      ╦  ╔═╗╔╗ ╔═╗╔═╗╔╦╗╔═╗",
        styles::title_style(),
    )));
    lines.push(Line::from(Span::styled(
        "      ║  ╠═╣╠╩╗║ ╦╠═╣ ║ ║╣ ",
        styles::title_style(),
    )));
    lines.push(Line::from(Span::styled(
        "      ╩═╝╩ ╩╚═╝╚═╝╩ ╩ ╩ ╚═╝",
        styles::title_style(),
    )));
    lines.push(Line::from(""));

    // Username field
    let username_focused = app.login_focus == LoginFocus::Username;
    let username_style = if username_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let username_display = format!("{:<16}", app.login_username);
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(format!("{}{}", username_display, cursor), username_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field (masked)
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let password_masked: String = "*".repeat(app.login_password.chars().count().min(16));
    let password_display = format!("{:<16}", password_masked);
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{}{}", password_display, cursor), password_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Login button
    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(""));
    if button_focused {
        lines.push(Line::from(vec![
            Span::raw("            ["),
            Span::styled(" ▶ Sign in ◀ ", button_style),
            Span::raw("]"),
        ]));
    } else {
        lines.push(Line::from(vec![
            Span::raw("            ["),
            Span::styled("   Sign in   ", button_style),
            Span::raw("]"),
        ]));
    }

    // Error message, kept inline so the dialog stays open
    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 12, frame.area());

    frame.render_widget(Clear, area);

    let key_line = |key: &str, desc: &str| {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{:<10}", key), styles::help_key_style()),
            Span::styled(desc.to_string(), styles::help_desc_style()),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("  Key bindings", styles::title_style())),
        Line::from(""),
        key_line("Enter", "Sign in (when signed out)"),
        key_line("l", "Sign out"),
        key_line("?", "Toggle this help"),
        key_line("q", "Quit"),
        Line::from(""),
        key_line("Tab/↑↓", "Move between login fields"),
        key_line("Esc", "Quit from the login dialog"),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Esc or ? to close",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

/// Spacer width between a left and a right span so the right one lands on
/// the right edge. Counted in chars, not bytes, so multibyte display names
/// do not push the right span off course.
fn padding_between(area_width: u16, left: &str, right: &str) -> usize {
    (area_width as usize).saturating_sub(left.chars().count() + right.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_counts_chars_not_bytes() {
        let status = " Signed in as 管理员 (admin)";
        let keys = "[l] sign out  [q] quit ";
        // The display name is multibyte, so byte length would overcount
        assert!(status.len() > status.chars().count());

        let padding = padding_between(80, status, keys);
        assert_eq!(
            padding,
            80 - status.chars().count() - keys.chars().count()
        );
    }

    #[test]
    fn test_padding_saturates_on_narrow_terminals() {
        assert_eq!(padding_between(10, "0123456789", "abcdef"), 0);
    }
}
