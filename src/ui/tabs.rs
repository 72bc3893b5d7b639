// Tab bar rendering with session greeting.
// Handles visual indication of the active tab and who is signed in.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

/// Title shown on the tab bar border.
pub fn session_title(app: &App) -> String {
    match (&app.user, app.session_checked) {
        (Some(user), _) => format!(" Echoes of Time · Welcome, {} ", user.username),
        (None, true) => " Echoes of Time · Guest ".to_string(),
        (None, false) => " Echoes of Time ".to_string(),
    }
}

/// Draw the tab bar at the top of the screen.
pub fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.view.active_tab();

    let tab_titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let style = if *tab == active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(Span::styled(format!("{} {}", i + 1, tab.title()), style))
        })
        .collect();

    let selected_index = Tab::ALL.iter().position(|t| *t == active).unwrap_or(0);

    let tabs_widget = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(session_title(app))
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(selected_index)
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" │ "));

    frame.render_widget(tabs_widget, area);
}
