// Context trail under the tab bar.
// Shows where the user is and what the story view is doing.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};
use crate::state::UiState;

/// Trail segments for the active tab.
pub fn segments(app: &App) -> Vec<String> {
    let tab = app.view.active_tab();
    let mut trail = vec![tab.title().to_string()];
    match tab {
        Tab::Story => {
            trail.push(
                app.view
                    .selected_era()
                    .unwrap_or("Choose an era")
                    .to_string(),
            );
            match app.view.state() {
                UiState::Idle => {}
                UiState::Generating => trail.push("Writing...".to_string()),
                UiState::Displaying if app.view.revealer().is_revealing() => {
                    trail.push("Revealing".to_string())
                }
                UiState::Displaying => trail.push("Complete".to_string()),
            }
        }
        Tab::Stories => {
            let filter = &app.view.profile.story_filter;
            trail.push(filter.era.as_deref().unwrap_or("All eras").to_string());
            trail.push(filter.sort.label().to_string());
        }
        Tab::Dashboard | Tab::Achievements | Tab::Settings => {}
    }
    trail
}

/// Render the breadcrumb trail.
pub fn draw_breadcrumb(frame: &mut Frame, app: &App, area: Rect) {
    let trail = segments(app);
    let mut spans = Vec::new();

    for (i, label) in trail.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
        }

        let style = if i == trail.len() - 1 {
            // Current level is highlighted
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        spans.push(Span::styled(label.clone(), style));
    }

    if app.audio.is_playing() {
        spans.push(Span::styled("  ♪ ambient", Style::default().fg(Color::Magenta)));
    }

    let breadcrumb = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(breadcrumb, area);
}
