// UI module for rendering the TUI.
// Contains the tab views, notification toast, status bar, and help overlay.

mod breadcrumb;
mod list;
mod modal;
mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::api::Theme;
use crate::app::{App, Modal, SettingsField, Tab};
use crate::state::{ERAS, LoadingState, NotificationKind, NotificationPhase, UiState};

/// Accent color for the active theme.
fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::Blue,
        Theme::Dark | Theme::Auto => Color::Cyan,
    }
}

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Length(2), // Breadcrumb
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);
    breadcrumb::draw_breadcrumb(frame, app, chunks[1]);
    draw_content(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    // Overlays, topmost last
    draw_notification(frame, app);
    match &app.modal {
        Some(Modal::Help) => draw_help_overlay(frame),
        Some(dialog) => modal::draw_modal(frame, dialog),
        None => {}
    }
}

/// Draw the main content area based on active tab.
fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.view.active_tab() {
        Tab::Story => draw_story_tab(frame, app, area),
        Tab::Dashboard => draw_dashboard_tab(frame, app, area),
        Tab::Stories => {
            let profile = &mut app.view.profile;
            list::render_stories_list(frame, &mut profile.stories, &profile.story_filter, area);
        }
        Tab::Achievements => {
            list::render_achievements_list(frame, &mut app.view.profile.achievements, area)
        }
        Tab::Settings => draw_settings_tab(frame, app, area),
    }
}

/// Draw the era picker beside the story pane.
fn draw_story_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(1)])
        .split(area);

    let accent = accent(app.preferences.theme);
    let locked = app.view.state() == UiState::Generating;
    let selected = app.view.selected_era();
    let items: Vec<ListItem> = ERAS
        .iter()
        .map(|era| {
            let marker = if selected == Some(*era) { "● " } else { "  " };
            let style = if locked {
                Style::default().fg(Color::DarkGray)
            } else if selected == Some(*era) {
                Style::default().fg(accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![Span::raw(marker), Span::styled(*era, style)]))
        })
        .collect();

    let era_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Eras "))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(era_list, chunks[0], &mut app.era_list);

    draw_story_pane(frame, app, chunks[1]);
}

fn draw_story_pane(frame: &mut Frame, app: &App, area: Rect) {
    let accent = accent(app.preferences.theme);
    let block = Block::default().borders(Borders::ALL).title(" Diary ");
    let inner = block.inner(area);

    match (app.view.state(), app.view.story()) {
        (UiState::Generating, _) => {
            frame.render_widget(block, area);
            let era = app.view.selected_era().unwrap_or_default();
            list::render_loading(frame, inner, &format!("Traveling back to {}", era));
        }
        (UiState::Displaying, Some(story)) => {
            let revealing = app.view.revealer().is_revealing();
            let mut lines = vec![
                Line::from(Span::styled(
                    story.character_name.as_str(),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    story.character_profile.as_str(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ];
            let details: Vec<&str> = [story.timestamp.as_deref(), story.setting.as_deref(), story.mood.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !details.is_empty() {
                lines.push(Line::from(Span::styled(
                    details.join(" · "),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::from(""));

            let mut diary: Vec<Line> = app
                .view
                .revealer()
                .visible_text()
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect();
            if revealing {
                let cursor = Span::styled("▌", Style::default().fg(Color::Yellow));
                match diary.last_mut() {
                    Some(last) => last.push_span(cursor),
                    None => diary.push(Line::from(cursor)),
                }
            }
            lines.extend(diary);

            if !revealing && !story.historical_context.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Historical Context",
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(story.historical_context.as_str()));
            }

            let pane = Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((app.story_scroll, 0))
                .block(block.title(format!(" Diary · {} ", story.era)));
            frame.render_widget(pane, area);
        }
        _ => {
            frame.render_widget(block, area);
            let message = match app.view.selected_era() {
                Some(era) => format!("Press g to write a diary from {}", era),
                None => "Choose an era with ↑↓ and Enter, then press g".to_string(),
            };
            list::render_empty(frame, inner, &message);
        }
    }
}

fn draw_dashboard_tab(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Dashboard ");
    let dashboard = match &app.view.profile.dashboard {
        LoadingState::Loaded(dashboard) => dashboard,
        LoadingState::Idle => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            return list::render_empty(frame, inner, "Press r to load");
        }
        LoadingState::Loading => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            return list::render_loading(frame, inner, "Loading dashboard");
        }
        LoadingState::Error(e) => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            return list::render_error(frame, inner, e);
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Stats
            Constraint::Length(10), // Era chart
            Constraint::Min(1),     // Recent stories
        ])
        .split(area);

    let stats = &dashboard.stats;
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(chunks[0]);
    for (cell, (label, value)) in cells.iter().zip([
        ("Stories", stats.total_stories),
        ("Bookmarks", stats.total_bookmarks),
        ("Ratings", stats.total_ratings),
        ("Achievements", stats.total_achievements),
    ]) {
        let widget = Paragraph::new(Line::from(Span::styled(
            value.to_string(),
            Style::default()
                .fg(accent(app.preferences.theme))
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", label)));
        frame.render_widget(widget, *cell);
    }

    let bars: Vec<Bar> = dashboard
        .era_stats
        .iter()
        .map(|(era, count)| {
            Bar::default()
                .value(*count)
                .label(Line::from(era.trim_start_matches("The ").to_string()))
        })
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Stories by Era "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(12)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow));
    frame.render_widget(chart, chunks[1]);

    let recent_block = Block::default().borders(Borders::ALL).title(" Recent Stories ");
    if dashboard.recent_stories.is_empty() {
        let inner = recent_block.inner(chunks[2]);
        frame.render_widget(recent_block, chunks[2]);
        list::render_empty(frame, inner, "No stories yet");
    } else {
        let items: Vec<ListItem> = dashboard
            .recent_stories
            .iter()
            .map(|story| ListItem::new(list::story_line(story)))
            .collect();
        frame.render_widget(List::new(items).block(recent_block), chunks[2]);
    }
}

fn draw_settings_tab(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Settings ");

    let draft = &app.settings_draft;
    let mut lines: Vec<Line> = SettingsField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                SettingsField::Theme => draft.theme.label().to_string(),
                SettingsField::TypewriterSpeed => draft.typewriter_speed.label().to_string(),
                SettingsField::AutoPlayAudio => {
                    (if draft.auto_play_audio { "On" } else { "Off" }).to_string()
                }
            };
            let focused = *field == app.settings_focus;
            let marker = if focused { "> " } else { "  " };
            let style = if focused {
                Style::default()
                    .fg(accent(app.preferences.theme))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<26}", field.label()), style),
                Span::styled(format!("‹ {} ›", value), style),
            ])
        })
        .collect();

    match &app.view.profile.settings {
        LoadingState::Loading => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Fetching saved preferences...",
                Style::default().fg(Color::Yellow),
            )));
        }
        // Editing still works against the local copy
        LoadingState::Error(e) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("  Using local preferences ({})", e),
                Style::default().fg(Color::DarkGray),
            )));
        }
        LoadingState::Idle | LoadingState::Loaded(_) => {}
    }
    if app.settings_draft != app.preferences {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Unsaved changes. Press Enter to save.",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  p", Style::default().fg(Color::Yellow)),
        Span::styled(" Change password   ", Style::default().fg(Color::DarkGray)),
        Span::styled("D", Style::default().fg(Color::Red)),
        Span::styled(" Delete account", Style::default().fg(Color::DarkGray)),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Draw the current notification as a toast in the top-right corner.
fn draw_notification(frame: &mut Frame, app: &App) {
    let Some(notification) = app.notifications.current() else {
        return;
    };
    let area = frame.area();
    let width = (notification.message.chars().count() as u16 + 6).min(area.width);
    let toast = Rect::new(area.x + area.width - width, area.y + 1, width, 3);

    let (icon, color) = match notification.kind {
        NotificationKind::Success => ("✓", Color::Green),
        NotificationKind::Error => ("✗", Color::Red),
        NotificationKind::Info => ("i", Color::Cyan),
    };
    let mut style = Style::default().fg(color);
    if notification.phase == NotificationPhase::Leaving {
        style = style.add_modifier(Modifier::DIM);
    }

    frame.render_widget(Clear, toast);
    let widget = Paragraph::new(format!("{} {}", icon, notification.message))
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(widget, toast);
}

/// Draw the status bar with keybinding hints.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let pairs: &[(&str, &str)] = match app.view.active_tab() {
        Tab::Story if app.view.story().is_some() => &[
            ("s", "Save"),
            ("b", "Bookmark"),
            ("r", "Rate"),
            ("x", "Share"),
            ("n", "New"),
            ("a", "Audio"),
            ("PgUp/Dn", "Scroll"),
        ],
        Tab::Story => &[("↑↓", "Navigate"), ("↵", "Choose era"), ("g", "Generate")],
        Tab::Dashboard => &[("r", "Refresh")],
        Tab::Stories => &[
            ("↑↓", "Navigate"),
            ("↵", "View"),
            ("f", "Era filter"),
            ("o", "Sort"),
            ("d", "Delete"),
            ("r", "Refresh"),
        ],
        Tab::Achievements => &[("↑↓", "Navigate"), ("r", "Refresh")],
        Tab::Settings => &[("↑↓", "Field"), ("←→", "Change"), ("↵", "Save")],
    };

    let mut hints = Vec::new();
    for (key, label) in pairs.iter().chain([("Tab", "Switch"), ("?", "Help"), ("q", "Quit")].iter()) {
        hints.push(Span::raw(format!(" {} ", key)));
        hints.push(Span::styled(format!("{} ", label), Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let popup_area = modal::centered(frame.area(), 56, 24);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let shortcut = |keys: &'static str, action: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", keys), Style::default().fg(Color::Cyan)),
            Span::raw(action),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        shortcut("Tab / 1-5", "Switch tabs"),
        shortcut("↑/↓ or j/k", "Navigate list"),
        shortcut("Enter", "Choose era / view story / save"),
        shortcut("g", "Generate a diary story"),
        shortcut("s / b", "Save / bookmark story"),
        shortcut("r", "Rate story / refresh tab"),
        shortcut("x", "Copy share text"),
        shortcut("n", "New story"),
        shortcut("a", "Toggle ambient audio"),
        shortcut("f / o", "Filter by era / sort stories"),
        shortcut("d", "Delete selected story"),
        shortcut("p / D", "Change password / delete account"),
        shortcut("Esc", "Dismiss notification / close"),
        shortcut("?", "Show/hide this help"),
        shortcut("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_paragraph, popup_area);
}
