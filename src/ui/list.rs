// Generic list rendering for selectable items.
// Provides styled story and achievement lists with loading and empty states.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::api::{Achievement, StoryFilter, StorySummary};
use crate::state::{LoadingState, SelectableList};

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Five-star rendering of an average rating, rounded to the nearest star.
pub fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an error message.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red));
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

/// Characters of story text shown under each saved story.
pub const EXCERPT_CHARS: usize = 150;

/// First `max` characters of `text` on one line, with "..." when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

/// One line describing a story: title, era, rating, and age.
pub fn story_line(story: &StorySummary) -> Line<'_> {
    let rating = match story.average_rating {
        Some(average) if story.rating_count > 0 => Span::styled(
            format!("  {} ({})", stars(average), story.rating_count),
            Style::default().fg(Color::Yellow),
        ),
        _ => Span::styled("  unrated", Style::default().fg(Color::DarkGray)),
    };
    Line::from(vec![
        Span::styled(story.display_title(), Style::default().fg(Color::Cyan)),
        Span::styled(format!("  {}", story.era), Style::default().fg(Color::White)),
        rating,
        Span::styled(
            format!("  {}", format_relative_time(&story.created_at)),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Render the user's story list.
pub fn render_stories_list(
    frame: &mut Frame,
    list: &mut SelectableList<StorySummary>,
    filter: &StoryFilter,
    area: Rect,
) {
    let title = format!(
        " My Stories [{} · {}] ",
        filter.era.as_deref().unwrap_or("All eras"),
        filter.sort.label()
    );
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);

    match &list.data {
        LoadingState::Idle => {
            frame.render_widget(block, area);
            render_empty(frame, inner, "Press r to load");
        }
        LoadingState::Loading => {
            frame.render_widget(block, area);
            render_loading(frame, inner, "Loading stories");
        }
        LoadingState::Error(e) => {
            frame.render_widget(block, area);
            render_error(frame, inner, e);
        }
        LoadingState::Loaded(stories) => {
            if stories.is_empty() {
                frame.render_widget(block, area);
                render_empty(frame, inner, "No stories yet. Generate one on the Story tab.");
            } else {
                let items: Vec<ListItem> = stories
                    .iter()
                    .map(|story| {
                        ListItem::new(vec![
                            story_line(story),
                            Line::from(Span::styled(
                                format!("  {}", excerpt(&story.content, EXCERPT_CHARS)),
                                Style::default().fg(Color::DarkGray),
                            )),
                        ])
                    })
                    .collect();

                let list_widget = List::new(items)
                    .block(block)
                    .highlight_style(highlight())
                    .highlight_symbol("> ");

                frame.render_stateful_widget(list_widget, area, &mut list.list_state);
            }
        }
    }
}

/// Render achievements, earned ones first as returned by the server.
pub fn render_achievements_list(
    frame: &mut Frame,
    list: &mut SelectableList<Achievement>,
    area: Rect,
) {
    let block = Block::default().borders(Borders::ALL).title(" Achievements ");
    let inner = block.inner(area);

    match &list.data {
        LoadingState::Idle => {
            frame.render_widget(block, area);
            render_empty(frame, inner, "Press r to load");
        }
        LoadingState::Loading => {
            frame.render_widget(block, area);
            render_loading(frame, inner, "Loading achievements");
        }
        LoadingState::Error(e) => {
            frame.render_widget(block, area);
            render_error(frame, inner, e);
        }
        LoadingState::Loaded(achievements) => {
            if achievements.is_empty() {
                frame.render_widget(block, area);
                render_empty(frame, inner, "No achievements available");
            } else {
                let items: Vec<ListItem> = achievements
                    .iter()
                    .map(|achievement| {
                        let (icon, color) = if achievement.is_earned() {
                            ("🏆", Color::Yellow)
                        } else {
                            ("🔒", Color::DarkGray)
                        };
                        let earned = achievement
                            .earned_at
                            .as_ref()
                            .map(|at| format!("  earned {}", format_relative_time(at)))
                            .unwrap_or_default();
                        ListItem::new(Line::from(vec![
                            Span::raw(format!("{} ", icon)),
                            Span::styled(
                                &achievement.name,
                                Style::default().fg(color).add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!("  {}", achievement.description),
                                Style::default().fg(Color::White),
                            ),
                            Span::styled(earned, Style::default().fg(Color::DarkGray)),
                        ]))
                    })
                    .collect();

                let list_widget = List::new(items)
                    .block(block)
                    .highlight_style(highlight())
                    .highlight_symbol("> ");

                frame.render_stateful_widget(list_widget, area, &mut list.list_state);
            }
        }
    }
}
