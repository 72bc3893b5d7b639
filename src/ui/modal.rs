// Modal UI components.
// Dialogs for rating, confirmation, and account forms.

use ratatui::{prelude::*, widgets::*};

use crate::app::{Modal, PASSWORD_FIELDS};

/// Centered rectangle of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Yellow)),
        Span::styled(action, Style::default().fg(Color::DarkGray)),
    ]
}

fn input_line(label: &str, value: String, focused: bool) -> Line<'static> {
    let mut spans = vec![
        Span::styled(label.to_string(), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

fn masked(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

/// Draw the open modal, if it has a dialog of its own.
pub fn draw_modal(frame: &mut Frame, modal: &Modal) {
    match modal {
        Modal::Help => {}
        Modal::Rating { stars, comment } => draw_rating_modal(frame, *stars, comment),
        Modal::ConfirmDeleteStory { title, .. } => draw_confirm_delete(frame, title),
        Modal::ChangePassword { fields, focus } => draw_password_modal(frame, fields, *focus),
        Modal::DeleteAccount { password } => draw_delete_account(frame, password),
        Modal::ViewStory {
            title,
            era,
            content,
            scroll,
        } => draw_story_viewer(frame, title, era, content, *scroll),
    }
}

fn draw_rating_modal(frame: &mut Frame, stars: u8, comment: &str) {
    let modal_area = centered(frame.area(), 56, 9);
    frame.render_widget(Clear, modal_area);

    let filled = usize::from(stars);
    let text = vec![
        Line::from(vec![
            Span::styled("★".repeat(filled), Style::default().fg(Color::Yellow)),
            Span::styled("☆".repeat(5 - filled), Style::default().fg(Color::DarkGray)),
        ])
        .alignment(Alignment::Center),
        Line::from(""),
        input_line("Comment: ", comment.to_string(), true),
        Line::from(""),
        Line::from(
            [
                key_hint(" ←→", " = Stars  "),
                key_hint("Enter", " = Submit  "),
                key_hint("Esc", " = Cancel "),
            ]
            .concat(),
        )
        .alignment(Alignment::Center),
    ];

    let widget = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Rate this Story "),
    );
    frame.render_widget(widget, modal_area);
}

fn draw_confirm_delete(frame: &mut Frame, title: &str) {
    let modal_area = centered(frame.area(), 56, 7);
    frame.render_widget(Clear, modal_area);

    let text = vec![
        Line::from("Are you sure you want to delete this story?"),
        Line::from(Span::styled(title, Style::default().fg(Color::Cyan))),
        Line::from(""),
        Line::from([key_hint(" y", " = Delete  "), key_hint("n/Esc", " = Keep ")].concat()),
    ];

    let widget = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Delete Story "),
    );
    frame.render_widget(widget, modal_area);
}

fn draw_password_modal(frame: &mut Frame, fields: &[String; 3], focus: usize) {
    let modal_area = centered(frame.area(), 60, 9);
    frame.render_widget(Clear, modal_area);

    let mut text: Vec<Line> = PASSWORD_FIELDS
        .iter()
        .zip(fields.iter())
        .enumerate()
        .map(|(i, (label, value))| {
            input_line(&format!("{:<18}", format!("{}:", label)), masked(value), i == focus)
        })
        .collect();
    text.push(Line::from(""));
    text.push(
        Line::from(
            [
                key_hint(" Tab", " = Next field  "),
                key_hint("Enter", " = Change  "),
                key_hint("Esc", " = Cancel "),
            ]
            .concat(),
        )
        .alignment(Alignment::Center),
    );

    let widget = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Change Password "),
    );
    frame.render_widget(widget, modal_area);
}

fn draw_delete_account(frame: &mut Frame, password: &str) {
    let modal_area = centered(frame.area(), 60, 8);
    frame.render_widget(Clear, modal_area);

    let text = vec![
        Line::from(Span::styled(
            "This permanently deletes your account and all stories.",
            Style::default().fg(Color::Red),
        )),
        Line::from(""),
        input_line("Password: ", masked(password), true),
        Line::from(""),
        Line::from([key_hint(" Enter", " = Delete account  "), key_hint("Esc", " = Cancel ")].concat())
            .alignment(Alignment::Center),
    ];

    let widget = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Delete Account "),
    );
    frame.render_widget(widget, modal_area);
}

fn draw_story_viewer(frame: &mut Frame, title: &str, era: &str, content: &str, scroll: u16) {
    let area = frame.area();
    let modal_area = centered(area, area.width.saturating_sub(8).max(40), area.height.saturating_sub(4));
    frame.render_widget(Clear, modal_area);

    let mut text = vec![
        Line::from(Span::styled(era.to_string(), Style::default().fg(Color::Yellow))),
        Line::from(""),
    ];
    text.extend(content.lines().map(|line| Line::from(line.to_string())));

    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", title))
                .title_bottom(
                    Line::from([key_hint(" ↑↓", " = Scroll  "), key_hint("Esc", " = Close ")].concat())
                        .alignment(Alignment::Center),
                ),
        );
    frame.render_widget(widget, modal_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_small_areas() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered(area, 20, 4), Rect::new(10, 3, 20, 4));
        assert_eq!(centered(area, 80, 20), area);
    }

    #[test]
    fn test_masked_counts_chars() {
        assert_eq!(masked("pä55"), "••••");
    }
}
