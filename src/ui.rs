use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use ratatui::{
    Frame,
    prelude::*,
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::calendar::{WEEKDAY_LABELS, is_weekend, month_grid};
use crate::models::date_key;
use crate::screen::DiaryScreen;

const COLOR_SAND: Color = Color::Rgb(0xEB, 0xDB, 0xB2);
const COLOR_OLIVE: Color = Color::Rgb(0x98, 0x97, 0x1A);
const COLOR_MOSS: Color = Color::Rgb(0x67, 0x67, 0x1C);
const COLOR_BARK: Color = Color::Rgb(0x3C, 0x38, 0x36);
const CALENDAR_WIDTH: u16 = 25;
const SWITCH_WIDTH: u16 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub bg: Color,
    pub border: Color,
    pub accent: Color,
    pub marked: Color,
    pub overlay_bg: Color,
}

impl Palette {
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self {
                text: COLOR_SAND,
                muted: Color::Rgb(0x92, 0x83, 0x74),
                bg: Color::Rgb(0x1D, 0x20, 0x21),
                border: COLOR_MOSS,
                accent: COLOR_OLIVE,
                marked: Color::Rgb(0xD7, 0x99, 0x21),
                overlay_bg: Color::Rgb(0x1A, 0x1D, 0x12),
            }
        } else {
            Self {
                text: COLOR_BARK,
                muted: Color::Rgb(0x7C, 0x6F, 0x64),
                bg: Color::Rgb(0xFB, 0xF1, 0xC7),
                border: COLOR_OLIVE,
                accent: COLOR_MOSS,
                marked: Color::Rgb(0xAF, 0x3A, 0x03),
                overlay_bg: COLOR_SAND,
            }
        }
    }
}

fn centered_rect(frame_size: Rect, width: u16, height: u16) -> Rect {
    Rect::new(
        (frame_size.width.saturating_sub(width)) / 2,
        (frame_size.height.saturating_sub(height)) / 2,
        width.min(frame_size.width),
        height.min(frame_size.height),
    )
}

fn render_overlay(f: &mut Frame<'_>, lines: Vec<Line<'_>>, title: &str, palette: Palette) {
    let width = lines
        .iter()
        .map(|l| l.width() as u16)
        .chain(std::iter::once(title.chars().count() as u16))
        .max()
        .unwrap_or(0)
        + 4;
    let area = centered_rect(f.size(), width, lines.len() as u16 + 2);
    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(palette.text).bg(palette.overlay_bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    title.to_string(),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ))
                .border_style(
                    Style::default()
                        .fg(palette.border)
                        .add_modifier(Modifier::BOLD),
                )
                .style(Style::default().bg(palette.overlay_bg)),
        );
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn confirm_lines(message: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from("[y] Yes   [n] No"),
    ]
}

/// Month grid for the month containing `focus`, with `focus` highlighted.
pub fn calendar_lines(
    focus: NaiveDate,
    today: NaiveDate,
    marked: &BTreeSet<NaiveDate>,
    palette: Palette,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            focus.format("%B %Y").to_string(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            WEEKDAY_LABELS.join(" "),
            Style::default().fg(palette.muted),
        )),
    ];

    for week in month_grid(focus) {
        let mut spans = Vec::with_capacity(14);
        for (idx, day) in week.iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw(" "));
            }
            let mut style = Style::default().fg(palette.text);
            if day.month() != focus.month() {
                style = style.fg(palette.muted).add_modifier(Modifier::DIM);
            } else if marked.contains(day) {
                style = style.fg(palette.marked).add_modifier(Modifier::BOLD);
            } else if is_weekend(*day) {
                style = style.fg(palette.accent);
            }
            if *day == today {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if *day == focus {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(format!("{:>2}", day.day()), style));
        }
        lines.push(Line::from(spans));
    }
    lines
}

pub fn draw(f: &mut Frame<'_>, screen: &DiaryScreen) {
    let palette = Palette::for_mode(screen.dark_mode());
    let base = Style::default().fg(palette.text).bg(palette.bg);
    f.render_widget(Block::default().style(base), f.size());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(f.size());

    // Header: active date on the left, dark-mode switch in the corner
    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(SWITCH_WIDTH)])
        .split(layout[0]);
    let bordered = || {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .style(base)
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "Diary ",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(screen.date().format("%A, %-d %B %Y").to_string()),
    ]))
    .block(bordered());
    f.render_widget(title, header[0]);

    let (switch_label, switch_style) = if screen.dark_mode() {
        ("● on", Style::default().fg(palette.marked))
    } else {
        ("○ off", Style::default().fg(palette.muted))
    };
    let switch = Paragraph::new(Line::from(vec![
        Span::raw("Dark Mode "),
        Span::styled(switch_label, switch_style.add_modifier(Modifier::BOLD)),
    ]))
    .alignment(Alignment::Right)
    .block(bordered());
    f.render_widget(switch, header[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CALENDAR_WIDTH), Constraint::Min(1)])
        .split(layout[1]);

    let calendar = Paragraph::new(calendar_lines(
        screen.date(),
        screen.today(),
        screen.marked(),
        palette,
    ))
    .block(bordered().title("Calendar"));
    f.render_widget(calendar, body[0]);

    draw_editor(f, screen, body[1], palette);

    let footer = Paragraph::new(screen.status().to_string()).block(bordered());
    f.render_widget(footer, layout[2]);

    if let Some(picker) = screen.picker() {
        let mut lines = calendar_lines(picker.cursor, screen.today(), screen.marked(), palette);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{} -> {}",
                date_key(picker.original),
                date_key(picker.cursor)
            ),
            Style::default().fg(palette.accent),
        )));
        render_overlay(f, lines, "Pick a date", palette);
    } else if screen.delete_confirm() {
        let message = format!("Delete entry for {}?", date_key(screen.date()));
        render_overlay(f, confirm_lines(&message), "Confirm delete", palette);
    } else if screen.quit_confirm() {
        render_overlay(
            f,
            confirm_lines("Quit and discard unsaved changes?"),
            "Confirm quit",
            palette,
        );
    }
}

fn draw_editor(f: &mut Frame<'_>, screen: &DiaryScreen, area: Rect, palette: Palette) {
    let marker = if screen.is_dirty() { " *" } else { "" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(Style::default().fg(palette.text).bg(palette.bg))
        .title(format!(
            "Diary Entry for {}{marker}",
            date_key(screen.date())
        ));
    let inner = block.inner(area);

    let editor = screen.editor();
    let (row, col) = editor.cursor();
    let scroll = (row as u16).saturating_sub(inner.height.saturating_sub(1));

    let paragraph = match screen.placeholder() {
        Some(placeholder) => Paragraph::new(Span::styled(
            placeholder.to_string(),
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        )),
        None => Paragraph::new(
            editor
                .lines()
                .iter()
                .map(|l| Line::from(l.as_str()))
                .collect::<Vec<Line>>(),
        )
        .scroll((scroll, 0)),
    };
    f.render_widget(paragraph.block(block), area);

    let overlay_open =
        screen.picker().is_some() || screen.delete_confirm() || screen.quit_confirm();
    if !overlay_open && inner.width > 0 && inner.height > 0 {
        let x = inner.x + (col as u16).min(inner.width - 1);
        let y = inner.y + (row as u16).saturating_sub(scroll);
        f.set_cursor(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend, text::Line};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn palettes_differ_between_modes() {
        assert_ne!(Palette::for_mode(true), Palette::for_mode(false));
    }

    #[test]
    fn calendar_has_header_labels_and_six_weeks() {
        let lines = calendar_lines(
            date(2025, 4, 8),
            date(2025, 4, 8),
            &BTreeSet::new(),
            Palette::for_mode(false),
        );
        let plain = |line: &Line| -> String {
            line.spans.iter().map(|s| s.content.as_ref()).collect()
        };
        assert_eq!(lines.len(), 8);
        assert_eq!(plain(&lines[1]), "Mo Tu We Th Fr Sa Su");
        assert_eq!(plain(&lines[2]), "31  1  2  3  4  5  6");
    }

    #[test]
    fn draw_shows_title_placeholder_and_switch() {
        let day = date(2025, 4, 8);
        let screen = DiaryScreen::new(day, day, true);
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &screen)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Diary Entry for 2025-04-08"));
        assert!(text.contains("No diary entry found."));
        assert!(text.contains("Dark Mode"));
        assert!(text.contains("April 2025"));
    }
}
