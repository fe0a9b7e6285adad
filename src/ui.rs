use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, DisplayMode, InputMode, ThemeMode};
use crate::storage::MatchMode;

struct Theme {
    accent: Color,
    danger: Color,
    dim: Color,
    saved: Color,
    highlight_fg: Color,
    highlight_bg: Color,
    panel_bg: Color,
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(size);

    render_header(f, chunks[0], app);
    render_search(f, chunks[1], app);
    render_list(f, chunks[2], app);
    render_footer(f, chunks[3], app);

    match app.input_mode {
        InputMode::Flights => render_flights(f, size, app),
        InputMode::Help => render_help(f, size, app),
        InputMode::Search => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let mode = app.display_mode();
    let matching = match app.match_mode {
        MatchMode::IgnoreCase => "ignore-case",
        MatchMode::CaseSensitive => "case-sensitive",
    };
    let line = Line::from(vec![
        Span::styled(
            " AIRPORT TUI ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            mode.label(),
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {matching}  theme {}", app.theme_mode.label()),
            Style::default().fg(theme.dim),
        ),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme.panel_bg)),
        area,
    );
}

fn render_search(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let content = if app.query.is_empty() {
        Line::from(Span::styled(
            "Type an airport code or name...",
            Style::default().fg(theme.dim),
        ))
    } else {
        Line::from(Span::raw(app.query.clone()))
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent))
        .title("SEARCH");
    f.render_widget(Paragraph::new(content).block(block), area);

    if app.input_mode == InputMode::Search {
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(display_width(&app.query))
            .min(area.x + area.width.saturating_sub(2));
        f.set_cursor_position((x, area.y + 1));
    }
}

fn render_list(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = theme(app.theme_mode);
    app.set_list_area(area);

    let title = match app.display_mode() {
        DisplayMode::Searching => format!("AIRPORTS ({})", app.rows.len()),
        DisplayMode::BrowsingFavorites => format!("FAVORITES ({})", app.rows.len()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title);

    if app.rows.is_empty() {
        let hint = match app.display_mode() {
            DisplayMode::Searching if app.is_loading() => "Searching...",
            DisplayMode::Searching => "No airports match",
            DisplayMode::BrowsingFavorites => {
                "No favorites yet. Search an airport and pick a flight."
            }
        };
        let paragraph = Paragraph::new(Span::styled(hint, Style::default().fg(theme.dim)))
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| ListItem::new(row.label()))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let mut spans = vec![Span::styled(
        "Enter flights  ↑/↓ move  Ctrl+U clear  Ctrl+X clear favorites  Ctrl+T theme  F1 help  Esc quit",
        Style::default().fg(theme.dim),
    )];
    if let Some(status) = app.status() {
        let color = if status.is_error {
            theme.danger
        } else {
            theme.accent
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} {}", status.at.format("%H:%M:%S"), status.message),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.panel_bg));
    f.render_widget(paragraph, area);
}

fn render_flights(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = theme(app.theme_mode);
    let Some(dialog) = app.flights.as_mut() else {
        return;
    };
    let height = (dialog.flights.len() + 4) as u16;
    let popup = centered_rect(60, height, area);
    f.render_widget(Clear, popup);

    let items: Vec<ListItem> = dialog
        .flights
        .iter()
        .zip(dialog.saved.iter())
        .map(|(flight, saved)| {
            let style = if *saved {
                Style::default().fg(theme.saved).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if *saved { "★ " } else { "  " };
            ListItem::new(Line::from(Span::styled(
                format!("{marker}{}", flight.label()),
                style,
            )))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!("FLIGHTS FROM {}", dialog.airport.code))
        .title_bottom(Line::from(Span::styled(
            " Enter save • Esc close ",
            Style::default().fg(theme.dim),
        )));
    let list = List::new(items)
        .block(block)
        .style(Style::default().bg(theme.panel_bg))
        .highlight_style(
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, popup, &mut dialog.state);
    app.set_dialog_area(popup);
}

fn render_help(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let popup = centered_rect(60, 16, area);
    f.render_widget(Clear, popup);

    let lines = vec![
        Line::from(Span::styled(
            "Search",
            Style::default().fg(theme.dim).add_modifier(Modifier::BOLD),
        )),
        Line::from("  type       Filter airports by code or name"),
        Line::from("  (empty)    Show saved favorites"),
        Line::from("  Ctrl+U     Clear the search field"),
        Line::from(""),
        Line::from(Span::styled(
            "Lists",
            Style::default().fg(theme.dim).add_modifier(Modifier::BOLD),
        )),
        Line::from("  ↑/↓        Move selection • Mouse click selects"),
        Line::from("  Enter      Show flights / save flight as favorite"),
        Line::from("  Ctrl+X     Clear all favorites"),
        Line::from("  Ctrl+T     Cycle theme"),
        Line::from("  Esc        Close popup or quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc to close",
            Style::default().fg(theme.dim),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title("HELP");
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().bg(theme.panel_bg));
    f.render_widget(paragraph, popup);
}

/// Terminal columns taken by `text`; wide glyphs count as two.
fn display_width(text: &str) -> u16 {
    u16::try_from(Line::raw(text).width()).unwrap_or(u16::MAX)
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height.saturating_sub(2)).max(3);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(height),
            Constraint::Min(1),
        ])
        .split(area);
    let vertical = popup_layout[1];
    let width = ((u32::from(vertical.width) * u32::from(percent_x) / 100) as u16).max(20);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(width),
            Constraint::Min(1),
        ])
        .split(vertical);
    horizontal[1]
}

fn theme(mode: ThemeMode) -> Theme {
    match mode {
        ThemeMode::Default => Theme {
            accent: Color::Yellow,
            danger: Color::Red,
            dim: Color::DarkGray,
            saved: Color::Green,
            highlight_fg: Color::Black,
            highlight_bg: Color::Rgb(200, 200, 200),
            panel_bg: Color::Rgb(18, 18, 22),
        },
        ThemeMode::Amber => Theme {
            accent: Color::Rgb(255, 191, 0),
            danger: Color::LightRed,
            dim: Color::Rgb(140, 110, 40),
            saved: Color::Rgb(255, 220, 120),
            highlight_fg: Color::Black,
            highlight_bg: Color::Rgb(255, 220, 120),
            panel_bg: Color::Rgb(20, 16, 10),
        },
        ThemeMode::Monochrome => Theme {
            accent: Color::White,
            danger: Color::White,
            dim: Color::Gray,
            saved: Color::White,
            highlight_fg: Color::Black,
            highlight_bg: Color::White,
            panel_bg: Color::Black,
        },
    }
}
