//! UI rendering using ratatui

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::app::App;

/// Primary accent color
const ACCENT: Color = Color::Green;
/// Secondary color for less important elements
const SECONDARY: Color = Color::DarkGray;
/// Highlight color for status text
const HIGHLIGHT: Color = Color::Yellow;
/// Dim text color
const DIM: Color = Color::Rgb(100, 100, 100);

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Button
            Constraint::Min(5),    // Gallery
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title(frame, chunks[0]);
    render_button(frame, app, chunks[1]);
    render_gallery(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Span::styled(
        "🌲 Live Tree Generator",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(SECONDARY)));

    frame.render_widget(title, area);
}

fn render_button(frame: &mut Frame, app: &App, area: Rect) {
    let style = if app.is_busy() {
        Style::default().fg(DIM)
    } else {
        Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD)
    };

    let button = Paragraph::new(Line::from(Span::styled(app.button_label(), style)))
        .alignment(Alignment::Center);

    // Vertically center the single-line button in its slot
    let inner = Rect {
        y: area.y + area.height / 2,
        height: area.height.min(1),
        ..area
    };
    frame.render_widget(button, inner);
}

fn render_gallery(frame: &mut Frame, app: &App, area: Rect) {
    let images = app.session.images();
    let title = format!(" Trees ({}/{}) ", images.len(), app.session.limit());

    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SECONDARY));

    if images.is_empty() {
        let hint = if app.is_busy() {
            "Waiting for the first tree..."
        } else {
            "No trees yet"
        };
        let empty = Paragraph::new(Span::styled(hint, Style::default().fg(DIM)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = images
        .iter()
        .enumerate()
        .map(|(i, url)| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("tree-{:<3}", i),
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::raw(url.as_str()),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_indicator = if app.is_busy() {
        Span::styled(" BUSY ", Style::default().bg(HIGHLIGHT).fg(Color::Black))
    } else {
        Span::styled(" READY ", Style::default().bg(ACCENT).fg(Color::Black))
    };

    let help_text = if app.is_busy() {
        "q:quit"
    } else {
        "g/Enter:generate  q:quit"
    };

    let status = app.status_message.as_deref().unwrap_or("");

    let line = Line::from(vec![
        mode_indicator,
        Span::raw(" "),
        Span::styled(help_text, Style::default().fg(DIM)),
        Span::raw(" "),
        Span::styled(status, Style::default().fg(HIGHLIGHT)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use treegen_core::{FeedEvent, GallerySession};

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 16)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn idle_screen_offers_generate() {
        let app = App::new(GallerySession::new("http://localhost:5000/output", 5));
        let text = screen(&app);
        assert!(text.contains("Generate Trees"));
        assert!(text.contains("No trees yet"));
    }

    #[test]
    fn received_trees_are_listed_in_order() {
        let mut app = App::new(GallerySession::new("http://h/output", 5));
        app.trigger();
        app.apply(FeedEvent::Message("a.png".into()));
        app.apply(FeedEvent::Message("b.png".into()));

        let text = screen(&app);
        assert!(text.contains("Generating..."));
        let first = text.find("http://h/output/a.png").unwrap();
        let second = text.find("http://h/output/b.png").unwrap();
        assert!(first < second);
        assert!(text.contains("tree-0"));
        assert!(text.contains("tree-1"));
    }
}
