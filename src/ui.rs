use crate::app::{App, NoticeLevel};
use crate::config::AppConfig;
use crate::domain::{Entry, EntryKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Span, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Key and label pairs shown in the help line.
pub const KEY_BINDINGS: &[(&str, &str)] = &[
    ("↑/k", "up"),
    ("↓/j", "down"),
    ("enter", "open"),
    ("h", "back"),
    ("m", "managed"),
    ("u", "unmanaged"),
    ("L", "all"),
    ("a", "add"),
    ("r", "forget"),
    ("d", "diff"),
    ("D", "diff all"),
    ("e", "edit"),
    ("A", "apply"),
    ("q", "quit"),
];

/// Styles resolved once from the config and passed to every draw call.
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Style,
    pub highlight: Style,
    pub managed: Style,
    pub unmanaged: Style,
    pub info: Style,
    pub error: Style,
    pub muted: Style,
    pub show_icons: bool,
}

impl Theme {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut theme = match config.theme.as_str() {
            "mono" => Self::mono(),
            "default" => Self::colored(),
            other => {
                tracing::warn!(theme = other, "unknown theme, using default");
                Self::colored()
            }
        };
        theme.show_icons = config.show_icons;
        theme
    }

    fn colored() -> Self {
        Self {
            accent: Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            highlight: Style::default()
                .fg(Color::Black)
                .bg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
            managed: Style::default().fg(Color::Green),
            unmanaged: Style::default().fg(Color::Gray),
            info: Style::default().fg(Color::Black).bg(Color::LightGreen),
            error: Style::default().fg(Color::White).bg(Color::Red),
            muted: Style::default().fg(Color::DarkGray),
            show_icons: true,
        }
    }

    fn mono() -> Self {
        Self {
            accent: Style::default().add_modifier(Modifier::BOLD),
            highlight: Style::default().add_modifier(Modifier::REVERSED),
            managed: Style::default(),
            unmanaged: Style::default().add_modifier(Modifier::DIM),
            info: Style::default().add_modifier(Modifier::REVERSED),
            error: Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD),
            muted: Style::default().add_modifier(Modifier::DIM),
            show_icons: true,
        }
    }
}

pub fn draw(frame: &mut Frame, app: &mut App, theme: &Theme) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_list(frame, app, theme, outer[0]);
    draw_notice(frame, app, theme, outer[1]);
    draw_status_bar(frame, app, theme, outer[2]);
}

fn draw_list(frame: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let rows = area.height.saturating_sub(2) as usize;
    app.sync_list_scroll(rows);

    let items: Vec<ListItem> = app
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry_line(entry, theme)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(list_title(app))
                .title_style(theme.accent)
                .borders(Borders::ALL)
                .border_style(theme.muted),
        )
        .highlight_style(theme.highlight)
        .highlight_symbol("▶ ");

    let mut state = ListState::default().with_offset(app.list_scroll());
    if !app.entries().is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn list_title(app: &App) -> String {
    format!(
        " {} · {} ({}) ",
        app.view.title(),
        app.display_dir(),
        app.entries().len()
    )
}

fn entry_line(entry: &Entry, theme: &Theme) -> Line<'static> {
    let style = if entry.is_managed {
        theme.managed
    } else {
        theme.unmanaged
    };
    let label = entry_label(entry, theme.show_icons);
    Line::from(Span::styled(label, style))
}

fn entry_label(entry: &Entry, show_icons: bool) -> String {
    if entry.kind == EntryKind::BackReference {
        return if show_icons {
            format!("📁 {}", entry.name)
        } else {
            format!("{}/", entry.name)
        };
    }

    if show_icons {
        let icon = if entry.is_dir() { "📁" } else { "📄" };
        let mark = if entry.is_managed { "✅" } else { "❌" };
        format!("{icon} {} {mark}", entry.name)
    } else {
        let suffix = if entry.is_dir() { "/" } else { "" };
        let mark = if entry.is_managed { "[M]" } else { "[ ]" };
        format!("{mark} {}{suffix}", entry.name)
    }
}

fn draw_notice(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };
    let style = match notice.level {
        NoticeLevel::Info => theme.info,
        NoticeLevel::Error => theme.error,
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", notice.message),
        style,
    )))
    .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let busy = if app.is_busy() { "BUSY" } else { "IDLE" };
    let text = Line::from(vec![
        Span::styled(
            format!(" {busy} "),
            if app.is_busy() {
                Style::default().bg(Color::Yellow).fg(Color::Black)
            } else {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            },
        ),
        Span::raw("  "),
        Span::styled(help_text(), theme.muted),
    ]);

    let paragraph = Paragraph::new(text).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn help_text() -> String {
    KEY_BINDINGS
        .iter()
        .map(|(key, label)| format!("{key} {label}"))
        .collect::<Vec<_>>()
        .join(" • ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    #[test]
    fn icon_labels_show_kind_and_managed_mark() {
        assert_eq!(
            entry_label(&Entry::new(".zshrc", true, false), true),
            "📄 .zshrc ✅"
        );
        assert_eq!(
            entry_label(&Entry::new(".config", false, true), true),
            "📁 .config ❌"
        );
        assert_eq!(entry_label(&Entry::back_reference(), true), "📁 ..");
    }

    #[test]
    fn plain_labels_without_icons() {
        assert_eq!(
            entry_label(&Entry::new("nvim", true, true), false),
            "[M] nvim/"
        );
        assert_eq!(
            entry_label(&Entry::new("notes.txt", false, false), false),
            "[ ] notes.txt"
        );
        assert_eq!(entry_label(&Entry::back_reference(), false), "../");
    }

    #[test]
    fn theme_follows_config() {
        let mut config = AppConfig {
            theme: "mono".to_string(),
            show_icons: false,
            ..AppConfig::default()
        };
        let theme = Theme::from_config(&config);
        assert!(!theme.show_icons);
        assert_eq!(theme.managed, Style::default());

        config.theme = "neon".to_string();
        let theme = Theme::from_config(&config);
        assert_eq!(theme.managed, Style::default().fg(Color::Green));
    }

    #[test]
    fn help_text_lists_every_binding() {
        let help = help_text();
        for (key, label) in KEY_BINDINGS {
            assert!(help.contains(&format!("{key} {label}")));
        }
    }

    #[test]
    fn draw_renders_title_entries_and_notice() {
        let mut app = App::new(PathBuf::from("/home/u"), Duration::from_secs(2));
        app.replace_entries(
            crate::domain::ListView::Managed,
            vec![Entry::new(".zshrc", true, false)],
        );
        app.notify_error("cannot navigate to file", Instant::now());
        let theme = Theme::from_config(&AppConfig::default());

        let mut terminal = Terminal::new(TestBackend::new(80, 10)).expect("terminal");
        terminal
            .draw(|frame| draw(frame, &mut app, &theme))
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let text: String = buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Managed"));
        assert!(text.contains(".zshrc"));
        assert!(text.contains("cannot navigate to file"));
        assert!(text.contains("IDLE"));
    }
}
