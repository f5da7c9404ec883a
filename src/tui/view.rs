use crate::model::Theme;
use crate::tui::state::{AppState, Confirm, InputMode, SettingRow};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let settings = state.settings();
    let notification_height = if settings.notification { 3 } else { 0 };

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(notification_height),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(v_chunks[1]);

    let accent = match settings.theme {
        Theme::Light => Color::Blue,
        Theme::Dark if settings.use_pure_dark => Color::White,
        _ => Color::Yellow,
    };

    // --- Ongoing notification ---
    if settings.notification
        && let Some(active) = state.active()
    {
        let text = format!(
            "{}: {}    [:-  ]:+",
            active.display_name(),
            active.value
        );
        let bar = Paragraph::new(text)
            .style(Style::default().fg(Color::Cyan))
            .block(Block::default().borders(Borders::ALL).title(" Notification "));
        f.render_widget(bar, v_chunks[0]);
    }

    // --- Counter list ---
    let active_id = state.app.store().active_id();
    let items: Vec<ListItem> = state
        .app
        .store()
        .counters()
        .iter()
        .map(|c| {
            let prefix = if Some(c.id) == active_id { "* " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}{}", prefix, c.display_name())),
                Span::styled(format!("  {}", c.value), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let title = format!(" Counters ({}) ", state.app.store().len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(accent)),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Blue),
        );
    f.render_stateful_widget(list, h_chunks[0], &mut state.list_state);

    // --- Active value ---
    let (name, value) = match state.active() {
        Some(c) => (c.display_name(), c.value.to_string()),
        None => (String::new(), "-".to_string()),
    };
    let inner_height = h_chunks[1].height.saturating_sub(2);
    let mut lines = vec![Line::from(""); (inner_height / 2).saturating_sub(1) as usize];
    lines.push(Line::from(Span::styled(
        value,
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    )));
    let value_panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", name)));
    f.render_widget(value_panel, h_chunks[1]);

    // --- Footer ---
    let footer_area = v_chunks[2];
    let prompt = match state.mode {
        InputMode::AddingName => Some(format!(
            " New counter (empty for {}) ",
            state
                .app
                .store()
                .next_default_name()
                .unwrap_or_else(|_| "default".to_string())
        )),
        InputMode::AddingValue => Some(" Initial value ".to_string()),
        InputMode::Renaming => Some(" Rename (empty for default) ".to_string()),
        InputMode::SettingValue => Some(" Set value ".to_string()),
        InputMode::Importing => Some(" Import JSON file ".to_string()),
        _ => None,
    };

    if let Some(title) = prompt {
        let prefix = "> ";
        let input = Paragraph::new(format!("{}{}", prefix, state.input_buffer))
            .style(Style::default().fg(Color::Magenta))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, footer_area);
        let cursor_x =
            footer_area.x + 1 + prefix.chars().count() as u16 + state.cursor_position as u16;
        let cursor_y = footer_area.y + 1;
        f.set_cursor_position((cursor_x, cursor_y));
    } else {
        let f_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(footer_area);
        let status = Paragraph::new(state.message.clone())
            .style(Style::default().fg(Color::Cyan))
            .block(
                Block::default()
                    .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
                    .title(" Status "),
            );
        let help = Paragraph::new(
            "+/-:Count | r:Reset | a:Add | e:Name | v:Value | d/D:Del | Tab:Next | x/c:Export | i:Import | S:Settings | q:Quit",
        )
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
                .title(" Actions "),
        );
        f.render_widget(status, f_chunks[0]);
        f.render_widget(help, f_chunks[1]);
    }

    // --- Popups ---
    if let InputMode::Confirming(what) = state.mode {
        let question = match what {
            Confirm::Reset => "Reset the counter to 0?",
            Confirm::Delete => "Delete this counter?",
            Confirm::DeleteAll => "Delete ALL counters?",
        };
        let area = centered_rect(40, 20, f.area());
        let popup = Paragraph::new(format!("{}\n\ny / n", question))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(" Confirm ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }

    if state.mode == InputMode::Settings {
        let area = centered_rect(60, 60, f.area());
        let items: Vec<ListItem> = SettingRow::ALL
            .iter()
            .map(|row| ListItem::new(format!("{} {}", row.value(&settings), row.label())))
            .collect();
        let popup = List::new(items)
            .block(
                Block::default()
                    .title(" Settings (Enter:Toggle | Esc:Close) ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(accent)),
            )
            .highlight_style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::Blue),
            );

        f.render_widget(Clear, area);
        f.render_stateful_widget(popup, area, &mut state.settings_state);
    }
}

/// Helper function to create a centered rect using up certain percentages of the available rect.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
