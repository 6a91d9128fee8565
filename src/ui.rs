use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use crate::legend::{InfoPanel, LegendLayout, TickKind};
use crate::popup::PopupContent;
use crate::state::AppState;

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ].as_ref())
        .split(f.area());

    draw_menu(f, state, chunks[0]);
    draw_map(f, state, chunks[1]);

    // Prawy panel: statystyki + legenda + status
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(8),
            Constraint::Length(7),
        ].as_ref())
        .split(chunks[2]);

    let info = Paragraph::new(info_lines(state.scene.info.as_ref()))
        .block(Block::default().borders(Borders::ALL).title("Region Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, right_chunks[0]);

    let legend_area = right_chunks[1];
    let legend_text = match &state.scene.legend {
        Some(legend) => legend_lines(legend, legend_area.width.saturating_sub(2)),
        None => vec![Line::from("")],
    };
    let legend = Paragraph::new(legend_text)
        .block(Block::default().borders(Borders::ALL).title("Legend"));
    f.render_widget(legend, legend_area);

    let status = if state.status.is_empty() { AppState::HELP_TEXT } else { state.status.as_str() };
    let status = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, right_chunks[2]);
}

fn draw_menu(f: &mut Frame, state: &mut AppState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let label = Paragraph::new(state.menu.label().to_string())
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Region"));
    f.render_widget(label, parts[0]);
    state.areas.label = parts[0];

    if !state.menu.is_visible() {
        state.areas.list = None;
        return;
    }

    let items: Vec<ListItem> = state.menu.entries()
        .iter()
        .map(|e| ListItem::new(e.name.clone()))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Regions"))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Red));
    f.render_stateful_widget(list, parts[1], state.menu.list_state());
    state.areas.list = Some(parts[1]);
}

fn draw_map(f: &mut Frame, state: &mut AppState, area: Rect) {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    state.areas.map = inner;
    state
        .scene
        .map
        .set_canvas_size(f64::from(inner.width) * 2.0, f64::from(inner.height) * 4.0);
    let view = *state.scene.map.view();
    state.cursor.0 = state.cursor.0.min(view.width);
    state.cursor.1 = state.cursor.1.min(view.height);

    let title = state
        .scene
        .session
        .as_ref()
        .map_or_else(|| "Map".to_string(), |s| format!("{} [{}]", s.name, s.gid));
    state.scene.map.render(f, area, &title, Some(state.cursor_coord()));

    state.areas.popup = None;
    let popup = state.scene.interaction.popup();
    let (Some(anchor), Some(content)) = (popup.anchor(), popup.content()) else {
        return;
    };
    let (px, py) = view.to_pixel(anchor);
    if !(0.0..view.width).contains(&px) || !(0.0..view.height).contains(&py) {
        return;
    }
    let col = inner.x + (px / 2.0) as u16;
    let row = inner.y + (py / 4.0) as u16;
    let popup_area = popup_rect(col, row, content, inner);

    let lines: Vec<Line> = content
        .rows()
        .into_iter()
        .map(|(label, value)| Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(value),
        ]))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(content.title())
        .title_top(Line::from("[x]").right_aligned());
    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);
    state.areas.popup = Some(popup_area);
}

/// Dymek nad kotwicą, przesunięty tak, żeby zmieścił się w mapie
fn popup_rect(col: u16, row: u16, content: &PopupContent, bounds: Rect) -> Rect {
    let rows = content.rows();
    let text_width = rows
        .iter()
        .map(|(label, value)| label.chars().count() + value.chars().count() + 2)
        .max()
        .unwrap_or(0)
        .max(content.title().len() + 4) as u16;
    let width = (text_width + 2).min(bounds.width);
    let height = (rows.len() as u16 + 2).min(bounds.height);

    let x = col.min(bounds.right().saturating_sub(width)).max(bounds.x);
    let y = row
        .saturating_sub(height)
        .max(bounds.y)
        .min(bounds.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}

fn info_lines(info: Option<&InfoPanel>) -> Vec<Line<'static>> {
    let Some(info) = info else {
        return vec![Line::from("Choose a region to see its statistics")];
    };
    [("Minimum", &info.min), ("Average", &info.avg), ("Median", &info.med), ("Maximum", &info.max)]
        .into_iter()
        .map(|(label, value)| Line::from(format!("{label}: {value}")))
        .collect()
}

/// Oś legendy przeskalowana z 280 px do szerokości panelu
fn legend_lines(legend: &LegendLayout, cols: u16) -> Vec<Line<'static>> {
    let cols = usize::from(cols.max(2));
    let column = |offset: f64| -> usize {
        let c = (offset / legend.width * (cols - 1) as f64).round();
        if c.is_finite() { c.clamp(0.0, (cols - 1) as f64) as usize } else { 0 }
    };

    let mut axis: Vec<char> = vec!['─'; cols];
    for tick in &legend.ticks {
        axis[column(tick.offset)] = '┬';
    }

    let mut lines = vec![Line::from(axis.into_iter().collect::<String>())];
    for tick in &legend.ticks {
        let name = match tick.kind {
            TickKind::Min => "min",
            TickKind::Max => "max",
            TickKind::Average => "avg",
            TickKind::Median => "med",
        };
        let text = format!("▲ {name} {}", tick.label);
        let start = column(tick.offset).min(cols.saturating_sub(text.chars().count()));
        lines.push(Line::from(format!("{}{text}", " ".repeat(start))));
    }
    lines
}
