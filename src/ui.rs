use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Tabs, Wrap},
};

use crate::domain::CMDMode;
use crate::model::{CellView, Model, RowView, UIData};

pub const SECTION_TABS_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const CMDLINE_HEIGH: usize = 2;
pub const COLUMN_SPACING: usize = 1;

const MATCH_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Yellow);
const CURRENT_MATCH_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::LightRed)
    .add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);
const GROUP_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const SEPARATOR_STYLE: Style = Style::new().fg(Color::DarkGray);

#[derive(Debug, Default)]
pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [tabs_area, table_area, status_area, cmd_area] = Layout::vertical([
            Constraint::Length(SECTION_TABS_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length((CMDLINE_HEIGH - 1) as u16),
        ])
        .areas(frame.area());

        self.draw_sections(uidata, frame, tabs_area);
        match &uidata.placeholder {
            Some(message) => {
                let text = Paragraph::new(message.as_str().italic())
                    .centered()
                    .wrap(Wrap { trim: true });
                frame.render_widget(text, table_area);
            }
            None => self.draw_table(uidata, frame, table_area),
        }
        self.draw_statusline(uidata, frame, status_area);
        self.draw_cmdline(uidata, frame, cmd_area);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_sections(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(uidata.sections.iter().map(|s| s.as_str()))
            .select(uidata.current_section)
            .highlight_style(Style::new().bold().reversed())
            .divider("|");
        frame.render_widget(tabs, area);
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let width = area.width as usize;
        let mut lines = Vec::with_capacity(uidata.rows.len() + 1);

        let header: Vec<Span> = uidata
            .header
            .iter()
            .map(|c| Span::styled(fit(&c.name, c.width + COLUMN_SPACING), Style::new().bold().underlined()))
            .collect();
        lines.push(Line::from(header));

        for (ridx, row) in uidata.rows.iter().enumerate() {
            let selected = ridx == uidata.selected_row;
            let line = match row {
                RowView::Separator => {
                    let style = if selected { SEPARATOR_STYLE.patch(SELECTED_STYLE) } else { SEPARATOR_STYLE };
                    Line::from(Span::styled("\u{2500}".repeat(width), style))
                }
                RowView::Group(cell) => {
                    let style = cell_style(cell, selected, GROUP_STYLE);
                    Line::from(Span::styled(fit(&cell.text, width), style))
                }
                RowView::Data(cells) => Line::from(
                    cells
                        .iter()
                        .enumerate()
                        .flat_map(|(cidx, cell)| {
                            let is_cursor = selected && cidx == uidata.selected_column;
                            [
                                Span::styled(
                                    fit(&cell.text, cell.width),
                                    cell_style(cell, is_cursor, Style::new()),
                                ),
                                Span::raw(" ".repeat(COLUMN_SPACING)),
                            ]
                        })
                        .collect::<Vec<Span>>(),
                ),
            };
            lines.push(line);
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let section = uidata
            .sections
            .get(uidata.current_section)
            .map(String::as_str)
            .unwrap_or("-");
        let (pos, total) = uidata.search_position;
        let mut spans = vec![Span::styled(
            format!(" {section} "),
            Style::new().bold().reversed(),
        )];
        if let Some(counter) = row_counter(uidata) {
            spans.push(Span::raw(counter));
        }
        if !uidata.search_query.is_empty() {
            spans.push(Span::styled(
                format!(" /{} [{pos}/{total}] ", uidata.search_query),
                Style::new().fg(Color::Yellow),
            ));
        }
        spans.push(Span::raw(format!(" {}", uidata.status_message)));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if !uidata.active_cmdinput {
            return;
        }
        let prompt = match uidata.cmd_mode {
            Some(CMDMode::Search) => "/",
            None => ":",
        };
        let (pos, total) = uidata.search_position;
        let line = Line::from(vec![
            Span::styled(prompt, Style::new().bold()),
            Span::raw(uidata.cmdinput.input.clone()),
            Span::styled(format!("  {pos}/{total}"), Style::new().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        frame.set_cursor_position(Position::new(
            area.x + (prompt.len() + uidata.cmdinput.curser_pos) as u16,
            area.y,
        ));
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = centered(frame.area(), 60, 16);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(uidata.popup_message.as_str()).block(block), area);
    }
}

/// Position of the cursor row, nothing for placeholder sections.
fn row_counter(uidata: &UIData) -> Option<String> {
    if uidata.placeholder.is_some() {
        return None;
    }
    Some(format!(" {}/{} ", uidata.abs_selected_row + 1, uidata.nrows))
}

fn cell_style(cell: &CellView, is_cursor: bool, base: Style) -> Style {
    let style = if cell.current {
        CURRENT_MATCH_STYLE
    } else if cell.matched {
        MATCH_STYLE
    } else {
        base
    };
    if is_cursor { style.patch(SELECTED_STYLE) } else { style }
}

/// Pad or cut `text` to exactly `width` chars; cut text ends in `…`.
fn fit(text: &str, width: usize) -> String {
    let text = text.replace(['\r', '\n'], " ");
    let len = text.chars().count();
    if len <= width {
        format!("{text:<width$}")
    } else if width == 0 {
        String::new()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('\u{2026}');
        cut
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_pads_and_cuts() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc\u{2026}");
        assert_eq!(fit("a\nb", 3), "a b");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn row_counter_skips_placeholders() {
        let mut uidata = UIData::empty();
        uidata.nrows = 5;
        uidata.abs_selected_row = 2;
        assert_eq!(row_counter(&uidata).as_deref(), Some(" 3/5 "));
        uidata.placeholder = Some("s3: data unavailable".to_string());
        assert_eq!(row_counter(&uidata), None);
    }

    #[test]
    fn centered_is_clamped() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered(area, 60, 16), area);
        assert_eq!(centered(area, 10, 4), Rect::new(5, 3, 10, 4));
    }
}
