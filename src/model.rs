use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::domain::{CMDMode, HELP_TEXT, LTVConfig, Message};
use crate::inputter::{InputResult, Inputter};
use crate::parser::write_row;
use crate::pipeline::Dataset;
use crate::render::{Rendered, RenderedRow, TableModel};
use crate::search::SearchState;
use crate::source::DataSource;
use crate::ui::{CMDLINE_HEIGH, COLUMN_SPACING, SECTION_TABS_HEIGHT, TABLE_HEADER_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// Cursor and scroll position of one dataset.
struct SectionView {
    dataset: Dataset,
    widths: Vec<usize>,
    curser_row: usize,
    curser_column: usize,
    offset_row: usize,
    offset_column: usize,
}

impl SectionView {
    fn new(dataset: Dataset, max_column_width: usize) -> Self {
        let widths = dataset
            .rendered
            .table()
            .map(|t| t.column_widths(max_column_width))
            .unwrap_or_default();
        SectionView {
            dataset,
            widths,
            curser_row: 0,
            curser_column: 0,
            offset_row: 0,
            offset_column: 0,
        }
    }

    fn table(&self) -> Option<&TableModel> {
        self.dataset.rendered.table()
    }

    fn nrows(&self) -> usize {
        self.table().map(|t| t.rows.len()).unwrap_or(0)
    }

    fn ncolumns(&self) -> usize {
        self.widths.len()
    }

    /// Columns starting at `offset_column` that fit into `width`. The last
    /// one may be cut.
    fn visible_columns(&self, width: usize) -> Vec<(usize, usize)> {
        let mut visible = Vec::new();
        let mut used = 0;
        for (idx, &w) in self.widths.iter().enumerate().skip(self.offset_column) {
            if used + w + COLUMN_SPACING <= width {
                visible.push((idx, w));
                used += w + COLUMN_SPACING;
            } else {
                if used < width {
                    visible.push((idx, width - used));
                }
                break;
            }
        }
        visible
    }

    fn scroll_into_view(&mut self, table_width: usize, table_height: usize) {
        let height = table_height.max(1);
        if self.curser_row < self.offset_row {
            self.offset_row = self.curser_row;
        } else if self.curser_row >= self.offset_row + height {
            self.offset_row = self.curser_row + 1 - height;
        }

        if self.curser_column < self.offset_column {
            self.offset_column = self.curser_column;
        }
        while self.offset_column < self.curser_column {
            let fully_visible = self
                .visible_columns(table_width)
                .iter()
                .any(|&(idx, w)| idx == self.curser_column && w == self.widths[idx]);
            if fully_visible {
                break;
            }
            self.offset_column += 1;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellView {
    pub text: String,
    pub width: usize,
    pub matched: bool,
    pub current: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RowView {
    Data(Vec<CellView>),
    Separator,
    Group(CellView),
}

pub struct UIData {
    pub sections: Vec<String>,
    pub current_section: usize,
    pub header: Vec<ColumnView>,
    pub rows: Vec<RowView>,
    pub placeholder: Option<String>,
    pub nrows: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub abs_selected_row: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub layout: UILayout,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub search_query: String,
    pub search_position: (usize, usize),
    pub status_message: String,
    pub last_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            sections: Vec::new(),
            current_section: 0,
            header: Vec::new(),
            rows: Vec::new(),
            placeholder: None,
            nrows: 0,
            selected_row: 0,
            selected_column: 0,
            abs_selected_row: 0,
            show_popup: false,
            popup_message: String::new(),
            layout: UILayout::default(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            search_query: String::new(),
            search_position: (0, 0),
            status_message: String::new(),
            last_update: Instant::now(),
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    pub table_height: usize,
    pub statusline_width: usize,
    pub statusline_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_width: ui_width,
            table_height: ui_height
                .saturating_sub(SECTION_TABS_HEIGHT + TABLE_HEADER_HEIGHT + CMDLINE_HEIGH),
            statusline_width: ui_width,
            statusline_height: CMDLINE_HEIGH,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    sections: Vec<SectionView>,
    current_section: usize,
    search: SearchState,
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
}

impl Model {
    pub fn init(
        config: &LTVConfig,
        source: &dyn DataSource,
        ui_width: usize,
        ui_height: usize,
    ) -> Self {
        let start_time = Instant::now();
        let sections: Vec<SectionView> = config
            .datasets
            .iter()
            .cloned()
            .map(|spec| SectionView::new(Dataset::load(source, spec), config.max_column_width))
            .collect();
        info!(
            "Loaded {} dataset(s) in {}ms",
            sections.len(),
            start_time.elapsed().as_millis()
        );

        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Clipboard unavailable: {e}");
                None
            }
        };

        let mut model = Self {
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            sections,
            current_section: 0,
            search: SearchState::new(),
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
        };
        model.set_status_message("Press ? for help");
        model.update_table_data();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) {
        let Some(msg) = message else {
            return;
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);

        if let Message::Resize(width, height) = msg {
            self.ui_resize(width, height);
            return;
        }

        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_selection_down(1),
                Message::MoveUp => self.move_selection_up(1),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::MovePageUp => self.move_selection_up(self.uilayout.table_height.max(1)),
                Message::MovePageDown => {
                    self.move_selection_down(self.uilayout.table_height.max(1))
                }
                Message::MoveBeginning => self.move_selection_up(usize::MAX),
                Message::MoveEnd => self.move_selection_down(usize::MAX),
                Message::NextSection => self.switch_section(1),
                Message::PrevSection => self.switch_section(-1),
                Message::Search => self.enter_cmd_mode(CMDMode::Search),
                Message::SearchNext => self.search_next(1),
                Message::SearchPrev => self.search_next(-1),
                Message::CopyCell => self.copy_cell(),
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_help(),
                Message::Exit => self.clear_search(),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit_popup(),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key)
                }
            }
        }
    }

    // -------------------- Control handling functions ---------------------- //

    fn current(&self) -> Option<&SectionView> {
        self.sections.get(self.current_section)
    }

    fn current_mut(&mut self) -> Option<&mut SectionView> {
        self.sections.get_mut(self.current_section)
    }

    fn switch_section(&mut self, step: isize) {
        let n = self.sections.len();
        if n < 2 {
            return;
        }
        self.current_section = (self.current_section as isize + step).rem_euclid(n as isize) as usize;
        debug!("Switched to section {}", self.current_section);

        // A different table invalidates all matches
        let table = self.sections[self.current_section].dataset.rendered.table();
        self.search.refresh(table);
        self.select_current_match();
        self.update_table_data();
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
        self.uidata.last_update = Instant::now();
    }

    fn exit_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.uidata.show_popup = false;
        self.uidata.last_update = Instant::now();
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {mode:?}");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;

        // Continue editing the active query
        self.input.set(self.search.query());
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.active_cmdinput {
            return;
        }
        self.last_input = self.input.read(key);

        if self.last_input.changed && self.cmd_mode == Some(CMDMode::Search) {
            self.run_search();
        }
        if self.last_input.finished {
            self.leave_cmd_mode();
        }
        self.update_table_data();
    }

    fn leave_cmd_mode(&mut self) {
        trace!("Leave cmd input {:?}", self.last_input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        self.cmd_mode = None;
        self.input.clear();
    }

    fn run_search(&mut self) {
        let query = self.last_input.input.clone();
        let table = self.sections.get(self.current_section).and_then(SectionView::table);
        self.search.set_query(&query, table);
        self.select_current_match();
    }

    fn clear_search(&mut self) {
        if !self.search.query().is_empty() {
            self.search.clear();
            self.set_status_message("Search cleared");
            self.update_table_data();
        }
    }

    fn search_next(&mut self, step: isize) {
        let next = if step >= 0 {
            self.search.next()
        } else {
            self.search.prev()
        };
        if next.is_some() {
            self.select_current_match();
            self.update_table_data();
        }
    }

    fn select_current_match(&mut self) {
        let (pos, total) = self.search.position();
        match self.search.current() {
            Some(m) => {
                self.select_cell(m.row, m.column);
                self.set_status_message(format!("Search result {pos}/{total}"));
            }
            None if !self.search.query().is_empty() => self.set_status_message("Found no matches!"),
            None => {}
        }
    }

    fn select_cell(&mut self, row: usize, column: usize) {
        let (width, height) = (self.uilayout.table_width, self.uilayout.table_height);
        if let Some(view) = self.current_mut() {
            trace!("Select cell {}:{}", row, column);
            view.curser_row = row;
            view.curser_column = column.min(view.ncolumns().saturating_sub(1));
            view.scroll_into_view(width, height);
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        let (width, height) = (self.uilayout.table_width, self.uilayout.table_height);
        if let Some(view) = self.current_mut() {
            view.curser_row = view.curser_row.saturating_sub(size);
            view.scroll_into_view(width, height);
        }
        self.update_table_data();
    }

    fn move_selection_down(&mut self, size: usize) {
        let (width, height) = (self.uilayout.table_width, self.uilayout.table_height);
        if let Some(view) = self.current_mut() {
            let last = view.nrows().saturating_sub(1);
            view.curser_row = view.curser_row.saturating_add(size).min(last);
            view.scroll_into_view(width, height);
        }
        self.update_table_data();
    }

    fn move_selection_left(&mut self) {
        let (width, height) = (self.uilayout.table_width, self.uilayout.table_height);
        if let Some(view) = self.current_mut() {
            view.curser_column = view.curser_column.saturating_sub(1);
            view.scroll_into_view(width, height);
        }
        self.update_table_data();
    }

    fn move_selection_right(&mut self) {
        let (width, height) = (self.uilayout.table_width, self.uilayout.table_height);
        if let Some(view) = self.current_mut() {
            let last = view.ncolumns().saturating_sub(1);
            view.curser_column = (view.curser_column + 1).min(last);
            view.scroll_into_view(width, height);
        }
        self.update_table_data();
    }

    /// Text of the selected cell, the caption for group rows.
    fn selected_cell(&self) -> Option<String> {
        let view = self.current()?;
        match view.table()?.rows.get(view.curser_row)? {
            RenderedRow::Data(cells) => cells.get(view.curser_column).cloned(),
            RenderedRow::Group(title) => Some(title.clone()),
            RenderedRow::Separator => None,
        }
    }

    fn selected_row(&self) -> Option<String> {
        let view = self.current()?;
        let delimiter = view.dataset.spec.delimiter.unwrap_or(',');
        match view.table()?.rows.get(view.curser_row)? {
            RenderedRow::Data(cells) => Some(write_row(cells, delimiter)),
            RenderedRow::Group(title) => Some(title.clone()),
            RenderedRow::Separator => None,
        }
    }

    fn copy_cell(&mut self) {
        if let Some(cell) = self.selected_cell() {
            trace!("Cell content: {}", cell);
            self.copy_to_clipboard(cell);
        }
    }

    fn copy_row(&mut self) {
        if let Some(row) = self.selected_row() {
            trace!("Row content: {}", row);
            self.copy_to_clipboard(row);
        }
    }

    fn copy_to_clipboard(&mut self, text: String) {
        let Some(clipboard) = self.clipboard.as_mut() else {
            self.set_status_message("No clipboard available");
            return;
        };
        match clipboard.set_text(text) {
            Ok(_) => self.set_status_message("Copied to clipboard"),
            Err(e) => {
                warn!("Error copying to clipboard: {:?}", e);
                self.set_status_message("Copy failed");
            }
        }
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        let table_height = self.uilayout.table_height;
        let table_width = self.uilayout.table_width;
        for view in self.sections.iter_mut() {
            view.scroll_into_view(table_width, table_height);
        }
        self.update_table_data();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_update = Instant::now();
    }

    // -------------------- View building ---------------------- //

    fn update_table_data(&mut self) {
        let layout = self.uilayout.clone();
        let mut uidata = UIData::empty();

        match self.current() {
            None => {
                uidata.placeholder = Some("No datasets given.".to_string());
            }
            Some(view) => match &view.dataset.rendered {
                Rendered::Placeholder(msg) => uidata.placeholder = Some(msg.clone()),
                Rendered::Table(table) => {
                    let columns = view.visible_columns(layout.table_width);
                    uidata.header = columns
                        .iter()
                        .map(|&(idx, width)| ColumnView {
                            name: table.header[idx].clone(),
                            width,
                        })
                        .collect();

                    let rbegin = view.offset_row;
                    let rend = std::cmp::min(rbegin + layout.table_height, table.rows.len());
                    uidata.rows = (rbegin..rend)
                        .map(|ridx| self.build_row_view(table, ridx, &columns, layout.table_width))
                        .collect();

                    uidata.nrows = table.rows.len();
                    uidata.abs_selected_row = view.curser_row;
                    uidata.selected_row = view.curser_row.saturating_sub(rbegin);
                    uidata.selected_column = columns
                        .iter()
                        .position(|&(idx, _)| idx == view.curser_column)
                        .unwrap_or(0);
                }
            },
        }

        uidata.sections = self
            .sections
            .iter()
            .map(|s| s.dataset.spec.name.clone())
            .collect();
        uidata.current_section = self.current_section;
        uidata.show_popup = self.uidata.show_popup;
        uidata.popup_message = self.uidata.popup_message.clone();
        uidata.layout = layout;
        uidata.cmdinput = self.last_input.clone();
        uidata.cmd_mode = self.cmd_mode;
        uidata.active_cmdinput = self.active_cmdinput;
        uidata.search_query = self.search.query().to_string();
        uidata.search_position = self.search.position();
        uidata.status_message = self.status_message.clone();
        self.uidata = uidata;
    }

    fn update_uidata(&mut self) {
        self.uidata.cmdinput = self.last_input.clone();
        self.uidata.cmd_mode = self.cmd_mode;
        self.uidata.active_cmdinput = self.active_cmdinput;
        self.uidata.last_update = Instant::now();
    }

    fn build_row_view(
        &self,
        table: &TableModel,
        ridx: usize,
        columns: &[(usize, usize)],
        full_width: usize,
    ) -> RowView {
        match &table.rows[ridx] {
            RenderedRow::Separator => RowView::Separator,
            RenderedRow::Group(title) => RowView::Group(CellView {
                text: title.clone(),
                width: full_width,
                matched: self.search.is_match(ridx, 0),
                current: self.search.is_current(ridx, 0),
            }),
            RenderedRow::Data(cells) => RowView::Data(
                columns
                    .iter()
                    .map(|&(cidx, width)| CellView {
                        text: cells[cidx].clone(),
                        width,
                        matched: self.search.is_match(ridx, cidx),
                        current: self.search.is_current(ridx, cidx),
                    })
                    .collect(),
            ),
        }
    }
}
