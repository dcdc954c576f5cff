use arboard::Clipboard;
use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

use crate::domain::{HELP_TEXT, Message, SiftConfig, SiftError};
use crate::filter::{FilterRegistry, RowState, apply_predicate, build_predicate};
use crate::inputter::{InputResult, Inputter};
use crate::plot::{self, PlotKind, PlotView};

const MAX_CATEGORY_VALUES: usize = 8;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modus {
    TABLE,
    FILTER,
    PLOT,
    POPUP,
    CMDINPUT,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// Stringified column data for the output pane.
pub struct Column {
    name: String,
    width: usize,
    data: Vec<String>,
}

impl Column {
    pub fn as_string(&self) -> String {
        format!(
            "\"{}\", width: {}, # rows {}",
            self.name,
            self.width,
            self.data.len(),
        )
    }
}

/// Highlight tag for a region of the output pane, distinguishing a filtered
/// view from the full dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HighlightStyle {
    UNFILTERED,
    FILTERED,
}

/// The output surface the model writes table renderings into. Owned by the
/// model, painted by the ui.
pub struct OutputPane {
    lines: Vec<String>,
    highlights: Vec<(Range<usize>, HighlightStyle)>,
}

impl OutputPane {
    fn empty() -> Self {
        OutputPane {
            lines: Vec::new(),
            highlights: Vec::new(),
        }
    }

    pub fn replace_content(&mut self, rendered: &str) {
        self.lines = rendered.lines().map(str::to_string).collect();
        self.highlights.clear();
    }

    pub fn highlight_region(&mut self, region: Range<usize>, style: HighlightStyle) {
        self.highlights.push((region, style));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn style_for(&self, line: usize) -> Option<HighlightStyle> {
        self.highlights
            .iter()
            .rev()
            .find(|(region, _)| region.contains(&line))
            .map(|(_, style)| *style)
    }
}

/// Column choices for the three plot types, plus the scatter category
/// restriction.
struct PlotSelection {
    line_y: String,
    bar_y: String,
    scatter_x: String,
    scatter_y: String,
    use_category: bool,
    category_column: Option<String>,
    category_values: Vec<String>,
}

impl PlotSelection {
    /// Default to the first numeric columns after the record id column, so
    /// fresh plots have something sensible on the y axis.
    fn from_frame(df: &DataFrame) -> Self {
        let numeric: Vec<String> = df
            .get_columns()
            .iter()
            .skip(1)
            .filter(|c| is_numeric_type(c.dtype()))
            .map(|c| c.name().to_string())
            .collect();
        let fallback = column_names(df).first().cloned().unwrap_or_default();
        let pick = |idx: usize| {
            numeric
                .get(idx)
                .or_else(|| numeric.first())
                .cloned()
                .unwrap_or_else(|| fallback.clone())
        };
        PlotSelection {
            line_y: pick(0),
            bar_y: pick(1),
            scatter_x: pick(0),
            scatter_y: pick(1),
            use_category: false,
            category_column: None,
            category_values: Vec::new(),
        }
    }
}

pub struct Model {
    file_info: FileInfo,
    config: SiftConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    data: DataFrame,
    view: Option<DataFrame>,
    columns: Vec<Column>,
    registry: FilterRegistry,
    filter_cursor: usize,
    output: OutputPane,
    plot: Option<PlotView>,
    plot_sel: PlotSelection,
    cursor_row: usize,
    cursor_column: usize,
    clipboard: Option<Clipboard>,
    input: Inputter,
    status_message: String,
}

impl Model {
    pub fn load(path: PathBuf, config: SiftConfig) -> Result<Self, SiftError> {
        let file_info = Model::get_file_info(path)?;
        let frame = match file_info.file_type {
            FileType::CSV => Model::load_csv(&file_info.path)?,
            FileType::PARQUET => Model::load_parquet(&file_info.path)?,
            FileType::ARROW => Model::load_arrow(&file_info.path)?,
        };

        let mut data = frame.collect().map_err(SiftError::from)?;
        clean_column_names(&mut data)?;
        let names = column_names(&data);
        info!(
            "Loaded {:?} ({} bytes): {} rows, {} columns",
            file_info.path,
            file_info.file_size,
            data.height(),
            names.len()
        );

        let registry = FilterRegistry::new(names.len());
        let plot_sel = PlotSelection::from_frame(&data);

        let mut model = Self {
            file_info,
            config,
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            data,
            view: None,
            columns: Vec::new(),
            registry,
            filter_cursor: 0,
            output: OutputPane::empty(),
            plot: None,
            plot_sel,
            cursor_row: 0,
            cursor_column: 0,
            clipboard: None,
            input: Inputter::default(),
            status_message: String::new(),
        };
        model.show_all();
        model.set_status_message("Loaded data ...");
        Ok(model)
    }

    pub fn update(&mut self, message: Message) -> Result<(), SiftError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_table_selection_up(1),
                Message::MoveDown => self.move_table_selection_down(1),
                Message::MoveLeft => self.move_table_selection_left(),
                Message::MoveRight => self.move_table_selection_right(),
                Message::MovePageUp => self.move_table_selection_up(self.config.page_size),
                Message::MovePageDown => self.move_table_selection_down(self.config.page_size),
                Message::MoveBeginning => self.cursor_row = 0,
                Message::MoveEnd => self.cursor_row = self.nrows().saturating_sub(1),
                Message::CopyCell => self.copy_table_cell(),
                Message::CopyRow => self.copy_table_row(),
                Message::FilterMode => self.enter_filter_mode(),
                Message::Enter => self.apply_filter(),
                Message::ShowAll => self.show_all_with_message(),
                Message::LinePlot => self.show_line_plot(),
                Message::BarPlot => self.show_bar_plot(),
                Message::ScatterPlot => self.show_scatter_plot(),
                Message::Help => self.show_help(),
                _ => (),
            },
            Modus::FILTER => match message {
                Message::Quit => self.quit(),
                Message::Exit => self.modus = Modus::TABLE,
                Message::MoveUp => self.move_filter_cursor(-1),
                Message::MoveDown => self.move_filter_cursor(1),
                Message::NextColumnChoice => self.cycle_filter_column(1),
                Message::PrevColumnChoice => self.cycle_filter_column(-1),
                Message::EditCriterion => self.edit_criterion(),
                Message::ToggleRowAffordance => self.toggle_filter_row(),
                Message::Enter => self.apply_filter(),
                Message::ShowAll => self.show_all_with_message(),
                Message::Help => self.show_help(),
                _ => (),
            },
            Modus::PLOT => match message {
                Message::Quit => self.quit(),
                Message::Exit => {
                    self.plot = None;
                    self.modus = Modus::TABLE;
                }
                Message::LinePlot => self.show_line_plot(),
                Message::BarPlot => self.show_bar_plot(),
                Message::ScatterPlot => self.show_scatter_plot(),
                Message::CycleX => self.cycle_plot_x(),
                Message::CycleY => self.cycle_plot_y(),
                Message::ToggleCategory => self.toggle_category(),
                Message::Help => self.show_help(),
                _ => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter => {
                    self.modus = self.previous_modus;
                    self.previous_modus = Modus::POPUP;
                }
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = message {
                    self.raw_input(key);
                }
            }
        }
        Ok(())
    }

    // -------------------- accessors for the ui ---------------------- //

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn output(&self) -> &OutputPane {
        &self.output
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn filter_cursor(&self) -> usize {
        self.filter_cursor
    }

    pub fn plot(&self) -> Option<&PlotView> {
        self.plot.as_ref()
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_column)
    }

    pub fn current_column_name(&self) -> Option<&str> {
        self.columns.get(self.cursor_column).map(|c| c.name.as_str())
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn popup(&self) -> Option<&'static str> {
        (self.modus == Modus::POPUP).then_some(HELP_TEXT)
    }

    pub fn cmdinput(&self) -> Option<InputResult> {
        (self.modus == Modus::CMDINPUT).then(|| self.input.get())
    }

    pub fn table_name(&self) -> String {
        let name = self
            .file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???");
        if self.view.is_some() {
            format!("F[{name}]")
        } else {
            name.to_string()
        }
    }

    pub fn displayed_frame(&self) -> &DataFrame {
        self.view.as_ref().unwrap_or(&self.data)
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    // -------------------- filtering ---------------------- //

    /// Build the conjunctive predicate from all filter rows and replace the
    /// displayed view with the matching subset. With no usable rows the
    /// current view is left alone; the same holds when evaluation fails,
    /// e.g. for a stale column selection.
    fn apply_filter(&mut self) {
        let terms = self.registry.terms();
        let Some(predicate) = build_predicate(&terms) else {
            debug!("No valid filter");
            self.set_status_message("No valid filter.");
            return;
        };

        match apply_predicate(&self.data, predicate) {
            Ok(frame) => {
                self.set_status_message(format!(
                    "Filter matched {} of {} rows",
                    frame.height(),
                    self.data.height()
                ));
                self.view = Some(frame);
                self.show_frame(HighlightStyle::FILTERED);
            }
            Err(e) => {
                error!("Filter evaluation failed: {e}");
                self.set_status_message(format!("Filter failed: {e}"));
            }
        }
    }

    fn show_all(&mut self) {
        self.view = None;
        self.show_frame(HighlightStyle::UNFILTERED);
    }

    fn show_all_with_message(&mut self) {
        self.show_all();
        self.set_status_message(format!("Showing all {} rows", self.data.height()));
    }

    /// Re-render the displayed frame into the output pane and tag the
    /// header line with the given highlight.
    fn show_frame(&mut self, style: HighlightStyle) {
        let frame = self.view.as_ref().unwrap_or(&self.data);
        match load_columns(frame, self.config.max_column_width) {
            Ok(columns) => {
                for c in columns.iter() {
                    debug!("Column: {}", c.as_string());
                }
                let rendered = render_lines(&columns).join("\n");
                self.output.replace_content(&rendered);
                self.output.highlight_region(0..1, style);
                self.columns = columns;
                self.cursor_row = 0;
                self.cursor_column = 0;
            }
            Err(e) => {
                error!("Failed to render frame: {e}");
                self.set_status_message(format!("Render failed: {e}"));
            }
        }
    }

    fn enter_filter_mode(&mut self) {
        self.modus = Modus::FILTER;
        self.filter_cursor = self.registry.first_visible().unwrap_or(0);
    }

    fn move_filter_cursor(&mut self, step: i32) {
        let visible = self.registry.visible_indices();
        if visible.is_empty() {
            return;
        }
        let pos = visible
            .iter()
            .position(|&idx| idx == self.filter_cursor)
            .unwrap_or(0);
        let next = if step > 0 {
            (pos + 1).min(visible.len() - 1)
        } else {
            pos.saturating_sub(1)
        };
        self.filter_cursor = visible[next];
    }

    fn cycle_filter_column(&mut self, step: i32) {
        let names = column_names(&self.data);
        if names.is_empty() {
            return;
        }
        let next = match self.registry.row(self.filter_cursor).column.as_deref() {
            Some(current) => {
                let pos = names.iter().position(|n| n == current).unwrap_or(0);
                if step > 0 {
                    (pos + 1) % names.len()
                } else {
                    (pos + names.len() - 1) % names.len()
                }
            }
            None => {
                if step > 0 {
                    0
                } else {
                    names.len() - 1
                }
            }
        };
        self.registry
            .set_column(self.filter_cursor, Some(names[next].clone()));
    }

    fn edit_criterion(&mut self) {
        trace!("Editing criterion for row {}", self.filter_cursor);
        let current = self.registry.row(self.filter_cursor).criterion.clone();
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.input.clear();
        self.input.set(&current);
    }

    fn raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        let result = self.input.read(key);
        if result.finished {
            if !result.canceled {
                self.registry
                    .set_criterion(self.filter_cursor, result.input);
            }
            self.modus = self.previous_modus;
            self.previous_modus = Modus::CMDINPUT;
        }
    }

    /// The single affordance key: an addable row reveals the slot after it,
    /// a removable row is cleared, hidden and the remaining criteria are
    /// re-applied right away.
    fn toggle_filter_row(&mut self) {
        let idx = self.filter_cursor;
        match self.registry.state(idx) {
            RowState::Addable => {
                if self.registry.add_row(idx + 1) {
                    trace!("Revealed filter row {}", idx + 1);
                }
            }
            RowState::Removable => {
                self.registry.remove_row(idx);
                if self.registry.first_visible().is_none() {
                    // keep one row on screen so the panel stays usable
                    self.registry.add_row(0);
                }
                self.filter_cursor = self.registry.first_visible().unwrap_or(0);
                self.apply_filter();
            }
            RowState::Hidden => {}
        }
    }

    // -------------------- plotting ---------------------- //

    fn index_column(&self) -> String {
        column_names(&self.data).first().cloned().unwrap_or_default()
    }

    fn show_line_plot(&mut self) {
        let x = self.index_column();
        let y = self.plot_sel.line_y.clone();
        match plot::build_line(&self.data, &x, &y) {
            Ok(view) => self.show_plot(view),
            Err(e) => self.set_status_message(format!("Plot failed: {e}")),
        }
    }

    fn show_bar_plot(&mut self) {
        let x = self.index_column();
        let y = self.plot_sel.bar_y.clone();
        match plot::build_bar(&self.data, &x, &y) {
            Ok(view) => self.show_plot(view),
            Err(e) => self.set_status_message(format!("Plot failed: {e}")),
        }
    }

    fn show_scatter_plot(&mut self) {
        let x = self.plot_sel.scatter_x.clone();
        let y = self.plot_sel.scatter_y.clone();
        let category = self
            .plot_sel
            .use_category
            .then(|| self.plot_sel.category_column.clone())
            .flatten();
        let values = self.plot_sel.category_values.clone();
        match plot::build_scatter(&self.data, &x, &y, category.as_deref(), &values) {
            Ok(view) => self.show_plot(view),
            Err(e) => self.set_status_message(format!("Plot failed: {e}")),
        }
    }

    fn show_plot(&mut self, view: PlotView) {
        if view.series.iter().all(|s| s.points.is_empty()) {
            self.set_status_message("Nothing to plot (no numeric data).");
            return;
        }
        self.plot = Some(view);
        self.modus = Modus::PLOT;
    }

    fn cycle_plot_x(&mut self) {
        if matches!(self.plot.as_ref().map(|v| v.kind), Some(PlotKind::Scatter)) {
            self.plot_sel.scatter_x = self.next_column_after(&self.plot_sel.scatter_x.clone());
            self.show_scatter_plot();
        }
    }

    fn cycle_plot_y(&mut self) {
        let Some(kind) = self.plot.as_ref().map(|v| v.kind) else {
            return;
        };
        match kind {
            PlotKind::Line => {
                self.plot_sel.line_y = self.next_column_after(&self.plot_sel.line_y.clone());
                self.show_line_plot();
            }
            PlotKind::Bar => {
                self.plot_sel.bar_y = self.next_column_after(&self.plot_sel.bar_y.clone());
                self.show_bar_plot();
            }
            PlotKind::Scatter => {
                self.plot_sel.scatter_y = self.next_column_after(&self.plot_sel.scatter_y.clone());
                self.show_scatter_plot();
            }
        }
    }

    fn next_column_after(&self, current: &str) -> String {
        let names = column_names(&self.data);
        if names.is_empty() {
            return String::new();
        }
        let pos = names
            .iter()
            .position(|n| n == current)
            .map(|p| (p + 1) % names.len())
            .unwrap_or(0);
        names[pos].clone()
    }

    /// Toggle the scatter category restriction. Turning it on picks the
    /// first string column and its distinct values as the allowed list.
    fn toggle_category(&mut self) {
        if self.plot_sel.use_category {
            self.plot_sel.use_category = false;
        } else {
            match first_string_column(&self.data) {
                Some(name) => {
                    match plot::distinct_values(&self.data, &name, MAX_CATEGORY_VALUES) {
                        Ok(values) => {
                            debug!("Category {name:?} with values {values:?}");
                            self.plot_sel.category_column = Some(name);
                            self.plot_sel.category_values = values;
                            self.plot_sel.use_category = true;
                        }
                        Err(e) => self.set_status_message(format!("Categories unavailable: {e}")),
                    }
                }
                None => self.set_status_message("No categorical column available."),
            }
        }
        if matches!(self.plot.as_ref().map(|v| v.kind), Some(PlotKind::Scatter)) {
            self.show_scatter_plot();
        }
    }

    // -------------------- table selection and clipboard ---------------------- //

    fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    fn move_table_selection_up(&mut self, size: usize) {
        self.cursor_row = self.cursor_row.saturating_sub(size);
    }

    fn move_table_selection_down(&mut self, size: usize) {
        let max = self.nrows().saturating_sub(1);
        self.cursor_row = std::cmp::min(self.cursor_row + size, max);
    }

    fn move_table_selection_left(&mut self) {
        self.cursor_column = self.cursor_column.saturating_sub(1);
    }

    fn move_table_selection_right(&mut self) {
        let max = self.columns.len().saturating_sub(1);
        self.cursor_column = std::cmp::min(self.cursor_column + 1, max);
    }

    fn clipboard(&mut self) -> Option<&mut Clipboard> {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => warn!("Clipboard unavailable: {e}"),
            }
        }
        self.clipboard.as_mut()
    }

    fn copy_table_cell(&mut self) {
        let Some(cell) = self
            .columns
            .get(self.cursor_column)
            .and_then(|c| c.data.get(self.cursor_row))
            .cloned()
        else {
            return;
        };
        trace!("Cell content: {}", cell);
        self.copy_to_clipboard(cell);
    }

    fn copy_table_row(&mut self) {
        let content = self
            .columns
            .iter()
            .filter_map(|c| c.data.get(self.cursor_row))
            .map(|c| wrap_cell_content(c))
            .collect::<Vec<String>>();
        if content.is_empty() {
            return;
        }
        self.copy_to_clipboard(content.join(","));
    }

    fn copy_to_clipboard(&mut self, content: String) {
        let result = self.clipboard().map(|cb| cb.set_text(content));
        match result {
            Some(Ok(_)) => trace!("Copied content to clipboard."),
            Some(Err(e)) => {
                trace!("Error copying to clipboard: {:?}", e);
                self.set_status_message("Copy failed.");
            }
            None => self.set_status_message("Clipboard unavailable."),
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- loading ---------------------- //

    fn detect_file_type(path: &Path) -> Result<FileType, SiftError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(SiftError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, SiftError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SiftError::FileNotFound,
            ErrorKind::PermissionDenied => SiftError::PermissionDenied,
            _ => SiftError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(SiftError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Model::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        )
    }

    fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.as_path().into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

/// Rewrite spaces in column names to underscores at load time so names stay
/// stable identifiers for predicates.
fn clean_column_names(df: &mut DataFrame) -> PolarsResult<()> {
    let renames: Vec<(String, String)> = df
        .get_column_names()
        .iter()
        .filter(|name| name.contains(' '))
        .map(|name| (name.to_string(), name.replace(' ', "_")))
        .collect();
    for (old, new) in renames {
        debug!("Renaming column {old:?} to {new:?}");
        df.rename(&old, new.into())?;
    }
    Ok(())
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn first_string_column(df: &DataFrame) -> Option<String> {
    df.get_columns()
        .iter()
        .find(|c| c.dtype() == &DataType::String)
        .map(|c| c.name().to_string())
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// Stringify all columns for display, one rayon task per column.
fn load_columns(df: &DataFrame, max_column_width: usize) -> Result<Vec<Column>, PolarsError> {
    df.get_column_names()
        .par_iter()
        .map(|name| load_column(df, name.as_str(), max_column_width))
        .collect()
}

fn load_column(
    df: &DataFrame,
    col_name: &str,
    max_column_width: usize,
) -> Result<Column, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let mut data = Vec::with_capacity(series.len());

    let mut max_width = col_name.len();
    for value in series.into_iter() {
        let ss = match value {
            Some(s) => s.to_string().replace("\r\n", " ↵ ").replace("\n", " ↵ "),
            None => String::from("∅"),
        };
        if ss.len() > max_width {
            max_width = ss.len();
        }
        data.push(ss);
    }

    Ok(Column {
        name: col_name.to_string(),
        width: std::cmp::min(max_width, max_column_width),
        data,
    })
}

fn render_lines(columns: &[Column]) -> Vec<String> {
    let nrows = columns.first().map(|c| c.data.len()).unwrap_or(0);
    let mut lines = Vec::with_capacity(nrows + 1);
    let header = columns
        .iter()
        .map(|c| pad_cell(&c.name, c.width))
        .collect::<Vec<String>>()
        .join(" ");
    lines.push(header);
    for ridx in 0..nrows {
        let line = columns
            .iter()
            .map(|c| pad_cell(&c.data[ridx], c.width))
            .collect::<Vec<String>>()
            .join(" ");
        lines.push(line);
    }
    lines
}

fn pad_cell(value: &str, width: usize) -> String {
    let truncated: String = value.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
pt code,gender,age,TID,stress EF,rest EF
1001,F,67,1.02,62,65
1002,M,54,1.11,55,58
1003,F,48,0.98,66,68
1004,M,71,1.24,49,53
1005,F,59,1.05,61,64
";

    fn sample_model() -> (tempfile::TempDir, Model) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let model = Model::load(path, SiftConfig::default()).unwrap();
        (dir, model)
    }

    #[test]
    fn load_cleans_column_names() {
        let (_dir, model) = sample_model();
        assert_eq!(
            column_names(&model.data),
            vec!["pt_code", "gender", "age", "TID", "stress_EF", "rest_EF"]
        );
        assert_eq!(model.data.height(), 5);
        // one filter slot per column
        assert_eq!(model.registry.visible_indices(), vec![0]);
    }

    #[test]
    fn initial_view_is_unfiltered() {
        let (_dir, model) = sample_model();
        assert!(model.view.is_none());
        assert_eq!(model.output.style_for(0), Some(HighlightStyle::UNFILTERED));
        assert!(model.output.lines()[0].starts_with("pt_code"));
        // header plus one line per row
        assert_eq!(model.output.lines().len(), 6);
    }

    #[test]
    fn filter_highlights_and_restricts() {
        let (_dir, mut model) = sample_model();
        model.registry.set_column(0, Some("age".to_string()));
        model.registry.set_criterion(0, ">=50".to_string());
        model.apply_filter();

        assert_eq!(model.displayed_frame().height(), 4);
        assert_eq!(model.output.style_for(0), Some(HighlightStyle::FILTERED));
        assert!(model.table_name().starts_with("F["));
    }

    #[test]
    fn conjunction_of_two_rows() {
        let (_dir, mut model) = sample_model();
        model.registry.set_column(0, Some("age".to_string()));
        model.registry.set_criterion(0, ">=50".to_string());
        model.registry.add_row(1);
        model.registry.set_column(1, Some("gender".to_string()));
        model.registry.set_criterion(1, "F".to_string());
        model.apply_filter();

        // 1001 and 1005 are the only F rows with age >= 50
        assert_eq!(model.displayed_frame().height(), 2);
    }

    #[test]
    fn no_valid_filter_keeps_the_current_view() {
        let (_dir, mut model) = sample_model();
        model.apply_filter();
        assert!(model.view.is_none());
        assert_eq!(model.status_message, "No valid filter.");
        assert_eq!(model.output.style_for(0), Some(HighlightStyle::UNFILTERED));
    }

    #[test]
    fn stale_column_is_a_no_op() {
        let (_dir, mut model) = sample_model();
        model.registry.set_column(0, Some("no_such_column".to_string()));
        model.registry.set_criterion(0, ">=50".to_string());
        let lines_before = model.output.lines().to_vec();
        model.apply_filter();

        assert!(model.view.is_none());
        assert_eq!(model.output.lines(), &lines_before[..]);
        assert!(model.status_message.starts_with("Filter failed"));
    }

    #[test]
    fn show_all_round_trip() {
        let (_dir, mut model) = sample_model();
        let original = model.data.clone();
        model.registry.set_column(0, Some("gender".to_string()));
        model.registry.set_criterion(0, "F".to_string());
        model.apply_filter();
        assert_eq!(model.displayed_frame().height(), 3);

        model.show_all();
        assert!(model.view.is_none());
        assert!(model.displayed_frame().equals(&original));
        assert_eq!(model.output.style_for(0), Some(HighlightStyle::UNFILTERED));
    }

    #[test]
    fn removing_a_row_refilters_without_its_criterion() {
        let (_dir, mut model) = sample_model();
        model.registry.set_column(0, Some("age".to_string()));
        model.registry.set_criterion(0, ">=50".to_string());
        model.registry.add_row(1);
        model.registry.set_column(1, Some("gender".to_string()));
        model.registry.set_criterion(1, "F".to_string());
        model.apply_filter();
        assert_eq!(model.displayed_frame().height(), 2);

        // row 0 carries the remove affordance after the add
        assert_eq!(model.registry.state(0), RowState::Removable);
        model.filter_cursor = 0;
        model.toggle_filter_row();
        // the age criterion is gone, only gender == "F" remains
        assert_eq!(model.displayed_frame().height(), 3);
        assert!(model.registry.row(0).column.is_none());
    }

    #[test]
    fn removing_the_only_visible_row_leaves_the_panel_usable() {
        let (_dir, mut model) = sample_model();
        // a single-slot pool starts out removable
        model.registry = FilterRegistry::new(1);
        model.filter_cursor = 0;
        model.toggle_filter_row();
        assert_eq!(model.registry.first_visible(), Some(0));
        assert_eq!(model.registry.state(0), RowState::Removable);
    }

    #[test]
    fn plots_are_built_from_the_dataset() {
        let (_dir, mut model) = sample_model();
        model.show_line_plot();
        assert_eq!(model.modus, Modus::PLOT);
        let view = model.plot.as_ref().unwrap();
        assert_eq!(view.series[0].points.len(), 5);
        assert_eq!(view.x_label, "pt_code");
    }

    #[test]
    fn scatter_category_toggle_uses_first_string_column() {
        let (_dir, mut model) = sample_model();
        model.toggle_category();
        assert!(model.plot_sel.use_category);
        assert_eq!(model.plot_sel.category_column.as_deref(), Some("gender"));
        assert_eq!(
            model.plot_sel.category_values,
            vec!["F".to_string(), "M".to_string()]
        );

        model.show_scatter_plot();
        let view = model.plot.as_ref().unwrap();
        assert_eq!(view.series.len(), 2);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.xyz");
        fs::File::create(&path).unwrap();
        assert!(matches!(
            Model::load(path, SiftConfig::default()),
            Err(SiftError::UnknownFileType)
        ));
    }

    #[test]
    fn wrap_cell_content_quotes_and_escapes() {
        assert_eq!(wrap_cell_content("plain"), "plain");
        assert_eq!(wrap_cell_content("a b"), "\"a b\"");
        assert_eq!(wrap_cell_content("a,b"), "\"a,b\"");
        assert_eq!(wrap_cell_content("say \"hi\" now"), "\"say \"\"hi\"\" now\"");
    }
}
