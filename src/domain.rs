use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum SiftError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl From<Error> for SiftError {
    fn from(err: Error) -> Self {
        SiftError::IoError(err)
    }
}

impl From<PolarsError> for SiftError {
    fn from(err: PolarsError) -> Self {
        SiftError::PolarsError(err)
    }
}

/// Semantic input events. The controller maps raw terminal events to these,
/// the model interprets them depending on its current modus.
#[derive(Debug)]
pub enum Message {
    Quit,
    Help,
    Exit,
    Enter,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    CopyCell,
    CopyRow,
    FilterMode,
    EditCriterion,
    NextColumnChoice,
    PrevColumnChoice,
    ToggleRowAffordance,
    ShowAll,
    LinePlot,
    BarPlot,
    ScatterPlot,
    CycleX,
    CycleY,
    ToggleCategory,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct SiftConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub page_size: usize,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 32,
            page_size: 10,
        }
    }
}

pub const HELP_TEXT: &str = "
 q          quit
 ?          this help
 esc        back

 arrows     move selection
 pgup/pgdn  page up / down
 home/end   first / last row
 c / r      copy cell / row

 f          filter panel
 tab        cycle filter column
 e          edit criterion
 space      add / remove filter row
 enter      apply filter
 a          show all data

 l / b / s  line, bar, scatter plot
 x / y      cycle plot columns
 g          toggle scatter categories
";
