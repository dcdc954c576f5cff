use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::{self, border},
    text::{Line, Span, Text},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Chart, Clear, Dataset, GraphType, Paragraph,
    },
};

use crate::domain::SiftConfig;
use crate::filter::RowState;
use crate::inputter::InputResult;
use crate::model::{HighlightStyle, Model, Modus};
use crate::plot::{PlotKind, PlotView};

const SERIES_COLORS: [Color; 5] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Red,
];

pub struct SiftUI;

impl SiftUI {
    pub fn new(_config: &SiftConfig) -> Self {
        Self
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let area = frame.area();
        match model.modus() {
            Modus::PLOT => self.draw_plot(model, frame, area),
            _ => self.draw_table(model, frame, area),
        }
        if let Some(help) = model.popup() {
            Self::draw_popup(help, frame, area);
        }
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let filter_height = model.registry().visible_indices().len() as u16 + 2;
        let [table_area, filter_area, status_area] = Layout::vertical([
            Constraint::Min(5),
            Constraint::Length(filter_height),
            Constraint::Length(1),
        ])
        .areas(area);

        let block = Block::bordered()
            .title(Line::from(format!(" {} ", model.table_name())).bold())
            .border_set(border::THICK);

        let inner_height = table_area.height.saturating_sub(2).max(1) as usize;
        let (cursor_row, _) = model.cursor();
        let cursor_line = cursor_row + 1; // line 0 is the header
        let scroll = (cursor_line + 1).saturating_sub(inner_height);

        let lines: Vec<Line> = model
            .output()
            .lines()
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let mut line = Line::raw(raw.as_str());
                if let Some(style) = model.output().style_for(idx) {
                    line = line.style(match style {
                        HighlightStyle::FILTERED => Style::new().fg(Color::Black).bg(Color::Yellow),
                        HighlightStyle::UNFILTERED => Style::new().fg(Color::Black).bg(Color::Cyan),
                    });
                }
                if idx == cursor_line && model.modus() == Modus::TABLE {
                    line = line.style(Style::new().reversed());
                }
                line
            })
            .collect();

        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .scroll((scroll as u16, 0))
                .block(block),
            table_area,
        );

        self.draw_filter_panel(model, frame, filter_area);
        self.draw_status(model, frame, status_area);
    }

    fn draw_filter_panel(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let editing = model.cmdinput();
        let panel_active = matches!(model.modus(), Modus::FILTER | Modus::CMDINPUT);

        let mut lines: Vec<Line> = Vec::new();
        for (idx, row, state) in model.registry().visible_rows() {
            let marker = match state {
                RowState::Addable => "[+]",
                RowState::Removable => "[-]",
                RowState::Hidden => continue,
            };
            let column = row.column.as_deref().unwrap_or("<column>");
            let selected = panel_active && idx == model.filter_cursor();
            let criterion = match (&editing, selected) {
                (Some(input), true) => with_cursor(input),
                _ => row.criterion.clone(),
            };

            let mut line = Line::from(vec![
                Span::raw(format!(" {marker} ")),
                Span::styled(format!("{column:<14}"), Style::new().fg(Color::Cyan)),
                Span::raw(" "),
                Span::raw(criterion),
            ]);
            if selected {
                line = line.style(Style::new().reversed());
            }
            lines.push(line);
        }

        let hint = " tab column · e edit · space add/remove · enter filter · a all data ";
        let block = Block::bordered()
            .title(Line::from(" filters ").bold())
            .title_bottom(Line::from(hint).centered());
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_status(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let column = model.current_column_name().unwrap_or("");
        let status = Line::from(vec![
            Span::styled(format!(" {:?} ", model.modus()), Style::new().reversed()),
            Span::raw(" "),
            Span::raw(model.status_message()),
            Span::raw("  "),
            Span::styled(format!("col: {column}"), Style::new().dim()),
        ]);
        frame.render_widget(Paragraph::new(status), area);
    }

    fn draw_plot(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let [plot_area, status_area] =
            Layout::vertical([Constraint::Min(5), Constraint::Length(1)]).areas(area);
        let Some(view) = model.plot() else {
            return;
        };
        match view.kind {
            PlotKind::Bar => self.draw_bar(view, frame, plot_area),
            _ => self.draw_chart(view, frame, plot_area),
        }
        self.draw_status(model, frame, status_area);
    }

    fn draw_chart(&self, view: &PlotView, frame: &mut Frame, area: Rect) {
        let graph_type = match view.kind {
            PlotKind::Line => GraphType::Line,
            _ => GraphType::Scatter,
        };
        let datasets: Vec<Dataset> = view
            .series
            .iter()
            .enumerate()
            .map(|(idx, series)| {
                Dataset::default()
                    .name(series.name.clone())
                    .marker(symbols::Marker::Braille)
                    .graph_type(graph_type)
                    .style(Style::new().fg(SERIES_COLORS[idx % SERIES_COLORS.len()]))
                    .data(&series.points)
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(Block::bordered().title(Line::from(format!(" {} ", view.title)).bold()))
            .x_axis(
                Axis::default()
                    .title(view.x_label.clone())
                    .bounds(view.x_bounds)
                    .labels([
                        format!("{:.1}", view.x_bounds[0]),
                        format!("{:.1}", view.x_bounds[1]),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title(view.y_label.clone())
                    .bounds(view.y_bounds)
                    .labels([
                        format!("{:.1}", view.y_bounds[0]),
                        format!("{:.1}", view.y_bounds[1]),
                    ]),
            );
        frame.render_widget(chart, area);
    }

    fn draw_bar(&self, view: &PlotView, frame: &mut Frame, area: Rect) {
        let Some(series) = view.series.first() else {
            return;
        };
        let bars: Vec<Bar> = series
            .points
            .iter()
            .map(|&(x, y)| {
                Bar::default()
                    .value(y.max(0.0).round() as u64)
                    .text_value(format!("{y:.1}"))
                    .label(Line::from(format!("{x:.0}")))
            })
            .collect();
        let chart = BarChart::default()
            .block(Block::bordered().title(Line::from(format!(" {} ", view.title)).bold()))
            .bar_width(6)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_popup(text: &str, frame: &mut Frame, area: Rect) {
        let [popup] = Layout::horizontal([Constraint::Percentage(50)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::vertical([Constraint::Percentage(80)])
            .flex(Flex::Center)
            .areas(popup);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(text)
                .block(Block::bordered().title(Line::from(" help ").bold().centered())),
            popup,
        );
    }
}

// Render the edit buffer with a visible cursor mark.
fn with_cursor(input: &InputResult) -> String {
    let mut chars: Vec<char> = input.input.chars().collect();
    let pos = input.cursor_pos.min(chars.len());
    chars.insert(pos, '▏');
    chars.into_iter().collect()
}
