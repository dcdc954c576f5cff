use polars::prelude::*;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Line,
    Bar,
    Scatter,
}

#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Prepared plot data. The ui renders this with a chart widget, the model
/// only decides what goes into it.
#[derive(Debug, Clone)]
pub struct PlotView {
    pub kind: PlotKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<PlotSeries>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

pub fn build_line(df: &DataFrame, x_column: &str, y_column: &str) -> PolarsResult<PlotView> {
    let points = column_points(df, x_column, y_column)?;
    Ok(view_from_series(
        PlotKind::Line,
        format!("line: {y_column}"),
        x_column,
        y_column,
        vec![PlotSeries {
            name: y_column.to_string(),
            points,
        }],
    ))
}

pub fn build_bar(df: &DataFrame, x_column: &str, y_column: &str) -> PolarsResult<PlotView> {
    let points = column_points(df, x_column, y_column)?;
    Ok(view_from_series(
        PlotKind::Bar,
        format!("bar: {y_column}"),
        x_column,
        y_column,
        vec![PlotSeries {
            name: y_column.to_string(),
            points,
        }],
    ))
}

/// Scatter of `y_column` over `x_column`. With a category column, only rows
/// whose category is in `category_values` are plotted, one series per value
/// so each gets its own color. A missing value list degrades to a single
/// uncategorized series.
pub fn build_scatter(
    df: &DataFrame,
    x_column: &str,
    y_column: &str,
    category: Option<&str>,
    category_values: &[String],
) -> PolarsResult<PlotView> {
    let series = match category {
        Some(cat) if !category_values.is_empty() => {
            let labels = string_column(df, cat)?;
            let xs = numeric_column(df, x_column)?;
            let ys = numeric_column(df, y_column)?;
            category_values
                .iter()
                .map(|value| {
                    let points = labels
                        .iter()
                        .zip(xs.iter().zip(ys.iter()))
                        .filter(|(label, _)| label.as_deref() == Some(value.as_str()))
                        .map(|(_, (&x, &y))| (x, y))
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .collect();
                    PlotSeries {
                        name: value.clone(),
                        points,
                    }
                })
                .collect()
        }
        Some(cat) => {
            warn!("No value list for category {cat:?}, plotting uncategorized");
            vec![PlotSeries {
                name: y_column.to_string(),
                points: column_points(df, x_column, y_column)?,
            }]
        }
        None => vec![PlotSeries {
            name: y_column.to_string(),
            points: column_points(df, x_column, y_column)?,
        }],
    };

    Ok(view_from_series(
        PlotKind::Scatter,
        format!("scatter: {x_column} vs {y_column}"),
        x_column,
        y_column,
        series,
    ))
}

/// Distinct values of a column, sorted, capped at `limit`. Used to seed the
/// allowed category value list for scatter plots.
pub fn distinct_values(df: &DataFrame, name: &str, limit: usize) -> PolarsResult<Vec<String>> {
    let mut distinct: Vec<String> = Vec::new();
    for value in string_column(df, name)?.into_iter().flatten() {
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    distinct.sort();
    distinct.truncate(limit);
    Ok(distinct)
}

fn column_points(df: &DataFrame, x_column: &str, y_column: &str) -> PolarsResult<Vec<(f64, f64)>> {
    let xs = numeric_column(df, x_column)?;
    let ys = numeric_column(df, y_column)?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect())
}

fn numeric_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let col = df.column(name)?.cast(&DataType::Float64)?;
    let values = col.f64()?;
    Ok(values
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn string_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let col = df.column(name)?.cast(&DataType::String)?;
    let values = col.str()?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

fn view_from_series(
    kind: PlotKind,
    title: String,
    x_label: &str,
    y_label: &str,
    series: Vec<PlotSeries>,
) -> PlotView {
    let (x_bounds, y_bounds) = bounds(&series);
    trace!(
        "Plot {:?} with {} series, x {:?}, y {:?}",
        kind,
        series.len(),
        x_bounds,
        y_bounds
    );
    PlotView {
        kind,
        title,
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        series,
        x_bounds,
        y_bounds,
    }
}

fn bounds(series: &[PlotSeries]) -> ([f64; 2], [f64; 2]) {
    let mut xb = [f64::INFINITY, f64::NEG_INFINITY];
    let mut yb = [f64::INFINITY, f64::NEG_INFINITY];
    for &(x, y) in series.iter().flat_map(|s| s.points.iter()) {
        xb[0] = xb[0].min(x);
        xb[1] = xb[1].max(x);
        yb[0] = yb[0].min(y);
        yb[1] = yb[1].max(y);
    }
    (pad(xb), pad(yb))
}

// Widen degenerate axes so a single point or an empty series still renders.
fn pad(b: [f64; 2]) -> [f64; 2] {
    if b[0] > b[1] {
        return [0.0, 1.0];
    }
    if (b[1] - b[0]).abs() < f64::EPSILON {
        return [b[0] - 0.5, b[1] + 0.5];
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df!(
            "pt_code" => [1i64, 2, 3, 4],
            "age" => [30i64, 40, 50, 60],
            "gender" => ["F", "M", "F", "X"],
        )
        .unwrap()
    }

    #[test]
    fn line_plot_pairs_the_columns() {
        let view = build_line(&sample_frame(), "pt_code", "age").unwrap();
        assert_eq!(view.kind, PlotKind::Line);
        assert_eq!(view.series.len(), 1);
        assert_eq!(
            view.series[0].points,
            vec![(1.0, 30.0), (2.0, 40.0), (3.0, 50.0), (4.0, 60.0)]
        );
        assert_eq!(view.x_bounds, [1.0, 4.0]);
        assert_eq!(view.y_bounds, [30.0, 60.0]);
    }

    #[test]
    fn scatter_splits_by_category_and_drops_other_rows() {
        let values = vec!["F".to_string(), "M".to_string()];
        let view = build_scatter(
            &sample_frame(),
            "age",
            "pt_code",
            Some("gender"),
            &values,
        )
        .unwrap();
        assert_eq!(view.series.len(), 2);
        assert_eq!(view.series[0].name, "F");
        assert_eq!(view.series[0].points, vec![(30.0, 1.0), (50.0, 3.0)]);
        assert_eq!(view.series[1].name, "M");
        assert_eq!(view.series[1].points, vec![(40.0, 2.0)]);
        // the "X" row is in no series
        let total: usize = view.series.iter().map(|s| s.points.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn scatter_without_value_list_plots_everything() {
        let view = build_scatter(&sample_frame(), "age", "pt_code", Some("gender"), &[]).unwrap();
        assert_eq!(view.series.len(), 1);
        assert_eq!(view.series[0].points.len(), 4);
    }

    #[test]
    fn non_numeric_column_yields_no_points() {
        let view = build_line(&sample_frame(), "pt_code", "gender").unwrap();
        assert!(view.series[0].points.is_empty());
        // bounds still render an empty chart
        assert_eq!(view.x_bounds, [0.0, 1.0]);
    }

    #[test]
    fn distinct_values_are_sorted_and_capped() {
        let df = sample_frame();
        assert_eq!(
            distinct_values(&df, "gender", 8).unwrap(),
            vec!["F".to_string(), "M".to_string(), "X".to_string()]
        );
        assert_eq!(distinct_values(&df, "gender", 2).unwrap().len(), 2);
    }
}
