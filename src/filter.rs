use polars::prelude::*;
use tracing::debug;

use crate::criterion::{CompareOp, parse_criterion};

/// What a filter row currently offers the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Hidden,
    Addable,
    Removable,
}

/// One (column, criterion) input slot.
#[derive(Debug, Clone, Default)]
pub struct FilterRow {
    pub column: Option<String>,
    pub criterion: String,
}

/// A fixed pool of filter rows, one slot per dataset column. Slots are
/// revealed and hidden, never allocated or dropped, so removing a row only
/// clears it for reuse.
pub struct FilterRegistry {
    rows: Vec<FilterRow>,
    states: Vec<RowState>,
}

impl FilterRegistry {
    pub fn new(slots: usize) -> Self {
        let mut states = vec![RowState::Hidden; slots];
        if let Some(first) = states.first_mut() {
            *first = if slots == 1 {
                RowState::Removable
            } else {
                RowState::Addable
            };
        }
        FilterRegistry {
            rows: vec![FilterRow::default(); slots],
            states,
        }
    }

    pub fn row(&self, idx: usize) -> &FilterRow {
        &self.rows[idx]
    }

    pub fn state(&self, idx: usize) -> RowState {
        self.states.get(idx).copied().unwrap_or(RowState::Hidden)
    }

    pub fn set_column(&mut self, idx: usize, column: Option<String>) {
        if let Some(row) = self.rows.get_mut(idx) {
            row.column = column;
        }
    }

    pub fn set_criterion(&mut self, idx: usize, criterion: String) {
        if let Some(row) = self.rows.get_mut(idx) {
            row.criterion = criterion;
        }
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &FilterRow, RowState)> + '_ {
        self.rows
            .iter()
            .zip(self.states.iter())
            .enumerate()
            .filter(|(_, (_, state))| **state != RowState::Hidden)
            .map(|(idx, (row, state))| (idx, row, *state))
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.visible_rows().map(|(idx, _, _)| idx).collect()
    }

    pub fn first_visible(&self) -> Option<usize> {
        self.visible_rows().next().map(|(idx, _, _)| idx)
    }

    /// Reveal slot `n`, the row after the one whose add affordance fired.
    /// The row before it flips to a remove affordance, and the last slot
    /// only ever shows remove since there is nothing further to add.
    /// No-op when no further slots exist.
    pub fn add_row(&mut self, n: usize) -> bool {
        if n >= self.states.len() {
            // no more rows
            return false;
        }
        self.states[n] = if n == self.states.len() - 1 {
            RowState::Removable
        } else {
            RowState::Addable
        };
        if n > 0 {
            self.states[n - 1] = RowState::Removable;
        }
        true
    }

    // TODO: if the user reveals a row and skips entering anything in it,
    // the affordances lose track of which rows should show add vs remove
    // (all but the last end up with remove).
    pub fn remove_row(&mut self, n: usize) -> bool {
        if n >= self.states.len() {
            return false;
        }
        self.rows[n] = FilterRow::default();
        self.states[n] = RowState::Hidden;
        true
    }

    /// Collect the usable (column, operator, literal) triples from all rows.
    /// A row contributes only when both its column and criterion text are
    /// set and the criterion parses to a non-empty value; anything else is
    /// skipped silently.
    pub fn terms(&self) -> Vec<FilterTerm> {
        let mut terms = Vec::new();
        for row in &self.rows {
            let Some(column) = row.column.as_deref().filter(|c| !c.is_empty()) else {
                continue;
            };
            if row.criterion.is_empty() {
                continue;
            }
            let parsed = parse_criterion(&row.criterion);
            if parsed.value.is_empty() {
                debug!("No valid criterion in {:?}", row.criterion);
                continue;
            }
            let literal = if is_numeric_value(&parsed.value) {
                parsed
                    .value
                    .parse::<f64>()
                    .map(FilterLiteral::Num)
                    .unwrap_or_else(|_| FilterLiteral::Str(parsed.value.clone()))
            } else {
                FilterLiteral::Str(parsed.value.clone())
            };
            debug!("Term: {} {} {:?}", column, parsed.op.as_str(), literal);
            terms.push(FilterTerm {
                column: column.to_string(),
                op: parsed.op,
                literal,
            });
        }
        terms
    }
}

/// A criterion value, typed so numeric comparisons stay numeric and string
/// values never need quoting or escaping.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterLiteral {
    Num(f64),
    Str(String),
}

/// One conjunct of the row selection predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTerm {
    pub column: String,
    pub op: CompareOp,
    pub literal: FilterLiteral,
}

impl FilterTerm {
    fn expr(&self) -> Expr {
        let value = match &self.literal {
            FilterLiteral::Num(n) => lit(*n),
            FilterLiteral::Str(s) => lit(s.as_str()),
        };
        let column = col(self.column.as_str());
        match self.op {
            CompareOp::Eq => column.eq(value),
            CompareOp::Ge => column.gt_eq(value),
            CompareOp::Le => column.lt_eq(value),
            CompareOp::Gt => column.gt(value),
            CompareOp::Lt => column.lt(value),
        }
    }
}

/// Conjunction of all terms. `None` means no row produced a usable term,
/// which is distinct from a predicate that matches nothing.
pub fn build_predicate(terms: &[FilterTerm]) -> Option<Expr> {
    let mut exprs = terms.iter().map(|t| t.expr());
    let first = exprs.next()?;
    Some(exprs.fold(first, |acc, e| acc.and(e)))
}

/// Evaluate a predicate against the full dataset. Row order and columns are
/// preserved; a stale column reference surfaces here as an error.
pub fn apply_predicate(df: &DataFrame, predicate: Expr) -> PolarsResult<DataFrame> {
    df.clone().lazy().filter(predicate).collect()
}

// A value is numeric if removing a single '.' leaves only decimal digits,
// so "12.34" is numeric while "12.34.5" and "abc" are not.
fn is_numeric_value(value: &str) -> bool {
    let stripped = value.replacen('.', "", 1);
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df!(
            "age" => [55i64, 40, 70, 60],
            "gender" => ["F", "M", "F", "M"],
        )
        .unwrap()
    }

    fn set_row(registry: &mut FilterRegistry, idx: usize, column: &str, criterion: &str) {
        registry.set_column(idx, Some(column.to_string()));
        registry.set_criterion(idx, criterion.to_string());
    }

    #[test]
    fn initial_states() {
        let registry = FilterRegistry::new(5);
        assert_eq!(registry.state(0), RowState::Addable);
        for idx in 1..5 {
            assert_eq!(registry.state(idx), RowState::Hidden);
        }

        let single = FilterRegistry::new(1);
        assert_eq!(single.state(0), RowState::Removable);
    }

    #[test]
    fn add_reveals_next_and_flips_previous() {
        let mut registry = FilterRegistry::new(3);
        assert!(registry.add_row(1));
        assert_eq!(registry.state(0), RowState::Removable);
        assert_eq!(registry.state(1), RowState::Addable);
        assert_eq!(registry.state(2), RowState::Hidden);
    }

    #[test]
    fn last_slot_only_offers_remove() {
        let mut registry = FilterRegistry::new(2);
        assert!(registry.add_row(1));
        assert_eq!(registry.state(0), RowState::Removable);
        assert_eq!(registry.state(1), RowState::Removable);
        // the pool is exhausted
        assert!(!registry.add_row(2));
    }

    #[test]
    fn remove_clears_and_hides_the_slot() {
        let mut registry = FilterRegistry::new(3);
        registry.add_row(1);
        set_row(&mut registry, 1, "age", ">=50");
        assert!(registry.remove_row(1));
        assert_eq!(registry.state(1), RowState::Hidden);
        assert!(registry.row(1).column.is_none());
        assert!(registry.row(1).criterion.is_empty());
        assert_eq!(registry.visible_indices(), vec![0]);
    }

    #[test]
    fn terms_skip_incomplete_rows() {
        let mut registry = FilterRegistry::new(4);
        set_row(&mut registry, 0, "age", ">=50");
        // criterion without a value
        set_row(&mut registry, 1, "age", "=");
        // column without a criterion
        registry.set_column(2, Some("gender".to_string()));
        // criterion without a column
        registry.set_criterion(3, "F".to_string());

        let terms = registry.terms();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].column, "age");
        assert_eq!(terms[0].op, CompareOp::Ge);
        assert_eq!(terms[0].literal, FilterLiteral::Num(50.0));
    }

    #[test]
    fn numeric_classification() {
        assert!(is_numeric_value("12.5"));
        assert!(is_numeric_value("100"));
        assert!(!is_numeric_value("12.5.3"));
        assert!(!is_numeric_value(""));
        assert!(!is_numeric_value("abc"));
        assert!(!is_numeric_value("-5"));
    }

    #[test]
    fn text_criterion_becomes_a_string_literal() {
        let mut registry = FilterRegistry::new(2);
        set_row(&mut registry, 0, "gender", "F");
        let terms = registry.terms();
        assert_eq!(terms[0].op, CompareOp::Eq);
        assert_eq!(terms[0].literal, FilterLiteral::Str("F".to_string()));
    }

    #[test]
    fn no_usable_rows_yields_no_predicate() {
        let registry = FilterRegistry::new(3);
        assert!(build_predicate(&registry.terms()).is_none());
    }

    #[test]
    fn conjunction_over_two_columns() {
        let df = sample_frame();
        let mut registry = FilterRegistry::new(2);
        set_row(&mut registry, 0, "age", ">=50");
        registry.add_row(1);
        set_row(&mut registry, 1, "gender", "F");

        let predicate = build_predicate(&registry.terms()).unwrap();
        let result = apply_predicate(&df, predicate).unwrap();
        assert_eq!(result.height(), 2);
        let ages: Vec<i64> = result
            .column("age")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        // original row order is preserved
        assert_eq!(ages, vec![55, 70]);
    }

    #[test]
    fn unknown_column_fails_evaluation() {
        let df = sample_frame();
        let mut registry = FilterRegistry::new(2);
        set_row(&mut registry, 0, "no_such_column", ">=50");
        let predicate = build_predicate(&registry.terms()).unwrap();
        assert!(apply_predicate(&df, predicate).is_err());
    }

    #[test]
    fn filtering_leaves_the_dataset_untouched() {
        let df = sample_frame();
        let before = df.clone();
        let mut registry = FilterRegistry::new(2);
        set_row(&mut registry, 0, "age", ">60");
        let predicate = build_predicate(&registry.terms()).unwrap();
        let result = apply_predicate(&df, predicate).unwrap();
        assert_eq!(result.height(), 1);
        assert!(df.equals(&before));
    }
}
