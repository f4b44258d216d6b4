//! Scan query construction.
//!
//! Operators select rows with at most one of three mutually exclusive modes
//! (exact row, row prefix, start/end range) and narrow columns with raw
//! `fam` / `fam:qual` specifiers. [`SpanBuilder`] validates that input and
//! produces an immutable [`ScanQuery`].

pub mod column;
/// Errors raised while validating operator input.
pub mod error;

use std::{collections::BTreeSet, ops::Bound};

use bytes::Bytes;

pub use self::{
    column::{Column, ColumnFilter},
    error::ConfigError,
};
use crate::scan::Span;

/// Name reported for the exact-row selector.
pub const EXACT_ROW: &str = "exact_row";
/// Name reported for the row-prefix selector.
pub const ROW_PREFIX: &str = "row_prefix";
/// Name reported for the start-row selector.
pub const START_ROW: &str = "start_row";
/// Name reported for the end-row selector.
pub const END_ROW: &str = "end_row";

/// Which rows a scan visits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSelection {
    /// A single row.
    ExactRow(Bytes),
    /// Every row sharing the prefix.
    RowPrefix(Bytes),
    /// Rows between optional inclusive bounds; both `None` selects everything.
    RowRange {
        /// Inclusive lower bound, open when `None`.
        start: Option<Bytes>,
        /// Inclusive upper bound, open when `None`.
        end: Option<Bytes>,
    },
}

impl RowSelection {
    /// Selection covering the whole key space.
    pub fn all() -> Self {
        RowSelection::RowRange {
            start: None,
            end: None,
        }
    }

    /// Resolve the four independent selector options into one mode.
    ///
    /// Supplying options from more than one mode is rejected, never resolved
    /// by precedence.
    pub fn from_options(
        exact_row: Option<Bytes>,
        row_prefix: Option<Bytes>,
        start_row: Option<Bytes>,
        end_row: Option<Bytes>,
    ) -> Result<Self, ConfigError> {
        let modes = [
            exact_row.is_some(),
            row_prefix.is_some(),
            start_row.is_some() || end_row.is_some(),
        ];
        if modes.iter().filter(|active| **active).count() > 1 {
            let selectors = [
                (EXACT_ROW, exact_row.is_some()),
                (ROW_PREFIX, row_prefix.is_some()),
                (START_ROW, start_row.is_some()),
                (END_ROW, end_row.is_some()),
            ]
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect();
            return Err(ConfigError::ConflictingRowSelectors { selectors });
        }

        Ok(match (exact_row, row_prefix) {
            (Some(row), _) => RowSelection::ExactRow(row),
            (None, Some(prefix)) => RowSelection::RowPrefix(prefix),
            (None, None) => RowSelection::RowRange {
                start: start_row,
                end: end_row,
            },
        })
    }

    /// Canonical span for this selection.
    pub fn span(&self) -> Span {
        match self {
            RowSelection::ExactRow(row) => Span::exact(row.clone()),
            RowSelection::RowPrefix(prefix) => Span::prefix(prefix.clone()),
            RowSelection::RowRange { start, end } => Span::new(
                start.clone().map_or(Bound::Unbounded, Bound::Included),
                end.clone().map_or(Bound::Unbounded, Bound::Included),
            ),
        }
    }
}

impl Default for RowSelection {
    fn default() -> Self {
        Self::all()
    }
}

/// A validated, immutable scan request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanQuery {
    span: Span,
    columns: BTreeSet<ColumnFilter>,
}

impl ScanQuery {
    /// Build a query from a resolved row selection and raw column specifiers.
    pub fn build<S>(selection: &RowSelection, raw_columns: &[S]) -> Result<Self, ConfigError>
    where
        S: AsRef<str>,
    {
        let columns = raw_columns
            .iter()
            .map(|raw| ColumnFilter::parse(raw.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            span: selection.span(),
            columns,
        })
    }

    /// Rows visited by the scan.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Requested column filters; empty means every column.
    pub fn columns(&self) -> &BTreeSet<ColumnFilter> {
        &self.columns
    }

    /// Whether `column` passes the column filters.
    pub fn wants_column(&self, column: &Column) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|filter| filter.matches(column))
    }
}

/// Collects raw scan options and turns them into a [`ScanQuery`].
#[derive(Clone, Debug, Default)]
pub struct SpanBuilder {
    exact_row: Option<Bytes>,
    row_prefix: Option<Bytes>,
    start_row: Option<Bytes>,
    end_row: Option<Bytes>,
    columns: Vec<String>,
}

impl SpanBuilder {
    /// Builder with no selectors and no column filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select exactly one row.
    pub fn exact_row(self, row: impl Into<Bytes>) -> Self {
        SpanBuilder {
            exact_row: Some(row.into()),
            ..self
        }
    }

    /// Select every row with the given prefix.
    pub fn row_prefix(self, prefix: impl Into<Bytes>) -> Self {
        SpanBuilder {
            row_prefix: Some(prefix.into()),
            ..self
        }
    }

    /// Inclusive lower bound of a row range.
    pub fn start_row(self, row: impl Into<Bytes>) -> Self {
        SpanBuilder {
            start_row: Some(row.into()),
            ..self
        }
    }

    /// Inclusive upper bound of a row range.
    pub fn end_row(self, row: impl Into<Bytes>) -> Self {
        SpanBuilder {
            end_row: Some(row.into()),
            ..self
        }
    }

    /// Add a raw `fam` or `fam:qual` column specifier.
    pub fn column(mut self, raw: impl Into<String>) -> Self {
        self.columns.push(raw.into());
        self
    }

    /// Add several raw column specifiers.
    pub fn columns<I, S>(mut self, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(raw.into_iter().map(Into::into));
        self
    }

    /// Resolve the row selectors without touching the columns.
    pub fn selection(&self) -> Result<RowSelection, ConfigError> {
        RowSelection::from_options(
            self.exact_row.clone(),
            self.row_prefix.clone(),
            self.start_row.clone(),
            self.end_row.clone(),
        )
    }

    /// Validate every option and produce the query.
    pub fn build(&self) -> Result<ScanQuery, ConfigError> {
        let selection = self.selection()?;
        ScanQuery::build(&selection, &self.columns)
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Bound;

    use bytes::Bytes;

    use super::{ColumnFilter, ConfigError, RowSelection, ScanQuery, SpanBuilder};
    use crate::scan::Span;

    fn b(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn every_multi_mode_combination_conflicts() {
        for mask in 0u8..16 {
            let exact = mask & 1 != 0;
            let prefix = mask & 2 != 0;
            let start = mask & 4 != 0;
            let end = mask & 8 != 0;
            let modes = [exact, prefix, start || end]
                .iter()
                .filter(|on| **on)
                .count();

            let result = RowSelection::from_options(
                exact.then(|| b("e")),
                prefix.then(|| b("p")),
                start.then(|| b("s")),
                end.then(|| b("t")),
            );
            if modes > 1 {
                assert!(
                    matches!(result, Err(ConfigError::ConflictingRowSelectors { .. })),
                    "mask {mask:#06b} should conflict"
                );
            } else {
                assert!(result.is_ok(), "mask {mask:#06b} should be accepted");
            }
        }
    }

    #[test]
    fn conflicts_are_symmetric_and_named() {
        let exact_prefix = SpanBuilder::new().exact_row("r").row_prefix("p").build();
        assert_eq!(
            exact_prefix,
            Err(ConfigError::ConflictingRowSelectors {
                selectors: vec!["exact_row", "row_prefix"]
            })
        );

        let exact_range = SpanBuilder::new().exact_row("r").end_row("z").build();
        assert_eq!(
            exact_range,
            Err(ConfigError::ConflictingRowSelectors {
                selectors: vec!["exact_row", "end_row"]
            })
        );

        let prefix_range = SpanBuilder::new()
            .start_row("a")
            .row_prefix("p")
            .end_row("z")
            .build();
        assert_eq!(
            prefix_range,
            Err(ConfigError::ConflictingRowSelectors {
                selectors: vec!["row_prefix", "start_row", "end_row"]
            })
        );
    }

    #[test]
    fn exact_row_span() {
        let query = SpanBuilder::new().exact_row("r1").build().unwrap();
        assert_eq!(query.span(), &Span::exact("r1"));
        assert!(query.span().contains(b"r1"));
        assert!(!query.span().contains(b"r2"));
    }

    #[test]
    fn prefix_span() {
        let query = SpanBuilder::new().row_prefix("user").build().unwrap();
        assert_eq!(query.span(), &Span::prefix("user"));
    }

    #[test]
    fn range_spans() {
        let both = SpanBuilder::new().start_row("a").end_row("m").build().unwrap();
        assert_eq!(
            both.span(),
            &Span::new(Bound::Included(b("a")), Bound::Included(b("m")))
        );

        let start_only = SpanBuilder::new().start_row("a").build().unwrap();
        assert_eq!(
            start_only.span(),
            &Span::new(Bound::Included(b("a")), Bound::Unbounded)
        );

        let end_only = SpanBuilder::new().end_row("m").build().unwrap();
        assert_eq!(
            end_only.span(),
            &Span::new(Bound::Unbounded, Bound::Included(b("m")))
        );

        let none = SpanBuilder::new().build().unwrap();
        assert!(none.span().is_all());
    }

    #[test]
    fn columns_are_parsed() {
        let query = SpanBuilder::new()
            .columns(["attr", "stat:count"])
            .build()
            .unwrap();
        let columns: Vec<_> = query.columns().iter().cloned().collect();
        assert_eq!(
            columns,
            vec![
                ColumnFilter::Family(b("attr")),
                ColumnFilter::FamilyQualifier(b("stat"), b("count")),
            ]
        );
    }

    #[test]
    fn malformed_column_names_offender() {
        let err = SpanBuilder::new()
            .column("ok")
            .column("a:b:c")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MalformedColumn("a:b:c".to_string()));
        assert!(err.to_string().contains("a:b:c"));
    }

    #[test]
    fn row_conflicts_win_over_column_errors() {
        let err = SpanBuilder::new()
            .exact_row("r")
            .row_prefix("p")
            .column("a:b:c")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingRowSelectors { .. }));
    }

    #[test]
    fn build_is_idempotent() {
        let builder = SpanBuilder::new().row_prefix("p").columns(["f:q", "g"]);
        assert_eq!(builder.build().unwrap(), builder.build().unwrap());

        let selection = RowSelection::ExactRow(b("r1"));
        assert_eq!(
            ScanQuery::build(&selection, &["f"]).unwrap(),
            ScanQuery::build(&selection, &["f"]).unwrap()
        );
    }

    #[test]
    fn empty_filters_want_every_column() {
        let query = SpanBuilder::new().build().unwrap();
        assert!(query.wants_column(&super::Column::new("any", "thing")));

        let query = SpanBuilder::new().column("attr").build().unwrap();
        assert!(query.wants_column(&super::Column::new("attr", "x")));
        assert!(!query.wants_column(&super::Column::new("stat", "x")));
    }
}
