//! Grid model, width renormalization backstop, and invariant reporting.
//!
//! A [`Grid`] is an ordered sequence of non-empty rows; each row is an
//! ordered sequence of [`PlacedItem`]s. The grid exclusively owns the
//! `row`/`column`/`width_percent` fields of its items.
//!
//! # Invariants
//!
//! 1. Within a row, `column` values are exactly `0..n-1`, no gaps.
//! 2. Within a row, widths sum to 100 within ±[`WIDTH_SUM_TOLERANCE`].
//! 3. Every width is at least [`MIN_WIDTH_PERCENT`], except a single-item
//!    row, which is forced to 100.
//! 4. No row is empty.
//! 5. No `(id, kind)` identity appears twice.
//!
//! Upstream steps are allowed to leave minor drift; [`Grid::renormalize`]
//! is the mandatory backstop that every mutating operation runs before
//! emitting a grid, and [`Grid::invariant_report`] is the diagnostic view
//! over the same rules.

use std::fmt;

use imagegrid_core::{ItemId, ItemKind, PlacedItem};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::snapshot::LayoutSnapshot;
use crate::{FULL_WIDTH_PERCENT, MIN_WIDTH_PERCENT, WIDTH_SUM_TOLERANCE};

/// One row of the grid, ordered by column.
pub type Row = Vec<PlacedItem>;

/// Ordered sequence of non-empty rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub(crate) rows: Vec<Row>,
}

impl Grid {
    /// An empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// One row, if it exists.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total item count across all rows.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Locate an item by identity, returning `(row, column)` indices.
    #[must_use]
    pub fn find(&self, id: &ItemId, kind: ItemKind) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(r, row)| {
            row.iter()
                .position(|item| item.id == *id && item.kind == kind)
                .map(|c| (r, c))
        })
    }

    /// Flatten into the row-major item list the host persists.
    #[must_use]
    pub fn flatten(&self) -> Vec<PlacedItem> {
        self.rows.iter().flatten().cloned().collect()
    }

    /// Flatten into a versioned persistence snapshot.
    #[must_use]
    pub fn to_snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::new(self.flatten())
    }

    /// Re-stamp one row's `row`/`column` fields and reconcile its widths.
    ///
    /// No-op if `index` is out of range.
    pub fn renormalize_row(&mut self, index: usize) {
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        let mut widths: Vec<f32> = row.iter().map(|item| item.width_percent).collect();
        reconcile_widths(&mut widths);
        for (column, (item, width)) in row.iter_mut().zip(widths).enumerate() {
            item.row = index as u32;
            item.column = column as u32;
            item.width_percent = width;
        }
    }

    /// The full backstop: prune empty rows, then renormalize every row.
    ///
    /// Mandatory on every mutating code path before a grid is emitted.
    pub fn renormalize(&mut self) {
        self.rows.retain(|row| !row.is_empty());
        for index in 0..self.rows.len() {
            self.renormalize_row(index);
        }
    }

    /// Inspect the grid against its invariants without modifying it.
    #[must_use]
    pub fn invariant_report(&self) -> GridInvariantReport {
        let mut issues = Vec::new();
        let mut seen: FxHashSet<(&ItemId, ItemKind)> = FxHashSet::default();

        for (r, row) in self.rows.iter().enumerate() {
            if row.is_empty() {
                issues.push(GridInvariantIssue {
                    code: GridInvariantCode::EmptyRow,
                    severity: GridInvariantSeverity::Error,
                    row: Some(r as u32),
                    item: None,
                    message: format!("row {r} is empty"),
                });
                continue;
            }

            let mut sum = 0.0f32;
            for (c, item) in row.iter().enumerate() {
                if item.row as usize != r || item.column as usize != c {
                    issues.push(GridInvariantIssue {
                        code: GridInvariantCode::NonContiguousColumns,
                        severity: GridInvariantSeverity::Error,
                        row: Some(r as u32),
                        item: Some(item.id.clone()),
                        message: format!(
                            "item {} stamped ({}, {}) but sits at ({r}, {c})",
                            item.id, item.row, item.column
                        ),
                    });
                }
                if !item.width_percent.is_finite() {
                    issues.push(GridInvariantIssue {
                        code: GridInvariantCode::NonFiniteWidth,
                        severity: GridInvariantSeverity::Error,
                        row: Some(r as u32),
                        item: Some(item.id.clone()),
                        message: format!("item {} has a non-finite width", item.id),
                    });
                    continue;
                }
                sum += item.width_percent;

                let min_feasible =
                    row.len() as f32 * MIN_WIDTH_PERCENT <= FULL_WIDTH_PERCENT + WIDTH_SUM_TOLERANCE;
                if row.len() > 1
                    && min_feasible
                    && item.width_percent < MIN_WIDTH_PERCENT - WIDTH_SUM_TOLERANCE
                {
                    issues.push(GridInvariantIssue {
                        code: GridInvariantCode::WidthBelowMinimum,
                        severity: GridInvariantSeverity::Error,
                        row: Some(r as u32),
                        item: Some(item.id.clone()),
                        message: format!(
                            "item {} width {:.2} is below the {MIN_WIDTH_PERCENT} minimum",
                            item.id, item.width_percent
                        ),
                    });
                }

                if !seen.insert((&item.id, item.kind)) {
                    issues.push(GridInvariantIssue {
                        code: GridInvariantCode::DuplicateItem,
                        severity: GridInvariantSeverity::Error,
                        row: Some(r as u32),
                        item: Some(item.id.clone()),
                        message: format!("identity ({}, {:?}) appears twice", item.id, item.kind),
                    });
                }
            }

            if (sum - FULL_WIDTH_PERCENT).abs() > WIDTH_SUM_TOLERANCE {
                issues.push(GridInvariantIssue {
                    code: GridInvariantCode::WidthSumOutOfTolerance,
                    severity: GridInvariantSeverity::Error,
                    row: Some(r as u32),
                    item: None,
                    message: format!("row {r} widths sum to {sum:.2}"),
                });
            }
        }

        GridInvariantReport { issues }
    }
}

/// Reconcile one row's width slice in place so it satisfies the row
/// invariants: non-finite and negative entries are zeroed, a degenerate
/// zero sum splits equally, out-of-tolerance sums rescale, sub-minimum
/// entries are lifted when the row can afford it, and residual rounding is
/// absorbed by the largest entry.
pub(crate) fn reconcile_widths(widths: &mut [f32]) {
    let n = widths.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        // Single-column rows are not resizable; stray stored values are
        // corrected here.
        widths[0] = FULL_WIDTH_PERCENT;
        return;
    }

    for width in widths.iter_mut() {
        if !width.is_finite() || *width < 0.0 {
            *width = 0.0;
        }
    }

    let sum: f32 = widths.iter().sum();
    if sum <= f32::EPSILON {
        let share = FULL_WIDTH_PERCENT / n as f32;
        widths.fill(share);
    } else if (sum - FULL_WIDTH_PERCENT).abs() > WIDTH_SUM_TOLERANCE {
        let scale = FULL_WIDTH_PERCENT / sum;
        for width in widths.iter_mut() {
            *width *= scale;
        }
    }

    // Lift sub-minimum entries, paying out of the slack above the minimum.
    // Infeasible rows (more items than the minimum allows) keep the equal
    // rescale from above.
    if n as f32 * MIN_WIDTH_PERCENT <= FULL_WIDTH_PERCENT + WIDTH_SUM_TOLERANCE {
        let deficit: f32 = widths
            .iter()
            .filter(|w| **w < MIN_WIDTH_PERCENT)
            .map(|w| MIN_WIDTH_PERCENT - w)
            .sum();
        if deficit > 0.0 {
            let slack: f32 = widths
                .iter()
                .filter(|w| **w > MIN_WIDTH_PERCENT)
                .map(|w| w - MIN_WIDTH_PERCENT)
                .sum();
            for width in widths.iter_mut() {
                if *width < MIN_WIDTH_PERCENT {
                    *width = MIN_WIDTH_PERCENT;
                } else if slack > f32::EPSILON {
                    *width -= deficit * (*width - MIN_WIDTH_PERCENT) / slack;
                }
            }
        }
    }

    // Absorb residual rounding into the largest entry.
    let sum: f32 = widths.iter().sum();
    let residual = FULL_WIDTH_PERCENT - sum;
    if residual != 0.0 {
        let largest = widths
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        widths[largest] += residual;
    }
}

/// Severity for one invariant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridInvariantSeverity {
    Error,
    Warning,
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridInvariantCode {
    EmptyRow,
    NonContiguousColumns,
    NonFiniteWidth,
    WidthSumOutOfTolerance,
    WidthBelowMinimum,
    DuplicateItem,
}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridInvariantIssue {
    pub code: GridInvariantCode,
    pub severity: GridInvariantSeverity,
    pub row: Option<u32>,
    pub item: Option<ItemId>,
    pub message: String,
}

/// Structured invariant report over a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridInvariantReport {
    pub issues: Vec<GridInvariantIssue>,
}

impl GridInvariantReport {
    /// Return true if any error-level finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == GridInvariantSeverity::Error)
    }
}

impl fmt::Display for GridInvariantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("grid invariants hold");
        }
        for issue in &self.issues {
            writeln!(f, "[{:?}] {}", issue.code, issue.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagegrid_core::ItemKind;

    fn item(id: &str, row: u32, column: u32, width: f32) -> PlacedItem {
        PlacedItem {
            id: ItemId::new(id).unwrap(),
            kind: ItemKind::Committed,
            row,
            column,
            width_percent: width,
        }
    }

    fn grid(rows: Vec<Vec<PlacedItem>>) -> Grid {
        Grid { rows }
    }

    #[test]
    fn single_entry_is_forced_to_full_width() {
        let mut widths = vec![37.5];
        reconcile_widths(&mut widths);
        assert_eq!(widths, vec![100.0]);
    }

    #[test]
    fn zero_sum_splits_equally() {
        let mut widths = vec![0.0, 0.0, 0.0, 0.0];
        reconcile_widths(&mut widths);
        assert_eq!(widths, vec![25.0, 25.0, 25.0, 25.0]);
    }

    #[test]
    fn out_of_tolerance_sum_rescales() {
        let mut widths = vec![30.0, 30.0];
        reconcile_widths(&mut widths);
        assert!((widths[0] - 50.0).abs() < 0.01);
        assert!((widths[1] - 50.0).abs() < 0.01);
    }

    #[test]
    fn sub_minimum_entries_are_lifted_from_slack() {
        let mut widths = vec![4.0, 96.0];
        reconcile_widths(&mut widths);
        assert!((widths[0] - MIN_WIDTH_PERCENT).abs() < 0.01);
        assert!((widths[1] - 90.0).abs() < 0.01);
        assert!((widths.iter().sum::<f32>() - 100.0).abs() < WIDTH_SUM_TOLERANCE);
    }

    #[test]
    fn non_finite_entries_are_replaced() {
        let mut widths = vec![f32::NAN, 50.0, f32::INFINITY];
        reconcile_widths(&mut widths);
        let sum: f32 = widths.iter().sum();
        assert!((sum - 100.0).abs() < WIDTH_SUM_TOLERANCE);
        assert!(widths.iter().all(|w| w.is_finite()));
    }

    #[test]
    fn renormalize_prunes_and_restamps() {
        let mut g = grid(vec![
            vec![],
            vec![item("a", 7, 3, 60.0), item("b", 7, 9, 60.0)],
        ]);
        g.renormalize();
        assert_eq!(g.len(), 1);
        let row = &g.rows()[0];
        assert_eq!((row[0].row, row[0].column), (0, 0));
        assert_eq!((row[1].row, row[1].column), (0, 1));
        let sum: f32 = row.iter().map(|i| i.width_percent).sum();
        assert!((sum - 100.0).abs() < WIDTH_SUM_TOLERANCE);
    }

    #[test]
    fn report_flags_empty_row_and_bad_sum() {
        let g = grid(vec![vec![], vec![item("a", 1, 0, 30.0), item("b", 1, 1, 30.0)]]);
        let report = g.invariant_report();
        assert!(report.has_errors());
        let codes: Vec<_> = report.issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&GridInvariantCode::EmptyRow));
        assert!(codes.contains(&GridInvariantCode::WidthSumOutOfTolerance));
    }

    #[test]
    fn report_flags_duplicate_identity() {
        let g = grid(vec![
            vec![item("a", 0, 0, 100.0)],
            vec![item("a", 1, 0, 100.0)],
        ]);
        let report = g.invariant_report();
        assert!(
            report
                .issues
                .iter()
                .any(|i| i.code == GridInvariantCode::DuplicateItem)
        );
    }

    #[test]
    fn report_is_clean_after_renormalize() {
        let mut g = grid(vec![
            vec![item("a", 3, 2, 15.0), item("b", 0, 0, 95.0)],
            vec![item("c", 9, 9, f32::NAN)],
        ]);
        g.renormalize();
        let report = g.invariant_report();
        assert!(!report.has_errors(), "{report}");
    }
}
