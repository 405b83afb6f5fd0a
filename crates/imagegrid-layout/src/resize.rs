//! Divider-resize gesture engine.
//!
//! A [`ResizeEngine`] adjusts the width split between the columns on either
//! side of one divider in one row. `begin` snapshots the row's widths and
//! pixel width, `move_by` converts pointer deltas into a constrained
//! percentage redistribution, and `end` commits the last computed widths
//! back into the grid.
//!
//! # Invariants
//!
//! 1. At most one resize session is active; a second `begin` is declined.
//! 2. After every `move_by`, the working widths sum to 100 within tolerance
//!    and no width is below [`MIN_WIDTH_PERCENT`].
//! 3. A row with a single item has no divider and is not resizable.

use std::fmt;

use imagegrid_core::{PlacedItem, UploadLedger};
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, reconcile_widths};
use crate::{FULL_WIDTH_PERCENT, MIN_WIDTH_PERCENT, WIDTH_SUM_TOLERANCE};

/// Why a `begin` was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeRejection {
    /// Another resize session is already active on this engine.
    AlreadyResizing,
    /// A drag gesture is active; gestures are mutually exclusive.
    DragInProgress,
    /// Some item anywhere in the grid has an upload in flight.
    UploadInFlight,
    /// The row does not exist or holds fewer than two items.
    RowNotResizable,
    /// The divider index does not sit between two columns of the row.
    DividerOutOfRange,
    /// The reported row pixel width is zero, negative, or non-finite, so
    /// pointer deltas cannot be converted into percentages.
    NonPositiveRowWidth,
}

impl fmt::Display for ResizeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyResizing => write!(f, "a resize session is already active"),
            Self::DragInProgress => write!(f, "a drag gesture is in progress"),
            Self::UploadInFlight => write!(f, "an upload is in flight"),
            Self::RowNotResizable => write!(f, "row has no divider to resize"),
            Self::DividerOutOfRange => write!(f, "divider index is out of range"),
            Self::NonPositiveRowWidth => write!(f, "row pixel width must be positive"),
        }
    }
}

#[derive(Debug, Clone)]
struct ResizeSession {
    row_index: usize,
    divider: usize,
    row_px: f32,
    initial: Vec<f32>,
    current: Vec<f32>,
}

/// Stateful divider-resize gesture handler.
#[derive(Debug, Default)]
pub struct ResizeEngine {
    session: Option<ResizeSession>,
}

impl ResizeEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a resize session is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Working widths of the row under resize, for live rendering.
    #[must_use]
    pub fn current_widths(&self) -> Option<&[f32]> {
        self.session.as_ref().map(|s| s.current.as_slice())
    }

    /// Begin resizing the divider between columns `divider` and `divider+1`
    /// of row `row_index`, whose rendered width is `row_px` pixels.
    pub fn begin(
        &mut self,
        grid: &Grid,
        row_index: usize,
        divider: usize,
        row_px: f32,
        ledger: &UploadLedger,
        drag_active: bool,
    ) -> Result<(), ResizeRejection> {
        if self.session.is_some() {
            return Err(ResizeRejection::AlreadyResizing);
        }
        if drag_active {
            return Err(ResizeRejection::DragInProgress);
        }
        if ledger.any_in_flight() {
            return Err(ResizeRejection::UploadInFlight);
        }
        let Some(row) = grid.row(row_index) else {
            return Err(ResizeRejection::RowNotResizable);
        };
        if row.len() < 2 {
            return Err(ResizeRejection::RowNotResizable);
        }
        if divider + 1 >= row.len() {
            return Err(ResizeRejection::DividerOutOfRange);
        }
        if !row_px.is_finite() || row_px <= 0.0 {
            return Err(ResizeRejection::NonPositiveRowWidth);
        }

        let initial: Vec<f32> = row.iter().map(|item| item.width_percent).collect();
        #[cfg(feature = "tracing")]
        tracing::debug!(row_index, divider, row_px, "resize started");

        self.session = Some(ResizeSession {
            row_index,
            divider,
            row_px,
            current: initial.clone(),
            initial,
        });
        Ok(())
    }

    /// Apply a pointer delta (pixels, rightward positive) relative to the
    /// gesture origin, recomputing the working widths.
    ///
    /// Returns the working widths, or `None` when no session is active.
    pub fn move_by(&mut self, delta_px: f32) -> Option<&[f32]> {
        let session = self.session.as_mut()?;
        if !delta_px.is_finite() {
            return Some(&session.current);
        }

        let delta_percent = delta_px / session.row_px * FULL_WIDTH_PERCENT;
        session.current = redistribute(&session.initial, session.divider, delta_percent);
        Some(&session.current)
    }

    /// Commit the last computed widths into the grid and clear the session.
    ///
    /// Returns the flattened grid for persistence, or `None` when no session
    /// was active. If the grid's shape changed under the gesture (defensive;
    /// gestures are mutually exclusive), nothing is written.
    pub fn end(&mut self, grid: &mut Grid) -> Option<Vec<PlacedItem>> {
        let session = self.session.take()?;

        let applies = grid
            .row(session.row_index)
            .is_some_and(|row| row.len() == session.current.len());
        if applies {
            let row = &mut grid.rows[session.row_index];
            for (item, width) in row.iter_mut().zip(&session.current) {
                item.width_percent = *width;
            }
        }
        grid.renormalize();

        #[cfg(feature = "tracing")]
        tracing::debug!(row_index = session.row_index, applied = applies, "resize ended");

        applies.then(|| grid.flatten())
    }

    /// Abandon the session without committing, releasing all gesture state.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

/// Redistribute a snapshot of row widths after moving the divider between
/// `divider` and `divider + 1` by `delta_percent`.
///
/// The left and right column groups are resized as blocks, each clamped to
/// `group_size * MIN_WIDTH_PERCENT`; within a group, members keep their
/// initial relative shares.
fn redistribute(initial: &[f32], divider: usize, delta_percent: f32) -> Vec<f32> {
    let (left, right) = initial.split_at(divider + 1);
    let left_initial: f32 = left.iter().sum();
    let right_initial: f32 = right.iter().sum();

    let left_min = left.len() as f32 * MIN_WIDTH_PERCENT;
    let right_min = right.len() as f32 * MIN_WIDTH_PERCENT;

    let mut left_total = (left_initial + delta_percent).max(left_min);
    let mut right_total = (right_initial - delta_percent).max(right_min);

    let total = left_total + right_total;
    if (total - FULL_WIDTH_PERCENT).abs() > WIDTH_SUM_TOLERANCE && total > f32::EPSILON {
        let scale = FULL_WIDTH_PERCENT / total;
        left_total *= scale;
        right_total *= scale;
        // Rescaling can push a group back under its floor; pin it there and
        // hand the rest to the other group.
        if left_total < left_min {
            left_total = left_min;
            right_total = FULL_WIDTH_PERCENT - left_min;
        } else if right_total < right_min {
            right_total = right_min;
            left_total = FULL_WIDTH_PERCENT - right_min;
        }
    }

    let mut widths = Vec::with_capacity(initial.len());
    spread_group(&mut widths, left, left_initial, left_total);
    spread_group(&mut widths, right, right_initial, right_total);

    reconcile_widths(&mut widths);
    widths
}

/// Distribute `group_total` across a group in proportion to each member's
/// initial share (equal split when the group's initial total is zero), then
/// clamp members to the minimum.
fn spread_group(out: &mut Vec<f32>, group: &[f32], group_initial: f32, group_total: f32) {
    if group.is_empty() {
        return;
    }
    if group_initial <= f32::EPSILON {
        let share = group_total / group.len() as f32;
        out.extend(group.iter().map(|_| share.max(MIN_WIDTH_PERCENT)));
        return;
    }
    for width in group {
        let scaled = group_total * width / group_initial;
        out.push(scaled.max(MIN_WIDTH_PERCENT));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::organize;
    use imagegrid_core::{GridItem, ItemId, ItemKind};

    fn committed(raw: &str, row: u32, column: u32, width: f32) -> GridItem {
        GridItem::new(ItemId::new(raw).unwrap(), ItemKind::Committed)
            .with_placement(row, column, width)
    }

    fn fifty_fifty() -> Grid {
        organize(
            &[],
            &[committed("a", 0, 0, 50.0), committed("b", 0, 1, 50.0)],
        )
    }

    fn begin(engine: &mut ResizeEngine, grid: &Grid, row: usize, divider: usize, px: f32) {
        engine
            .begin(grid, row, divider, px, &UploadLedger::new(), false)
            .expect("resize should start");
    }

    fn assert_widths(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 0.05, "got {actual:?}, expected {expected:?}");
        }
    }

    #[test]
    fn plus_ten_points_yields_sixty_forty() {
        let grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        begin(&mut engine, &grid, 0, 0, 1000.0);

        // 100 px over a 1000 px row is 10 percentage points.
        let widths = engine.move_by(100.0).unwrap().to_vec();
        assert_widths(&widths, &[60.0, 40.0]);
    }

    #[test]
    fn large_negative_delta_clamps_to_minimum() {
        let grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        begin(&mut engine, &grid, 0, 0, 1000.0);

        let widths = engine.move_by(-450.0).unwrap().to_vec();
        assert_widths(&widths, &[10.0, 90.0]);
    }

    #[test]
    fn deltas_are_relative_to_the_snapshot_not_cumulative() {
        let grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        begin(&mut engine, &grid, 0, 0, 1000.0);

        engine.move_by(300.0);
        let widths = engine.move_by(100.0).unwrap().to_vec();
        assert_widths(&widths, &[60.0, 40.0]);
    }

    #[test]
    fn group_members_keep_relative_shares() {
        let grid = organize(
            &[],
            &[
                committed("a", 0, 0, 60.0),
                committed("b", 0, 1, 20.0),
                committed("c", 0, 2, 20.0),
            ],
        );
        let mut engine = ResizeEngine::new();
        // Divider between a and the (b, c) group.
        begin(&mut engine, &grid, 0, 0, 1000.0);

        let widths = engine.move_by(-200.0).unwrap().to_vec();
        // Left gives up 20 points; b and c split the gain 1:1.
        assert_widths(&widths, &[40.0, 30.0, 30.0]);
    }

    #[test]
    fn end_commits_the_last_move() {
        let mut grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        begin(&mut engine, &grid, 0, 0, 1000.0);
        engine.move_by(100.0);

        let items = engine.end(&mut grid).expect("commit should apply");
        assert_eq!(items.len(), 2);
        assert_widths(
            &grid.rows()[0]
                .iter()
                .map(|i| i.width_percent)
                .collect::<Vec<_>>(),
            &[60.0, 40.0],
        );
        assert!(!engine.is_active());
        assert!(!grid.invariant_report().has_errors());
    }

    #[test]
    fn end_without_move_commits_the_snapshot() {
        let mut grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        begin(&mut engine, &grid, 0, 0, 1000.0);
        let items = engine.end(&mut grid).expect("commit should apply");
        assert_eq!(items.len(), 2);
        assert_widths(
            &grid.rows()[0]
                .iter()
                .map(|i| i.width_percent)
                .collect::<Vec<_>>(),
            &[50.0, 50.0],
        );
    }

    #[test]
    fn single_item_row_is_not_resizable() {
        let grid = organize(&[], &[committed("a", 0, 0, 100.0)]);
        let mut engine = ResizeEngine::new();
        let result = engine.begin(&grid, 0, 0, 1000.0, &UploadLedger::new(), false);
        assert_eq!(result, Err(ResizeRejection::RowNotResizable));
    }

    #[test]
    fn non_positive_pixel_width_declines() {
        let grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        for px in [0.0, -5.0, f32::NAN] {
            let result = engine.begin(&grid, 0, 0, px, &UploadLedger::new(), false);
            assert_eq!(result, Err(ResizeRejection::NonPositiveRowWidth));
        }
    }

    #[test]
    fn divider_must_sit_between_two_columns() {
        let grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        let result = engine.begin(&grid, 0, 1, 1000.0, &UploadLedger::new(), false);
        assert_eq!(result, Err(ResizeRejection::DividerOutOfRange));
    }

    #[test]
    fn in_flight_upload_declines_resize() {
        let grid = fifty_fifty();
        let mut ledger = UploadLedger::new();
        ledger.set_progress(ItemId::new("a").unwrap(), 45.0);
        let mut engine = ResizeEngine::new();
        let result = engine.begin(&grid, 0, 0, 1000.0, &ledger, false);
        assert_eq!(result, Err(ResizeRejection::UploadInFlight));
    }

    #[test]
    fn drag_in_progress_declines_resize() {
        let grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        let result = engine.begin(&grid, 0, 0, 1000.0, &UploadLedger::new(), true);
        assert_eq!(result, Err(ResizeRejection::DragInProgress));
    }

    #[test]
    fn shape_change_under_gesture_commits_nothing() {
        let mut grid = fifty_fifty();
        let mut engine = ResizeEngine::new();
        begin(&mut engine, &grid, 0, 0, 1000.0);
        engine.move_by(100.0);

        grid.rows[0].pop();
        grid.renormalize();
        let before = grid.clone();

        assert_eq!(engine.end(&mut grid), None);
        assert_eq!(grid, before);
    }

    #[test]
    fn widths_stay_valid_across_extreme_deltas() {
        let grid = organize(
            &[],
            &[
                committed("a", 0, 0, 25.0),
                committed("b", 0, 1, 25.0),
                committed("c", 0, 2, 25.0),
                committed("d", 0, 3, 25.0),
            ],
        );
        let mut engine = ResizeEngine::new();
        begin(&mut engine, &grid, 0, 1, 500.0);

        for delta in [-10_000.0, -37.0, 0.0, 42.5, 10_000.0] {
            let widths = engine.move_by(delta).unwrap();
            let sum: f32 = widths.iter().sum();
            assert!((sum - 100.0).abs() <= WIDTH_SUM_TOLERANCE, "sum {sum}");
            assert!(
                widths.iter().all(|w| *w >= MIN_WIDTH_PERCENT - 0.01),
                "{widths:?}"
            );
        }
    }
}
