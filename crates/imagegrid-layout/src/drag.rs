//! Drag-reorder gesture engine.
//!
//! A [`DragReorderEngine`] owns one drag gesture at a time over a working
//! [`Grid`]: `drag_start` captures a transfer payload and an optional host
//! preview resource, `drag_over` records the hover target, `drop` performs
//! the move, and `drag_end` unconditionally clears gesture state. Declined
//! gestures and no-op drops are ordinary values carrying an explicit reason;
//! nothing here panics across the public boundary.
//!
//! # Invariants
//!
//! 1. At most one drag is active; a second `drag_start` is declined.
//! 2. A drop conserves item identity: every `(id, kind)` present before the
//!    move is present after it, exactly once.
//! 3. The preview resource is released on `drag_end`, on gesture abort, and
//!    on engine drop, whichever comes first.

use std::fmt;

use imagegrid_core::{DropTarget, ItemId, ItemKind, PlacedItem, PreviewHandle, UploadLedger};
use serde::{Deserialize, Serialize};

use crate::FULL_WIDTH_PERCENT;
use crate::grid::Grid;

/// Transfer payload captured at drag start and used to re-resolve the
/// dragged item at drop time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPayload {
    pub id: ItemId,
    pub kind: ItemKind,
    pub source_row: u32,
    pub source_column: u32,
}

/// Why a `drag_start` was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragRejection {
    /// Another drag gesture is already active on this engine.
    AlreadyDragging,
    /// A divider resize session is active; gestures are mutually exclusive.
    ResizeInProgress,
    /// Some item anywhere in the grid has an upload in flight.
    UploadInFlight,
}

impl fmt::Display for DragRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyDragging => write!(f, "a drag gesture is already active"),
            Self::ResizeInProgress => write!(f, "a resize gesture is in progress"),
            Self::UploadInFlight => write!(f, "an upload is in flight"),
        }
    }
}

/// Why a `drop` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropNoopReason {
    /// No drag session is active. This is also how an adapter that failed
    /// to parse its platform transfer payload lands: it never started (or
    /// already aborted) the session, so the drop falls through here.
    NoActiveDrag,
    /// The captured payload no longer resolves to an item in the working
    /// grid, even after a full flatten-and-search. The gesture is aborted
    /// and the grid is left unchanged.
    ItemNotFound,
}

/// Result of one drop.
#[derive(Debug, PartialEq)]
pub enum DropOutcome {
    /// The move was applied; `items` is the flattened grid for persistence.
    Moved { items: Vec<PlacedItem> },
    /// The grid was left unchanged.
    Noop { reason: DropNoopReason },
}

#[derive(Debug)]
struct DragSession {
    payload: DragPayload,
    hover: Option<DropTarget>,
    preview: PreviewHandle,
}

/// Stateful drag-reorder gesture handler.
#[derive(Debug, Default)]
pub struct DragReorderEngine {
    session: Option<DragSession>,
}

impl DragReorderEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag session is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The current hover target, if a session is active and one was recorded.
    #[must_use]
    pub fn hover(&self) -> Option<DropTarget> {
        self.session.as_ref().and_then(|s| s.hover)
    }

    /// Begin dragging `item` from `(row, column)`.
    ///
    /// Declined while a resize session is active or while any upload is in
    /// flight anywhere in the grid (the move may change row membership,
    /// which must not race with an in-flight item losing its slot). On
    /// rejection the supplied `preview` is released immediately.
    pub fn drag_start(
        &mut self,
        item: &PlacedItem,
        row: u32,
        column: u32,
        ledger: &UploadLedger,
        resize_active: bool,
        preview: PreviewHandle,
    ) -> Result<(), DragRejection> {
        if self.session.is_some() {
            return Err(self.decline(DragRejection::AlreadyDragging, preview));
        }
        if resize_active {
            return Err(self.decline(DragRejection::ResizeInProgress, preview));
        }
        if ledger.any_in_flight() {
            return Err(self.decline(DragRejection::UploadInFlight, preview));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %item.id, row, column, "drag started");

        self.session = Some(DragSession {
            payload: DragPayload {
                id: item.id.clone(),
                kind: item.kind,
                source_row: row,
                source_column: column,
            },
            hover: None,
            preview,
        });
        Ok(())
    }

    /// Record the current hover target. Ignored when no session is active.
    pub fn drag_over(&mut self, target: DropTarget) {
        if let Some(session) = &mut self.session {
            session.hover = Some(target);
        }
    }

    /// Drop the dragged item onto `target`, mutating the working grid.
    ///
    /// The session stays active afterwards; hosts call [`drag_end`] once the
    /// platform gesture finishes, whether or not a drop happened.
    ///
    /// [`drag_end`]: DragReorderEngine::drag_end
    pub fn drop(&mut self, grid: &mut Grid, target: DropTarget) -> DropOutcome {
        let Some(session) = &self.session else {
            return DropOutcome::Noop {
                reason: DropNoopReason::NoActiveDrag,
            };
        };
        let payload = session.payload.clone();

        let Some((source_row, source_column)) = resolve_source(grid, &payload) else {
            // Defensive: the working grid no longer contains the item the
            // gesture captured. Abort rather than guess.
            #[cfg(feature = "tracing")]
            tracing::debug!(id = %payload.id, "dragged item not found; drop aborted");
            self.drag_end();
            return DropOutcome::Noop {
                reason: DropNoopReason::ItemNotFound,
            };
        };

        let item = grid.rows[source_row].remove(source_column);

        // Resolve the true target. The append-new-row zone always means a
        // fresh physical row past everything, so an emptied source row can
        // never swallow the drop; it is pruned right after.
        let (target_row, target_column) = match target {
            DropTarget::NewRow => (grid.rows.len(), 0),
            DropTarget::RowSpace { row } => (row as usize, 0),
            DropTarget::Cell { row, column } => (row as usize, column as usize),
        };

        while grid.rows.len() <= target_row {
            grid.rows.push(Vec::new());
        }
        let row = &mut grid.rows[target_row];
        let target_column = target_column.min(row.len());
        row.insert(target_column, item);

        // Rows whose membership changed get an equal width split; everything
        // else keeps its widths, subject to the renormalization backstop.
        let mut changed: Vec<bool> = (0..grid.rows.len())
            .map(|index| index == source_row || index == target_row)
            .collect();
        let mut kept_changed = Vec::with_capacity(grid.rows.len());
        let rows = std::mem::take(&mut grid.rows);
        for (index, row) in rows.into_iter().enumerate() {
            if !row.is_empty() {
                kept_changed.push(changed[index]);
                grid.rows.push(row);
            }
        }
        changed = kept_changed;

        for (index, row) in grid.rows.iter_mut().enumerate() {
            if changed[index] {
                let share = FULL_WIDTH_PERCENT / row.len() as f32;
                for item in row.iter_mut() {
                    item.width_percent = share;
                }
            }
        }

        grid.renormalize();

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %payload.id, target_row, target_column, "drop applied");

        DropOutcome::Moved {
            items: grid.flatten(),
        }
    }

    /// Clear all gesture state and release the preview resource.
    ///
    /// Safe to call whether or not a drop occurred, and more than once.
    pub fn drag_end(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.preview.release();
        }
    }

    fn decline(&self, rejection: DragRejection, mut preview: PreviewHandle) -> DragRejection {
        preview.release();
        #[cfg(feature = "tracing")]
        tracing::debug!(%rejection, "drag start declined");
        rejection
    }
}

/// Resolve the dragged item: direct row/column lookup from the payload
/// first, then a full search by identity.
fn resolve_source(grid: &Grid, payload: &DragPayload) -> Option<(usize, usize)> {
    let row = payload.source_row as usize;
    let column = payload.source_column as usize;
    if let Some(item) = grid.rows.get(row).and_then(|r| r.get(column))
        && item.id == payload.id
        && item.kind == payload.kind
    {
        return Some((row, column));
    }
    grid.find(&payload.id, payload.kind)
}
