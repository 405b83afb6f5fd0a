//! Gesture session: the adapter seam between host events and the engines.
//!
//! A platform adapter translates its native pointer / drag-and-drop events
//! into [`GestureEvent`]s and feeds them to one [`GestureSession`], which
//! owns both engines and enforces their mutual exclusion. Hosts that need a
//! real preview resource (or richer rejection reporting) can drive
//! [`DragReorderEngine`] and [`ResizeEngine`] directly instead; this wrapper
//! is the minimal event-driven surface.

use imagegrid_core::{GestureEvent, PlacedItem, PreviewHandle, UploadLedger};

use crate::drag::{DragReorderEngine, DropOutcome};
use crate::grid::Grid;
use crate::resize::ResizeEngine;

/// What one dispatched event did.
#[derive(Debug, PartialEq)]
pub enum SessionOutcome {
    /// A completed operation produced a layout the host should persist.
    Persist { items: Vec<PlacedItem> },
    /// The event advanced transient gesture state only.
    Handled,
    /// The event was declined or did not apply; the grid is unchanged.
    Ignored,
}

/// Owner of both gesture engines, dispatching semantic events to them.
#[derive(Debug, Default)]
pub struct GestureSession {
    drag: DragReorderEngine,
    resize: ResizeEngine,
}

impl GestureSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any gesture (drag or resize) is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.drag.is_active() || self.resize.is_active()
    }

    /// Direct access to the drag engine, for hosts that attach previews.
    #[must_use]
    pub fn drag_engine_mut(&mut self) -> &mut DragReorderEngine {
        &mut self.drag
    }

    /// Working widths of a row mid-resize, for live rendering.
    #[must_use]
    pub fn resize_preview(&self) -> Option<&[f32]> {
        self.resize.current_widths()
    }

    /// Dispatch one semantic event against the working grid.
    pub fn handle(
        &mut self,
        grid: &mut Grid,
        ledger: &UploadLedger,
        event: GestureEvent,
    ) -> SessionOutcome {
        match event {
            GestureEvent::DragStart { row, column } => {
                let Some(item) = grid
                    .row(row as usize)
                    .and_then(|r| r.get(column as usize))
                    .cloned()
                else {
                    return SessionOutcome::Ignored;
                };
                match self.drag.drag_start(
                    &item,
                    row,
                    column,
                    ledger,
                    self.resize.is_active(),
                    PreviewHandle::noop(),
                ) {
                    Ok(()) => SessionOutcome::Handled,
                    Err(_) => SessionOutcome::Ignored,
                }
            }
            GestureEvent::DragOver { target } => {
                if !self.drag.is_active() {
                    return SessionOutcome::Ignored;
                }
                self.drag.drag_over(target);
                SessionOutcome::Handled
            }
            GestureEvent::Drop { target } => match self.drag.drop(grid, target) {
                DropOutcome::Moved { items } => SessionOutcome::Persist { items },
                DropOutcome::Noop { .. } => SessionOutcome::Ignored,
            },
            GestureEvent::DragEnd => {
                if !self.drag.is_active() {
                    return SessionOutcome::Ignored;
                }
                self.drag.drag_end();
                SessionOutcome::Handled
            }
            GestureEvent::ResizeBegin {
                row,
                divider,
                row_px,
            } => {
                match self.resize.begin(
                    grid,
                    row as usize,
                    divider as usize,
                    row_px,
                    ledger,
                    self.drag.is_active(),
                ) {
                    Ok(()) => SessionOutcome::Handled,
                    Err(_) => SessionOutcome::Ignored,
                }
            }
            GestureEvent::ResizeMove { delta_px } => match self.resize.move_by(delta_px) {
                Some(_) => SessionOutcome::Handled,
                None => SessionOutcome::Ignored,
            },
            GestureEvent::ResizeEnd => match self.resize.end(grid) {
                Some(items) => SessionOutcome::Persist { items },
                None => SessionOutcome::Ignored,
            },
        }
    }

    /// Abandon any in-progress gesture, releasing transient resources.
    ///
    /// For abnormal teardown paths where the host cannot deliver a proper
    /// `DragEnd`/`ResizeEnd`.
    pub fn reset(&mut self) {
        self.drag.drag_end();
        self.resize.cancel();
    }
}
