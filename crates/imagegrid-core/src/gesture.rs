//! Host-agnostic gesture adapter surface.
//!
//! The layout engines never see native pointer or drag-and-drop events. A
//! thin platform adapter translates whatever the host's event system emits
//! into [`GestureEvent`]s, and the engines consume those. This keeps the
//! reorder/resize algorithms independent of any particular UI toolkit.
//!
//! # Failure Modes
//!
//! - An adapter that cannot parse its platform's transfer payload should
//!   deliver `Drop` without a matching active session; the drag engine
//!   treats that as a no-op.
//! - Hosts are not guaranteed to deliver `End` on abnormal teardown, which
//!   is why [`PreviewHandle`] releases on drop as well as on explicit
//!   `release()`.

use serde::{Deserialize, Serialize};

/// Where a drag is currently hovering, or where a drop landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum DropTarget {
    /// A specific column slot in an existing row.
    Cell { row: u32, column: u32 },
    /// The free space of an existing row; resolves to column 0 of that row.
    RowSpace { row: u32 },
    /// The dedicated append-new-row zone past the last non-empty row.
    ///
    /// Deliberately carries no row index: the drop path resolves it against
    /// the row count at drop time, so a stale index captured at hover time
    /// cannot leak into the drop.
    NewRow,
}

/// One semantic gesture step, as translated by the platform adapter.
///
/// Exactly one of the two gesture families (drag-reorder, divider-resize)
/// may be in progress at a time; the consumer enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureEvent {
    /// Pointer went down on the item at `(row, column)`.
    DragStart { row: u32, column: u32 },
    /// Hover moved to a new target.
    DragOver { target: DropTarget },
    /// The item was released over a target.
    Drop { target: DropTarget },
    /// The drag ended, with or without a drop.
    DragEnd,
    /// Pointer went down on the divider between columns `divider` and
    /// `divider + 1` of `row`, whose rendered width is `row_px` pixels.
    ResizeBegin { row: u32, divider: u32, row_px: f32 },
    /// Pointer moved by `delta_px` pixels (rightward positive) since the
    /// resize began.
    ResizeMove { delta_px: f32 },
    /// The divider was released; the last computed widths are committed.
    ResizeEnd,
}

/// Release callback for a transient gesture resource (e.g. a drag preview).
type ReleaseFn = Box<dyn FnOnce()>;

/// Owner of one transient host resource created for the lifetime of a
/// gesture.
///
/// No single teardown signal is guaranteed to fire in every host
/// environment, so cleanup is double-armed: an explicit [`release`] call on
/// the normal path, and `Drop` as the backstop for abnormal teardown. The
/// underlying callback runs at most once.
///
/// [`release`]: PreviewHandle::release
pub struct PreviewHandle {
    release: Option<ReleaseFn>,
}

impl PreviewHandle {
    /// Wrap a host-supplied release callback.
    #[must_use]
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release, for hosts without preview resources.
    #[must_use]
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Release the underlying resource now. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!("gesture preview released");
            release();
        }
    }

    /// Whether the resource has already been released (or never existed).
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_handle() -> (PreviewHandle, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let witness = Rc::clone(&count);
        let handle = PreviewHandle::new(move || witness.set(witness.get() + 1));
        (handle, count)
    }

    #[test]
    fn explicit_release_fires_once() {
        let (mut handle, count) = counting_handle();
        handle.release();
        handle.release();
        assert_eq!(count.get(), 1);
        assert!(handle.is_released());
    }

    #[test]
    fn drop_releases_unreleased_handle() {
        let (handle, count) = counting_handle();
        drop(handle);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn release_then_drop_does_not_double_fire() {
        let (mut handle, count) = counting_handle();
        handle.release();
        drop(handle);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn noop_handle_is_already_released() {
        let handle = PreviewHandle::noop();
        assert!(handle.is_released());
    }
}
