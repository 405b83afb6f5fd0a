#![forbid(unsafe_code)]

//! Row/column layout engine for image attachment grids.
//!
//! Three collaborators sit behind one data model:
//!
//! - [`organize`] — pure function from the host's flat pending/committed
//!   item lists to a normalized [`Grid`].
//! - [`DragReorderEngine`] — gesture session that moves one item between
//!   positions and re-derives widths.
//! - [`ResizeEngine`] — gesture session that shifts the width split across
//!   one row's divider under a minimum-width constraint.
//!
//! [`GestureSession`] wraps both engines behind the semantic
//! [`GestureEvent`] surface for hosts that prefer a single dispatch point.
//!
//! Every mutating path ends in the same renormalization backstop
//! ([`Grid::renormalize`]), so emitted grids always satisfy the width-sum,
//! column-contiguity, minimum-width, and no-empty-row invariants. The host
//! persists the result via [`LayoutSnapshot`].
//!
//! All operations are synchronous in-memory computations; nothing here
//! performs I/O or blocks, so the engines are safe to drive directly from
//! UI event handlers. At most one gesture (one drag or one resize) may be
//! active at a time.

pub mod drag;
pub mod grid;
pub mod organizer;
pub mod resize;
pub mod session;
pub mod snapshot;

pub use drag::{DragPayload, DragRejection, DragReorderEngine, DropNoopReason, DropOutcome};
pub use grid::{
    Grid, GridInvariantCode, GridInvariantIssue, GridInvariantReport, GridInvariantSeverity, Row,
};
pub use organizer::organize;
pub use resize::{ResizeEngine, ResizeRejection};
pub use session::{GestureSession, SessionOutcome};
pub use snapshot::{LAYOUT_SCHEMA_VERSION, LayoutSnapshot, SnapshotValidationError};

pub use imagegrid_core::{
    DropTarget, GestureEvent, GridItem, ItemId, ItemKind, PlacedItem, PreviewHandle, UploadLedger,
};

/// Smallest width a column may occupy, in percent of its row.
pub const MIN_WIDTH_PERCENT: f32 = 10.0;

/// A row's widths always sum to this.
pub const FULL_WIDTH_PERCENT: f32 = 100.0;

/// Tolerance for "sums to 100" checks.
pub const WIDTH_SUM_TOLERANCE: f32 = 0.1;
