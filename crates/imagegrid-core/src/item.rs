//! Attachment item model and upload ledger.
//!
//! Items arrive from the host in two ordered lists (pending uploads and
//! already-committed attachments), each optionally carrying a stored
//! `row`/`column`/`width_percent` from a previous session. The layout engine
//! exclusively owns those three fields once it has organized the items; the
//! host owns identity, upload progress, and persistence.
//!
//! # Invariants
//!
//! 1. An [`ItemId`] is never empty.
//! 2. An item's `kind` flips at most once, from `Pending` to `Committed`,
//!    and the flip is host-driven; layout fields survive the flip untouched.
//! 3. A [`PlacedItem`] always carries a fully-resolved position; optional
//!    fields exist only on the [`GridItem`] input side.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable host-assigned identifier for one attachment.
///
/// The empty string is reserved/invalid so IDs are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new item ID, rejecting the empty string.
    pub fn new(raw: impl Into<String>) -> Result<Self, ItemModelError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ItemModelError::EmptyItemId);
        }
        Ok(Self(raw))
    }

    /// Get the raw string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an attachment is still uploading or already persisted.
///
/// Replaces the host's ad hoc "has a local file handle" duck-typing with an
/// explicit discriminant set once at item creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Has a local preview and upload progress; no remote URL yet.
    Pending,
    /// Persisted remotely; safe to reference by URL.
    Committed,
}

/// One attachment as supplied by the host, with optional stored placement.
///
/// `row`, `column`, and `width_percent` are `None` for items the organizer
/// has never seen (fresh uploads, or records written before layout metadata
/// existed). Stale values from a previous session are accepted and
/// reconciled rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridItem {
    pub id: ItemId,
    pub kind: ItemKind,
    #[serde(default)]
    pub row: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    #[serde(default)]
    pub width_percent: Option<f32>,
}

impl GridItem {
    /// Build a fresh item with no stored placement.
    #[must_use]
    pub fn new(id: ItemId, kind: ItemKind) -> Self {
        Self {
            id,
            kind,
            row: None,
            column: None,
            width_percent: None,
        }
    }

    /// Attach a stored placement to the item.
    #[must_use]
    pub fn with_placement(mut self, row: u32, column: u32, width_percent: f32) -> Self {
        self.row = Some(row);
        self.column = Some(column);
        self.width_percent = Some(width_percent);
        self
    }
}

/// One attachment with a fully-resolved grid position.
///
/// Every organize/drag/resize emits a flat list of these back to the host
/// for persistence; the host partitions them by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub row: u32,
    pub column: u32,
    pub width_percent: f32,
}

impl PlacedItem {
    /// Identity pair used for lookup across reorganizes.
    #[must_use]
    pub fn identity(&self) -> (&ItemId, ItemKind) {
        (&self.id, self.kind)
    }

    /// Convert back into an input-side item carrying its placement.
    #[must_use]
    pub fn into_grid_item(self) -> GridItem {
        GridItem {
            id: self.id,
            kind: self.kind,
            row: Some(self.row),
            column: Some(self.column),
            width_percent: Some(self.width_percent),
        }
    }
}

/// Errors for malformed item model values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemModelError {
    /// Item IDs must be non-empty.
    EmptyItemId,
}

impl fmt::Display for ItemModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyItemId => write!(f, "item id must be non-empty"),
        }
    }
}

impl std::error::Error for ItemModelError {}

/// Host-fed record of per-item upload progress.
///
/// Any recorded progress `p` with `0.0 <= p < 100.0` counts as in flight and
/// globally gates starting a drag or a resize: both gestures recompute
/// positions for whole rows, which must not race with an in-flight item
/// losing its slot. Progress for items that finished (or never started) is
/// simply absent from the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadLedger {
    progress: BTreeMap<ItemId, f32>,
}

impl UploadLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest progress for an item. Non-finite values are ignored.
    pub fn set_progress(&mut self, id: ItemId, percent: f32) {
        if !percent.is_finite() {
            return;
        }
        self.progress.insert(id, percent);
    }

    /// Drop an item's progress entry when its upload completes and its kind
    /// flips to [`ItemKind::Committed`].
    pub fn complete(&mut self, id: &ItemId) {
        self.progress.remove(id);
    }

    /// Forget all recorded progress.
    pub fn clear(&mut self) {
        self.progress.clear();
    }

    /// Progress recorded for one item, if any.
    #[must_use]
    pub fn progress(&self, id: &ItemId) -> Option<f32> {
        self.progress.get(id).copied()
    }

    /// True when any recorded progress is in `[0, 100)`.
    #[must_use]
    pub fn any_in_flight(&self) -> bool {
        self.progress
            .values()
            .any(|&p| (0.0..100.0).contains(&p))
    }
}
