//! Persisted layout snapshot schema v1.
//!
//! A [`LayoutSnapshot`] is the flat, fully-positioned item list the host
//! writes to storage after every completed organize, drop, or resize. The
//! host partitions `items` back into pending/committed lists by `kind`.
//!
//! # Schema Versioning Policy
//!
//! - Additive fields may be carried in `extensions` without a version bump.
//! - Breaking field or semantic changes must bump
//!   [`LAYOUT_SCHEMA_VERSION`]; loaders reject unknown versions with
//!   actionable diagnostics.

use std::collections::BTreeMap;
use std::fmt;

use imagegrid_core::{ItemId, ItemKind, PlacedItem};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Current layout snapshot schema version.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

/// Flat persisted layout state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    /// Schema version for migration detection.
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    /// Every item with `row`, `column`, and `width_percent` populated,
    /// in row-major order.
    pub items: Vec<PlacedItem>,
    /// Forward-compatible extension bag.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_schema_version() -> u16 {
    LAYOUT_SCHEMA_VERSION
}

impl LayoutSnapshot {
    /// Create a new v1 snapshot.
    #[must_use]
    pub fn new(items: Vec<PlacedItem>) -> Self {
        Self {
            schema_version: LAYOUT_SCHEMA_VERSION,
            items,
            extensions: BTreeMap::new(),
        }
    }

    /// Items of one kind, in row-major order, for the host to persist into
    /// the matching store.
    #[must_use]
    pub fn items_of_kind(&self, kind: ItemKind) -> Vec<&PlacedItem> {
        self.items.iter().filter(|item| item.kind == kind).collect()
    }

    /// Validate the snapshot against schema and structural rules.
    pub fn validate(&self) -> Result<(), SnapshotValidationError> {
        if self.schema_version != LAYOUT_SCHEMA_VERSION {
            return Err(SnapshotValidationError::UnsupportedVersion {
                found: self.schema_version,
                expected: LAYOUT_SCHEMA_VERSION,
            });
        }

        let mut seen: FxHashSet<(&ItemId, ItemKind)> = FxHashSet::default();
        for item in &self.items {
            if !item.width_percent.is_finite() {
                return Err(SnapshotValidationError::NonFiniteWidth {
                    id: item.id.clone(),
                });
            }
            if !seen.insert((&item.id, item.kind)) {
                return Err(SnapshotValidationError::DuplicateItem {
                    id: item.id.clone(),
                    kind: item.kind,
                });
            }
        }
        Ok(())
    }
}

/// Validation failures for persisted snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValidationError {
    /// Snapshot was written by an unknown schema version.
    UnsupportedVersion { found: u16, expected: u16 },
    /// The same `(id, kind)` identity appears twice.
    DuplicateItem { id: ItemId, kind: ItemKind },
    /// An item carries a NaN or infinite width.
    NonFiniteWidth { id: ItemId },
}

impl fmt::Display for SnapshotValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => {
                write!(f, "unsupported snapshot schema version {found} (expected {expected})")
            }
            Self::DuplicateItem { id, kind } => {
                write!(f, "item identity ({id}, {kind:?}) appears twice")
            }
            Self::NonFiniteWidth { id } => {
                write!(f, "item {id} carries a non-finite width")
            }
        }
    }
}

impl std::error::Error for SnapshotValidationError {}
