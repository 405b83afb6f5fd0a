#![forbid(unsafe_code)]

//! Core primitives for the image grid layout engine.
//!
//! This crate holds everything the layout solvers depend on but do not own:
//! the attachment item model ([`GridItem`], [`ItemKind`]), the host-fed
//! upload ledger that gates interactive gestures ([`UploadLedger`]), and the
//! host-agnostic gesture adapter surface ([`GestureEvent`], [`DropTarget`],
//! [`PreviewHandle`]).
//!
//! Nothing here performs I/O. The host owns item identity, upload transport,
//! and persistence; this crate only models them.

pub mod gesture;
pub mod item;

pub use gesture::{DropTarget, GestureEvent, PreviewHandle};
pub use item::{GridItem, ItemId, ItemKind, ItemModelError, PlacedItem, UploadLedger};
