//! Pure organizer: flat item lists in, normalized row/column grid out.
//!
//! [`organize`] is deterministic, side-effect free, and idempotent modulo
//! floating-point tolerance, so the host can call it on every change to its
//! item lists. Placement stored by a previous (possibly stale) session is
//! honored where possible: items are ordered by stored column then original
//! input position, so the arrangement a user last saw survives reloads even
//! when row numbers have gaps or columns are out of range.

use std::collections::BTreeMap;

use imagegrid_core::{GridItem, ItemKind, PlacedItem};

use crate::FULL_WIDTH_PERCENT;
use crate::grid::{Grid, Row, reconcile_widths};

/// One merged input item, tagged with the list it came from and its input
/// position for stable tie-breaking.
struct Working {
    item: GridItem,
    input_index: usize,
}

/// Arrange pending and committed items into a normalized grid.
///
/// The list an item arrives in decides its kind; a stale `kind` field on the
/// item itself is overridden. Items without a stored `row` each open a fresh
/// full-width row after the highest stored row (vertical stacking is the
/// default layout policy).
#[must_use]
pub fn organize(pending: &[GridItem], committed: &[GridItem]) -> Grid {
    let mut merged: Vec<Working> = Vec::with_capacity(pending.len() + committed.len());
    for (kind, list) in [(ItemKind::Pending, pending), (ItemKind::Committed, committed)] {
        for item in list {
            let mut item = item.clone();
            item.kind = kind;
            merged.push(Working {
                item,
                input_index: merged.len(),
            });
        }
    }

    // Row-less items stack below the highest stored row, one per row.
    let max_defined_row: i64 = merged
        .iter()
        .filter_map(|w| w.item.row)
        .map(i64::from)
        .max()
        .unwrap_or(-1);
    let mut next_fresh_row = (max_defined_row + 1) as u32;
    for working in &mut merged {
        if working.item.row.is_none() {
            working.item.row = Some(next_fresh_row);
            working.item.column = Some(0);
            working.item.width_percent = Some(FULL_WIDTH_PERCENT);
            next_fresh_row = next_fresh_row.saturating_add(1);
        }
    }

    // Bucket by stored row; BTreeMap iteration gives ascending row order,
    // which closes gaps left by deleted rows when we re-stamp below.
    let mut buckets: BTreeMap<u32, Vec<Working>> = BTreeMap::new();
    for working in merged {
        let row = working.item.row.unwrap_or(0);
        buckets.entry(row).or_default().push(working);
    }

    let mut rows: Vec<Row> = Vec::with_capacity(buckets.len());
    for (row_index, (_, mut bucket)) in buckets.into_iter().enumerate() {
        // Stored column first (undefined sorts last), input order as tie-break.
        bucket.sort_by_key(|w| (w.item.column.unwrap_or(u32::MAX), w.input_index));

        let mut widths = reconciled_widths(&bucket);
        reconcile_widths(&mut widths);

        let row: Row = bucket
            .into_iter()
            .zip(widths)
            .enumerate()
            .map(|(column, (working, width))| PlacedItem {
                id: working.item.id,
                kind: working.item.kind,
                row: row_index as u32,
                column: column as u32,
                width_percent: width,
            })
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Grid { rows }
}

/// Resolve stored widths against the items that lack one: undefined widths
/// share whatever the defined ones left of the 100%, equally.
fn reconciled_widths(bucket: &[Working]) -> Vec<f32> {
    let defined_sum: f32 = bucket
        .iter()
        .filter_map(|w| w.item.width_percent)
        .filter(|w| w.is_finite())
        .sum();
    let undefined_count = bucket
        .iter()
        .filter(|w| !w.item.width_percent.is_some_and(f32::is_finite))
        .count();

    let share = if undefined_count > 0 {
        (FULL_WIDTH_PERCENT - defined_sum).max(0.0) / undefined_count as f32
    } else {
        0.0
    };

    bucket
        .iter()
        .map(|w| match w.item.width_percent {
            Some(width) if width.is_finite() => width,
            _ => share,
        })
        .collect()
}
