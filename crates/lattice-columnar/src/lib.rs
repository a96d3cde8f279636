//! Typed in-memory columns for the lattice array algebra.
//!
//! This crate focuses on:
//! - Fixed-width numeric columns with per-type nil sentinels, plus nullable string columns.
//! - Fallible allocation (`try_reserve`) so callers can surface allocation failures instead of
//!   aborting.
//! - Stats derived once at finalization (null count, min/max, sortedness).
//! - A dimension hint marking columns that hold the compact encoding of a regular dimension.

#![forbid(unsafe_code)]

#[cfg(feature = "arrow")]
mod arrow;
mod column;
mod native;
mod stats;
mod types;

pub use crate::column::{
    try_allocate, Column, ColumnBuilder, ColumnData, DimensionHint, StorageError, StorageResult,
};
pub use crate::native::NativeType;
pub use crate::stats::ColumnStats;
pub use crate::types::{ColumnType, Value};
