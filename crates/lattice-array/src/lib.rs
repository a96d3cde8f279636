//! Virtual dimensions for a column store.
//!
//! A regular N-dimensional array is described by its dimensions; each dimension is stored as a
//! compact column (see [`EncodedDimension`]) whose size does not grow with the array. Selection,
//! projection, equi-join, grouping and averaging all work on that compact form directly.

#![forbid(unsafe_code)]

mod array;
mod cells;
mod dimension;
mod error;
mod group;
mod join;
mod materialize;
mod narrow;
mod numeric;
mod project;
mod select;

pub use crate::array::{materialize_measure_column, Array, IndexDimension};
pub use crate::cells::project_cells;
pub use crate::dimension::{AnalyticDimension, Dimension, EncodedDimension};
pub use crate::error::{ArrayError, ArrayResult, Irregularity};
pub use crate::group::{group, group_average, Grouping};
pub use crate::join::{subjoin, JoinResult};
pub use crate::materialize::{
    dimension_cell_values, dimension_elements_num, dimension_size, extend_measure_column,
    materialize_dimension, mbr_project, project_measure,
};
pub use crate::narrow::{dimension_subselect, dimension_theta_subselect};
pub use crate::numeric::DimValue;
pub use crate::project::project;
pub use crate::select::{mbr_subselect, subselect, theta_subselect, ThetaOperator};

pub use lattice_columnar::{Column, ColumnType, Value};
