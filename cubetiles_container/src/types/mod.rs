//! Core domain types: slice-axis geometry, tile identity, and the data-source sum type.

mod dense_array;
mod slice_axis;
mod tile_id;

pub use dense_array::*;
pub use slice_axis::*;
pub use tile_id::*;
