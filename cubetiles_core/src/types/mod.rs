//! Core value types shared across the workspace: binary blobs, byte ranges, and
//! the compression-kind enum used for tile bodies.

mod blob;
pub use blob::*;

mod byte_range;
pub use byte_range::*;

mod compression_kind;
pub use compression_kind::*;
