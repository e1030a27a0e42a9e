//! C1: the data-source proxy layer sitting between backends and the tile extractor.

mod proxy;

pub use proxy::DataSourceProxy;
