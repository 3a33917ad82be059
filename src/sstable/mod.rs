//! # On-disk tables
//!
//! A flat, checksummed format: a run of records followed by a fixed
//! [`Footer`]. [`TableBuilder`] writes one, [`Table`] decodes and verifies
//! it, [`TableCache`] keeps opened tables around and serves them to a
//! `Version` as iterators.

pub mod builder;
pub mod cache;
pub mod footer;
pub mod reader;

pub use builder::TableBuilder;
pub use cache::TableCache;
pub use footer::{Footer, TableMeta};
pub use reader::Table;
