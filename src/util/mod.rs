pub mod hash;

pub use hash::hash;
