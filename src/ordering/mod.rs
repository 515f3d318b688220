pub mod position;

pub use position::{allocate_append, allocate_between, fits_between, spaced, GAP};
