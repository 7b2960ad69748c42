pub mod parametric;
pub mod suppliers;
pub mod taxonomy;

pub use suppliers::{Supplier, Suppliers};
