pub mod arrow;
pub mod digikey;
pub mod http;
pub mod tme;

pub use arrow::ArrowApi;
pub use digikey::{DigikeyApi, DigikeySession};
pub use tme::TmeApi;
