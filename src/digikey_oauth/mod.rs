//! OAuth2 token service for DigiKey: consent URL, code exchange and refresh.

mod endpoints;
pub mod service;

pub use service::{DIGIKEY_PROVIDER, DigikeyOauthService};
