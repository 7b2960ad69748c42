pub mod digikey_oauth;
pub mod suppliers;
