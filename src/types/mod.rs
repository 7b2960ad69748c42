pub mod api_response;
pub mod authorization;
pub mod parts;
pub mod search;

pub use api_response::ApiResponse;
pub use authorization::{ApiVersion, OAuthAuthorization, OAuthCredential};
pub use parts::{BarcodeDetails, Category, CommonPart, OrderDetails, OrderLineItem, SearchResults};
pub use search::{MountingType, SearchOptions, SearchRequest};
