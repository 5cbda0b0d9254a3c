pub mod error;
pub mod request;
pub mod search;

pub use error::SearchError;
pub use request::{decode_polygon, CoordinatesRequest, DocumentRequest};
pub use search::{EstateSearch, EstateSearchResponse};
