use estate_geo::{Coordinate, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Body of a polygon search: the traced outline, in drawing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatesRequest {
    pub coordinates: Vec<Coordinate>,
}

impl CoordinatesRequest {
    pub fn into_polygon(self) -> Result<Polygon, SearchError> {
        Polygon::new(self.coordinates).map_err(|err| SearchError::InvalidInput(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub email: String,
}

pub fn decode_polygon(body: &[u8]) -> Result<Polygon, SearchError> {
    let request: CoordinatesRequest = serde_json::from_slice(body)
        .map_err(|err| SearchError::InvalidInput(format!("malformed coordinates: {err}")))?;
    request.into_polygon()
}

pub(crate) fn decode_document_request(body: &[u8]) -> Result<DocumentRequest, SearchError> {
    serde_json::from_slice(body)
        .map_err(|err| SearchError::InvalidInput(format!("email not found in request body: {err}")))
}
