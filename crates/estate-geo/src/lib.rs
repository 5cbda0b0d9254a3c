use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Axis-aligned rectangle. `top_left` holds the minimum latitude and
/// longitude, `bottom_right` the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: Coordinate,
    pub bottom_right: Coordinate,
}

impl BoundingBox {
    /// Inclusive on every edge.
    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.latitude >= self.top_left.latitude
            && coord.latitude <= self.bottom_right.latitude
            && coord.longitude >= self.top_left.longitude
            && coord.longitude <= self.bottom_right.longitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoError {
    EmptyPolygon,
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPolygon => write!(f, "polygon has no vertices"),
        }
    }
}

impl std::error::Error for GeoError {}

/// Closed ring of vertices; the last vertex connects back to the first.
///
/// Always holds at least one vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct Polygon {
    vertices: Vec<Coordinate>,
}

impl Polygon {
    pub fn new(vertices: Vec<Coordinate>) -> Result<Self, GeoError> {
        if vertices.is_empty() {
            return Err(GeoError::EmptyPolygon);
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let first = self.vertices[0];
        let mut bbox = BoundingBox {
            top_left: first,
            bottom_right: first,
        };
        for vertex in &self.vertices[1..] {
            bbox.top_left.latitude = bbox.top_left.latitude.min(vertex.latitude);
            bbox.top_left.longitude = bbox.top_left.longitude.min(vertex.longitude);
            bbox.bottom_right.latitude = bbox.bottom_right.latitude.max(vertex.latitude);
            bbox.bottom_right.longitude = bbox.bottom_right.longitude.max(vertex.longitude);
        }
        bbox
    }

    /// Even-odd ray casting with the ray running toward increasing longitude.
    ///
    /// Each edge owns the half-open latitude span `[min, max)`, and a crossing
    /// only counts when it lies strictly east of `point`. Rings with fewer than
    /// three vertices enclose nothing.
    pub fn contains(&self, point: Coordinate) -> bool {
        let vertices = &self.vertices;
        if vertices.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut prev = vertices[vertices.len() - 1];
        for &current in vertices {
            if (current.latitude > point.latitude) != (prev.latitude > point.latitude) {
                let crossing = current.longitude
                    + (point.latitude - current.latitude) * (prev.longitude - current.longitude)
                        / (prev.latitude - current.latitude);
                if point.longitude < crossing {
                    inside = !inside;
                }
            }
            prev = current;
        }
        inside
    }
}

impl TryFrom<Vec<Coordinate>> for Polygon {
    type Error = GeoError;

    fn try_from(vertices: Vec<Coordinate>) -> Result<Self, Self::Error> {
        Self::new(vertices)
    }
}

impl From<Polygon> for Vec<Coordinate> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}
