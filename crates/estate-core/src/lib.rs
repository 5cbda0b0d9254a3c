pub mod domain;
pub mod error;
pub mod ids;

pub use domain::Estate;
pub use error::{ErrorCode, EstateError, EstateResult};
pub use ids::{EstateId, ParseEstateIdError};
