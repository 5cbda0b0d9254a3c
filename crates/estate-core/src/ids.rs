use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary key of an estate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EstateId(i64);

impl EstateId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EstateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEstateIdError {
    input: String,
}

impl fmt::Display for ParseEstateIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid estate id {:?}", self.input)
    }
}

impl std::error::Error for ParseEstateIdError {}

impl FromStr for EstateId {
    type Err = ParseEstateIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.parse::<i64>() {
            Ok(id) if id >= 0 => Ok(Self(id)),
            _ => Err(ParseEstateIdError {
                input: value.to_string(),
            }),
        }
    }
}
