//! Route identity shared by every source table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ParseError;

/// Direction of travel along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `ida`
    Outbound,
    /// `volta`
    Return,
}

impl Direction {
    /// Parses the direction codes used across sources: `0`/`ida` for outbound
    /// and `1`/`volta` for return. Empty input means "no direction".
    pub fn parse_code(raw: &str) -> Result<Option<Self>, ParseError> {
        match raw.trim() {
            "" => Ok(None),
            "0" | "ida" | "Ida" | "IDA" => Ok(Some(Direction::Outbound)),
            "1" | "volta" | "Volta" | "VOLTA" => Ok(Some(Direction::Return)),
            other => Err(ParseError::Direction(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Outbound => "ida",
            Direction::Return => "volta",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Join key for every per-route table: a route id and, optionally, a direction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub route: String,
    pub direction: Option<Direction>,
}

impl RouteKey {
    pub fn new(route: impl AsRef<str>, direction: Option<Direction>) -> Self {
        Self {
            route: route.as_ref().trim().to_string(),
            direction,
        }
    }

    pub fn route(route: impl AsRef<str>) -> Self {
        Self::new(route, None)
    }

    /// The same route without its direction.
    pub fn without_direction(&self) -> Self {
        Self {
            route: self.route.clone(),
            direction: None,
        }
    }

    /// Label written in the `sentido` output column.
    pub fn direction_label(&self) -> &'static str {
        self.direction.as_ref().map(Direction::label).unwrap_or("")
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(d) => write!(f, "{} ({})", self.route, d),
            None => f.write_str(&self.route),
        }
    }
}
