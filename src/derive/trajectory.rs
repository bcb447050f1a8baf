//! Route and direction from a trajectory description such as
//! `"1702 - Sentido Mangues (ida)"`.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ParseError;
use crate::route::{Direction, RouteKey};

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?P<route>\S.*?)\s+-\s+.*\((?P<dir>ida|volta)\)\s*$")
            .expect("trajectory pattern is a valid regex")
    })
}

pub fn parse_trajectory(description: &str) -> Result<RouteKey, ParseError> {
    let caps = pattern()
        .captures(description)
        .ok_or_else(|| ParseError::Trajectory(description.to_string()))?;

    let direction = match &caps["dir"] {
        "ida" => Direction::Outbound,
        _ => Direction::Return,
    };
    Ok(RouteKey::new(&caps["route"], Some(direction)))
}
