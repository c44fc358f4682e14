// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::hash::Hash as StdHash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stored right type meaning "every currently applicable right".
pub const WILDCARD: &str = "all";

/// Name of a single permission, for example `edit` or `createpage`.
///
/// The wildcard value `all` is reserved and can not be used as a right name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RightName(String);

impl RightName {
    pub fn new(name: &str) -> Result<Self, RightError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(RightError::Empty);
        }

        if name == WILDCARD {
            return Err(RightError::Reserved);
        }

        if let Some(c) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(RightError::IllegalCharacter(c));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RightName {
    type Err = RightError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for RightName {
    type Error = RightError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RightName> for String {
    fn from(value: RightName) -> Self {
        value.0
    }
}

impl Display for RightName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Right type of a stored override: either a single named right or the wildcard.
///
/// The wildcard is expanded into the applicable rights of a subject whenever overrides are
/// resolved, it is never part of an applicable type set itself.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RightType {
    All,
    Named(RightName),
}

impl RightType {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, RightType::All)
    }

    /// Returns the right name if this is not the wildcard.
    pub fn name(&self) -> Option<&RightName> {
        match self {
            RightType::All => None,
            RightType::Named(name) => Some(name),
        }
    }
}

impl From<RightName> for RightType {
    fn from(name: RightName) -> Self {
        RightType::Named(name)
    }
}

impl FromStr for RightType {
    type Err = RightError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim() == WILDCARD {
            return Ok(RightType::All);
        }
        Ok(RightType::Named(RightName::new(value)?))
    }
}

impl TryFrom<String> for RightType {
    type Error = RightError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RightType> for String {
    fn from(value: RightType) -> Self {
        value.to_string()
    }
}

impl Display for RightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RightType::All => write!(f, "{WILDCARD}"),
            RightType::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Direction of an override.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize,
)]
pub enum Direction {
    /// The right is taken away from the user, even if their groups grant it.
    Removed,

    /// The right is granted to the user, even if none of their groups grant it.
    Added,
}

impl Direction {
    /// Storage flag, `true` for added rights.
    pub fn is_added(&self) -> bool {
        matches!(self, Direction::Added)
    }
}

impl From<bool> for Direction {
    fn from(added: bool) -> Self {
        if added {
            Direction::Added
        } else {
            Direction::Removed
        }
    }
}

impl From<Direction> for bool {
    fn from(direction: Direction) -> Self {
        direction.is_added()
    }
}

impl TryFrom<i64> for Direction {
    type Error = DirectionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Removed),
            1 => Ok(Direction::Added),
            _ => Err(DirectionError::Unknown(value)),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::Removed => "removed",
            Direction::Added => "added",
        };

        write!(f, "{}", s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RightError {
    #[error("right name is empty")]
    Empty,

    #[error("'all' is reserved for the wildcard right type")]
    Reserved,

    #[error("right name contains illegal character {0:?}")]
    IllegalCharacter(char),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectionError {
    #[error("unknown override direction {0}")]
    Unknown(i64),
}

#[cfg(test)]
mod tests {
    use super::{Direction, RightError, RightName, RightType};

    #[test]
    fn parse_right_types() {
        assert_eq!("all".parse::<RightType>(), Ok(RightType::All));
        assert_eq!(
            "edit".parse::<RightType>(),
            Ok(RightType::Named(RightName::new("edit").unwrap()))
        );
        assert_eq!("".parse::<RightType>(), Err(RightError::Empty));
        assert_eq!(
            "create page".parse::<RightType>(),
            Err(RightError::IllegalCharacter(' '))
        );
        assert_eq!(RightName::new("all"), Err(RightError::Reserved));
    }

    #[test]
    fn wildcard_sorts_first() {
        let edit = RightType::Named(RightName::new("edit").unwrap());
        assert!(RightType::All < edit);
        assert!(RightType::All.is_wildcard());
        assert_eq!(edit.name().map(|name| name.as_str()), Some("edit"));
        assert_eq!(RightType::All.to_string(), "all");
    }

    #[test]
    fn serde_as_plain_strings() {
        let json = serde_json::to_string(&vec![
            RightType::All,
            RightType::Named(RightName::new("move").unwrap()),
        ])
        .unwrap();
        assert_eq!(json, r#"["all","move"]"#);

        let parsed: Vec<RightType> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0], RightType::All);
    }

    #[test]
    fn direction_flags() {
        assert_eq!(Direction::from(true), Direction::Added);
        assert_eq!(Direction::try_from(0), Ok(Direction::Removed));
        assert!(Direction::try_from(2).is_err());
        assert!(!bool::from(Direction::Removed));
    }
}
