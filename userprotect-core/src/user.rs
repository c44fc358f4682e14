// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::hash::Hash as StdHash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters which are never allowed in a user name.
const ILLEGAL_NAME_CHARS: [char; 8] = ['#', '<', '>', '[', ']', '|', '{', '}'];

/// Stable identifier of a registered account.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize,
)]
pub struct UserId(u64);

impl UserId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<UserId> for u64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(value.parse()?))
    }
}

/// Normalized account name as submitted by administrators.
///
/// Whitespace around the name is trimmed, underscores become spaces, runs of whitespace collapse
/// into one space and the first character is upper-cased. "alice" and " Alice_" are the same
/// user.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    pub fn new(name: &str) -> Result<Self, UserNameError> {
        let mut normalized = String::with_capacity(name.len());
        for c in name.chars() {
            if ILLEGAL_NAME_CHARS.contains(&c) || c.is_control() {
                return Err(UserNameError::IllegalCharacter(c));
            }

            let c = if c == '_' || c.is_whitespace() { ' ' } else { c };
            if c == ' ' && (normalized.is_empty() || normalized.ends_with(' ')) {
                continue;
            }
            normalized.push(c);
        }

        let normalized = normalized.trim_end();
        let mut chars = normalized.chars();
        match chars.next() {
            Some(first) => Ok(Self(first.to_uppercase().chain(chars).collect())),
            None => Err(UserNameError::Empty),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserName {
    type Err = UserNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    #[error("user name is empty")]
    Empty,

    #[error("user name contains illegal character {0:?}")]
    IllegalCharacter(char),
}

#[cfg(test)]
mod tests {
    use super::{UserName, UserNameError};

    #[test]
    fn normalize_user_names() {
        assert_eq!(UserName::new("alice").unwrap().as_str(), "Alice");
        assert_eq!(UserName::new(" Alice_ ").unwrap(), UserName::new("alice").unwrap());
        assert_eq!(
            UserName::new("mary__jane  doe").unwrap().as_str(),
            "Mary jane doe"
        );
        assert_eq!(UserName::new(" _ "), Err(UserNameError::Empty));
        assert_eq!(
            UserName::new("bob{1}"),
            Err(UserNameError::IllegalCharacter('{'))
        );
    }
}
