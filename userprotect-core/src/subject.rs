// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::hash::Hash as StdHash;
use std::num::{NonZeroU64, ParseIntError};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a title key in bytes.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Characters which are never allowed in a title.
const ILLEGAL_TITLE_CHARS: [char; 8] = ['#', '<', '>', '[', ']', '|', '{', '}'];

/// Immutable numeric identifier of an existing page.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize,
)]
pub struct PageId(NonZeroU64);

impl PageId {
    pub fn new(value: u64) -> Result<Self, SubjectError> {
        NonZeroU64::new(value)
            .map(Self)
            .ok_or(SubjectError::InvalidPageId)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for PageId {
    type Error = SubjectError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageId> for u64 {
    fn from(value: PageId) -> Self {
        value.get()
    }
}

impl Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageId {
    type Err = SubjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value: u64 = value.parse()?;
        Self::new(value)
    }
}

/// Namespace number of a title.
///
/// Only content namespaces (zero or positive) can hold pages, virtual namespaces with negative
/// numbers are rejected.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub struct Namespace(i32);

impl Namespace {
    pub const MAIN: Namespace = Namespace(0);

    pub fn new(value: i32) -> Result<Self, SubjectError> {
        if value < 0 {
            return Err(SubjectError::VirtualNamespace(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Namespace {
    type Error = SubjectError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for i32 {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized title key of a page which does not exist yet.
///
/// Normalization follows the database-key form of a title: surrounding whitespace is trimmed,
/// spaces become underscores, runs of underscores collapse into one, leading and trailing
/// underscores are stripped and the first character is upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TitleKey(String);

impl TitleKey {
    pub fn new(title: &str) -> Result<Self, SubjectError> {
        let mut key = String::with_capacity(title.len());
        for c in title.trim().chars() {
            if ILLEGAL_TITLE_CHARS.contains(&c) || c.is_control() {
                return Err(SubjectError::IllegalCharacter(c));
            }

            let c = if c.is_whitespace() { '_' } else { c };
            if c == '_' && (key.is_empty() || key.ends_with('_')) {
                continue;
            }
            key.push(c);
        }

        while key.ends_with('_') {
            key.pop();
        }

        if key.is_empty() {
            return Err(SubjectError::EmptyTitle);
        }

        let mut chars = key.chars();
        let key = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => key,
        };

        if key.len() > MAX_TITLE_LENGTH {
            return Err(SubjectError::TitleTooLong(key.len(), MAX_TITLE_LENGTH));
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TitleKey {
    type Error = SubjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TitleKey> for String {
    fn from(value: TitleKey) -> Self {
        value.0
    }
}

impl Display for TitleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The existing page or pending title overrides apply to.
///
/// Existing pages and pending titles are kept in separate tables, this makes the cleanup rules
/// explicit: deleting a page drops its `ExistingPage` overrides, creating a page from a pending
/// title drops the `PendingTitle` overrides of that namespace and title.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
pub enum Subject {
    ExistingPage { id: PageId },
    PendingTitle { namespace: Namespace, title: TitleKey },
}

impl Subject {
    /// Subject for an existing page.
    pub fn page(id: PageId) -> Self {
        Self::ExistingPage { id }
    }

    /// Subject for a title which does not exist yet, validating and normalizing raw input.
    pub fn pending_title(namespace: i32, title: &str) -> Result<Self, SubjectError> {
        Ok(Self::PendingTitle {
            namespace: Namespace::new(namespace)?,
            title: TitleKey::new(title)?,
        })
    }

    /// Returns `true` if this subject is an existing page.
    pub fn exists(&self) -> bool {
        matches!(self, Self::ExistingPage { .. })
    }
}

impl From<PageId> for Subject {
    fn from(id: PageId) -> Self {
        Self::page(id)
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::ExistingPage { id } => write!(f, "page:{id}"),
            Subject::PendingTitle { namespace, title } => write!(f, "title:{namespace}:{title}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubjectError {
    #[error("page id must be a positive integer")]
    InvalidPageId,

    #[error("could not parse page id: {0}")]
    ParsePageId(#[from] ParseIntError),

    #[error("namespace {0} can not hold pages")]
    VirtualNamespace(i32),

    #[error("title is empty")]
    EmptyTitle,

    #[error("title contains illegal character {0:?}")]
    IllegalCharacter(char),

    #[error("title has {0} bytes, maximum is {1}")]
    TitleTooLong(usize, usize),
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{PageId, Subject, SubjectError, TitleKey};

    #[test]
    fn normalize_title_key() {
        assert_eq!(TitleKey::new("main page").unwrap().as_str(), "Main_page");
        assert_eq!(TitleKey::new("  Foo   bar_ ").unwrap().as_str(), "Foo_bar");
        assert_eq!(TitleKey::new("__über__alles").unwrap().as_str(), "Über_alles");
        assert_eq!(TitleKey::new("Already_Normal").unwrap().as_str(), "Already_Normal");
    }

    #[test]
    fn reject_invalid_subjects() {
        assert_eq!(PageId::new(0), Err(SubjectError::InvalidPageId));
        assert_eq!(
            Subject::pending_title(-1, "Special"),
            Err(SubjectError::VirtualNamespace(-1))
        );
        assert_eq!(
            Subject::pending_title(0, "   "),
            Err(SubjectError::EmptyTitle)
        );
        assert_eq!(
            Subject::pending_title(0, "a|b"),
            Err(SubjectError::IllegalCharacter('|'))
        );
        assert!(matches!(
            Subject::pending_title(0, &"x".repeat(256)),
            Err(SubjectError::TitleTooLong(256, 255))
        ));
        assert!(matches!(
            "abc".parse::<PageId>(),
            Err(SubjectError::ParsePageId(_))
        ));
    }

    #[test]
    fn equality_per_variant() {
        let page = Subject::page(PageId::new(42).unwrap());
        let title = Subject::pending_title(0, "42").unwrap();
        let same_title = Subject::pending_title(0, " 42 ").unwrap();
        let other_namespace = Subject::pending_title(1, "42").unwrap();

        assert!(page.exists());
        assert!(!title.exists());
        assert_ne!(page, title);
        assert_eq!(title, same_title);
        assert_ne!(title, other_namespace);

        let set = HashSet::from([page, title, same_title, other_namespace]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn deserialize_validates_subjects() {
        let subject: Subject =
            serde_json::from_str(r#"{"PendingTitle":{"namespace":2,"title":"user page"}}"#)
                .unwrap();
        assert_eq!(subject, Subject::pending_title(2, "User_page").unwrap());

        let virtual_namespace = r#"{"PendingTitle":{"namespace":-1,"title":"Special"}}"#;
        assert!(serde_json::from_str::<Subject>(virtual_namespace).is_err());

        let illegal_title = r#"{"PendingTitle":{"namespace":0,"title":"a|b"}}"#;
        assert!(serde_json::from_str::<Subject>(illegal_title).is_err());

        assert!(serde_json::from_str::<Subject>(r#"{"ExistingPage":{"id":0}}"#).is_err());
    }

    #[test]
    fn display() {
        let page = Subject::page(PageId::new(7).unwrap());
        let title = Subject::pending_title(2, "user page").unwrap();
        assert_eq!(page.to_string(), "page:7");
        assert_eq!(title.to_string(), "title:2:User_page");
    }
}
