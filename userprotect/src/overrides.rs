// SPDX-License-Identifier: MIT OR Apache-2.0

//! Override sets as submitted by administrators and as listed for a subject.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use userprotect_core::{Direction, RightName, RightType, UserName};

/// Form field prefix of user names which get a right added.
pub const ADD_FIELD_PREFIX: &str = "add-users-";

/// Form field prefix of user names which get a right removed.
pub const REMOVE_FIELD_PREFIX: &str = "remove-users-";

/// User names to add or remove per right type, including the wildcard bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSet {
    pub removals: BTreeMap<RightType, BTreeSet<UserName>>,
    pub additions: BTreeMap<RightType, BTreeSet<UserName>>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses submitted form fields.
    ///
    /// Fields are named `add-users-<type>` or `remove-users-<type>` and hold one user name per
    /// line. Other fields, blank lines and invalid names are ignored.
    pub fn from_form_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut set = Self::new();

        for (key, value) in fields {
            let (direction, right_type) = if let Some(right) = key.strip_prefix(ADD_FIELD_PREFIX) {
                (Direction::Added, right)
            } else if let Some(right) = key.strip_prefix(REMOVE_FIELD_PREFIX) {
                (Direction::Removed, right)
            } else {
                continue;
            };

            let right_type: RightType = match right_type.parse() {
                Ok(right_type) => right_type,
                Err(err) => {
                    debug!(field = %key, "ignoring form field: {err}");
                    continue;
                }
            };

            for line in value.lines() {
                if line.trim().is_empty() {
                    continue;
                }

                match UserName::new(line) {
                    Ok(name) => set.insert(direction, right_type.clone(), name),
                    Err(err) => debug!(field = %key, "ignoring submitted user name: {err}"),
                }
            }
        }

        set
    }

    /// Renders the set into form fields, one user name per line.
    pub fn to_form_fields(&self) -> BTreeMap<String, String> {
        let render = |prefix: &str, buckets: &BTreeMap<RightType, BTreeSet<UserName>>| {
            buckets
                .iter()
                .map(|(right_type, names)| {
                    let names: Vec<&str> = names.iter().map(UserName::as_str).collect();
                    (format!("{prefix}{right_type}"), names.join("\n"))
                })
                .collect::<Vec<_>>()
        };

        render(ADD_FIELD_PREFIX, &self.additions)
            .into_iter()
            .chain(render(REMOVE_FIELD_PREFIX, &self.removals))
            .collect()
    }

    pub fn add(&mut self, right_type: RightType, name: UserName) {
        self.insert(Direction::Added, right_type, name);
    }

    pub fn remove(&mut self, right_type: RightType, name: UserName) {
        self.insert(Direction::Removed, right_type, name);
    }

    pub fn insert(&mut self, direction: Direction, right_type: RightType, name: UserName) {
        self.buckets_mut(direction)
            .entry(right_type)
            .or_default()
            .insert(name);
    }

    /// User names of one bucket.
    pub fn users(
        &self,
        direction: Direction,
        right_type: &RightType,
    ) -> Option<&BTreeSet<UserName>> {
        self.buckets(direction).get(right_type)
    }

    pub fn is_empty(&self) -> bool {
        self.removals.values().all(BTreeSet::is_empty)
            && self.additions.values().all(BTreeSet::is_empty)
    }

    /// All user names mentioned in any bucket.
    pub fn user_names(&self) -> BTreeSet<UserName> {
        self.removals
            .values()
            .chain(self.additions.values())
            .flatten()
            .cloned()
            .collect()
    }

    /// Iterates over all non-empty buckets.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &RightType, &BTreeSet<UserName>)> {
        self.removals
            .iter()
            .map(|(right_type, names)| (Direction::Removed, right_type, names))
            .chain(
                self.additions
                    .iter()
                    .map(|(right_type, names)| (Direction::Added, right_type, names)),
            )
            .filter(|(_, _, names)| !names.is_empty())
    }

    fn buckets(&self, direction: Direction) -> &BTreeMap<RightType, BTreeSet<UserName>> {
        match direction {
            Direction::Removed => &self.removals,
            Direction::Added => &self.additions,
        }
    }

    fn buckets_mut(
        &mut self,
        direction: Direction,
    ) -> &mut BTreeMap<RightType, BTreeSet<UserName>> {
        match direction {
            Direction::Removed => &mut self.removals,
            Direction::Added => &mut self.additions,
        }
    }

    /// Resolves conflicting buckets and drops right types which are not applicable.
    ///
    /// Precedence, from strongest to weakest: wildcard removal, wildcard addition, removal of a
    /// single right, addition of a single right. A name only ever ends up in the strongest bucket
    /// it was submitted for, per right.
    pub fn normalize(&self, applicable: &BTreeSet<RightName>) -> OverrideSet {
        let empty = BTreeSet::new();
        let bucket = |buckets: &BTreeMap<RightType, BTreeSet<UserName>>, right_type: &RightType| {
            buckets.get(right_type).unwrap_or(&empty).clone()
        };

        let remove_all = bucket(&self.removals, &RightType::All);
        let add_all: BTreeSet<UserName> = bucket(&self.additions, &RightType::All)
            .difference(&remove_all)
            .cloned()
            .collect();

        let mut normalized = OverrideSet::new();
        normalized.extend(Direction::Removed, RightType::All, remove_all.clone());
        normalized.extend(Direction::Added, RightType::All, add_all.clone());

        for right in applicable {
            let right_type = RightType::Named(right.clone());

            let remove: BTreeSet<UserName> = bucket(&self.removals, &right_type)
                .into_iter()
                .filter(|name| !remove_all.contains(name) && !add_all.contains(name))
                .collect();

            let add: BTreeSet<UserName> = bucket(&self.additions, &right_type)
                .into_iter()
                .filter(|name| {
                    !add_all.contains(name) && !remove_all.contains(name) && !remove.contains(name)
                })
                .collect();

            normalized.extend(Direction::Removed, right_type.clone(), remove);
            normalized.extend(Direction::Added, right_type, add);
        }

        normalized
    }

    fn extend(&mut self, direction: Direction, right_type: RightType, names: BTreeSet<UserName>) {
        if names.is_empty() {
            return;
        }
        self.buckets_mut(direction)
            .entry(right_type)
            .or_default()
            .extend(names);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use userprotect_core::{Direction, RightName, RightType, UserName};

    use super::OverrideSet;

    fn names(values: &[&str]) -> BTreeSet<RightName> {
        values.iter().map(|value| value.parse().unwrap()).collect()
    }

    fn users(values: &[&str]) -> BTreeSet<UserName> {
        values.iter().map(|value| UserName::new(value).unwrap()).collect()
    }

    fn right(value: &str) -> RightType {
        value.parse().unwrap()
    }

    fn user(value: &str) -> UserName {
        UserName::new(value).unwrap()
    }

    #[test]
    fn wildcard_removal_wins_over_single_addition() {
        let mut set = OverrideSet::new();
        set.remove(RightType::All, user("alice"));
        set.add(right("edit"), user("alice"));

        let normalized = set.normalize(&names(&["edit", "move"]));
        assert_eq!(
            normalized.users(Direction::Removed, &RightType::All),
            Some(&users(&["alice"]))
        );
        assert_eq!(normalized.users(Direction::Added, &right("edit")), None);
    }

    #[test]
    fn wildcard_addition_wins_over_single_removal() {
        let mut set = OverrideSet::new();
        set.add(RightType::All, user("bob"));
        set.remove(right("edit"), user("bob"));

        let normalized = set.normalize(&names(&["edit", "move"]));
        assert_eq!(
            normalized.users(Direction::Added, &RightType::All),
            Some(&users(&["bob"]))
        );
        assert_eq!(normalized.users(Direction::Removed, &right("edit")), None);
    }

    #[test]
    fn wildcard_removal_wins_over_wildcard_addition() {
        let mut set = OverrideSet::new();
        set.add(RightType::All, user("carol"));
        set.remove(RightType::All, user("carol"));

        let normalized = set.normalize(&names(&["edit"]));
        assert_eq!(normalized.users(Direction::Added, &RightType::All), None);
        assert_eq!(
            normalized.users(Direction::Removed, &RightType::All),
            Some(&users(&["carol"]))
        );
    }

    #[test]
    fn single_removal_wins_over_single_addition() {
        let mut set = OverrideSet::new();
        set.add(right("edit"), user("dave"));
        set.remove(right("edit"), user("dave"));
        set.add(right("move"), user("dave"));

        let normalized = set.normalize(&names(&["edit", "move"]));
        assert_eq!(
            normalized.users(Direction::Removed, &right("edit")),
            Some(&users(&["dave"]))
        );
        assert_eq!(normalized.users(Direction::Added, &right("edit")), None);
        assert_eq!(
            normalized.users(Direction::Added, &right("move")),
            Some(&users(&["dave"]))
        );
    }

    #[test]
    fn drop_inapplicable_rights() {
        let mut set = OverrideSet::new();
        set.add(right("createpage"), user("erin"));
        set.add(right("edit"), user("erin"));

        let normalized = set.normalize(&names(&["edit"]));
        assert_eq!(normalized.iter().count(), 1);
        assert_eq!(normalized.users(Direction::Added, &right("createpage")), None);
    }

    #[test]
    fn parse_form_fields() {
        let set = OverrideSet::from_form_fields([
            ("add-users-edit", "alice\r\n\r\nbob_smith\r\n"),
            ("remove-users-all", "carol"),
            ("remove-users-move", "  \r\nDave|"),
            ("add-users-bad right", "erin"),
            ("wpEditToken", "abc"),
        ]);

        assert_eq!(
            set.users(Direction::Added, &right("edit")),
            Some(&users(&["Alice", "Bob smith"]))
        );
        assert_eq!(
            set.users(Direction::Removed, &RightType::All),
            Some(&users(&["Carol"]))
        );

        // Invalid names are dropped, the bucket stays empty.
        assert!(set.users(Direction::Removed, &right("move")).is_none());
        assert_eq!(set.user_names(), users(&["alice", "bob smith", "carol"]));
    }

    #[test]
    fn render_form_fields() {
        let mut set = OverrideSet::new();
        set.add(right("edit"), user("alice"));
        set.add(right("edit"), user("bob"));
        set.remove(RightType::All, user("carol"));

        let fields = set.to_form_fields();
        assert_eq!(fields.get("add-users-edit").map(String::as_str), Some("Alice\nBob"));
        assert_eq!(fields.get("remove-users-all").map(String::as_str), Some("Carol"));

        let parsed =
            OverrideSet::from_form_fields(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        assert_eq!(parsed, set);
    }
}
