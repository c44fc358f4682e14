// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;

use userprotect_core::{Subject, UserId};

use crate::resolver::ResolvedOverride;

/// Request-scoped cache of resolved overrides.
///
/// One session is created per inbound request and dropped when the request is done. It is never
/// shared between requests, resolutions done in one session are invisible to all others.
#[derive(Clone, Debug, Default)]
pub struct Session {
    resolved: BTreeMap<Subject, BTreeMap<UserId, ResolvedOverride>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: &Subject, user_id: UserId) -> Option<&ResolvedOverride> {
        self.resolved
            .get(subject)
            .and_then(|users| users.get(&user_id))
    }

    pub(crate) fn insert(
        &mut self,
        subject: &Subject,
        user_id: UserId,
        resolved: ResolvedOverride,
    ) {
        self.resolved
            .entry(subject.clone())
            .or_default()
            .insert(user_id, resolved);
    }

    /// Drops all cached resolutions of a subject, for every user.
    pub fn invalidate_subject(&mut self, subject: &Subject) {
        self.resolved.remove(subject);
    }

    /// Number of cached (subject, user) resolutions.
    pub fn len(&self) -> usize {
        self.resolved.values().map(|users| users.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
