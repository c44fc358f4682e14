// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{Direction, RightType, Subject, Timestamp, UserId};

/// A single stored override.
///
/// Rows are only ever created by replacing the full override set of a subject. They are never
/// updated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRow {
    pub subject: Subject,
    pub right_type: RightType,
    pub user_id: UserId,
    pub direction: Direction,
    pub timestamp: Timestamp,
}

impl OverrideRow {
    pub fn new(
        subject: Subject,
        right_type: RightType,
        user_id: UserId,
        direction: Direction,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            subject,
            right_type,
            user_id,
            direction,
            timestamp,
        }
    }
}
