// SPDX-License-Identifier: MIT OR Apache-2.0

use sqlx::FromRow;
use userprotect_core::{OverrideRow, PageId, RightType, Subject, Timestamp, UserId};

use crate::sqlite::{DecodeError, SqliteError};

/// A single override row of an existing page as it is stored in the database.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageOverrideRow {
    page_id: String,
    right_type: String,
    user_id: String,
    added: bool,
    timestamp: String,
}

/// A single override row of a pending title as it is stored in the database.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub(crate) struct TitleOverrideRow {
    namespace: i32,
    title: String,
    right_type: String,
    user_id: String,
    added: bool,
    timestamp: String,
}

fn decode_common(
    right_type: &str,
    user_id: &str,
    timestamp: &str,
) -> Result<(RightType, UserId, Timestamp), SqliteError> {
    let right_type: RightType = right_type
        .parse()
        .map_err(|err| SqliteError::Decode("right_type".into(), DecodeError::Right(err)))?;
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| SqliteError::Decode("user_id".into(), DecodeError::FromStr))?;
    let timestamp: Timestamp = timestamp
        .parse()
        .map_err(|_| SqliteError::Decode("timestamp".into(), DecodeError::FromStr))?;
    Ok((right_type, user_id, timestamp))
}

impl TryFrom<PageOverrideRow> for OverrideRow {
    type Error = SqliteError;

    fn try_from(row: PageOverrideRow) -> Result<Self, Self::Error> {
        let id: PageId = row
            .page_id
            .parse()
            .map_err(|err| SqliteError::Decode("page_id".into(), DecodeError::Subject(err)))?;
        let (right_type, user_id, timestamp) =
            decode_common(&row.right_type, &row.user_id, &row.timestamp)?;

        Ok(OverrideRow::new(
            Subject::page(id),
            right_type,
            user_id,
            row.added.into(),
            timestamp,
        ))
    }
}

impl TryFrom<TitleOverrideRow> for OverrideRow {
    type Error = SqliteError;

    fn try_from(row: TitleOverrideRow) -> Result<Self, Self::Error> {
        let subject = Subject::pending_title(row.namespace, &row.title)
            .map_err(|err| SqliteError::Decode("title".into(), DecodeError::Subject(err)))?;
        let (right_type, user_id, timestamp) =
            decode_common(&row.right_type, &row.user_id, &row.timestamp)?;

        Ok(OverrideRow::new(
            subject,
            right_type,
            user_id,
            row.added.into(),
            timestamp,
        ))
    }
}
