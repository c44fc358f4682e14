// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

use sqlx::{QueryBuilder, Sqlite, query};
use userprotect_core::{Namespace, OverrideRow, PageId, RightType, Subject, TitleKey, UserId};

use crate::overrides::OverrideStore;
use crate::overrides::models::{PageOverrideRow, TitleOverrideRow};
use crate::sqlite::{SqliteError, SqliteStore};

/// Maximum number of rows per `INSERT` statement, keeps us below SQLite's limit of bound
/// variables per statement.
const INSERT_CHUNK_SIZE: usize = 100;

/// Starts a `SELECT` on the table of the given subject, filtered by that subject.
fn select_query<'args>(subject: &Subject) -> QueryBuilder<'args, Sqlite> {
    match subject {
        Subject::ExistingPage { id } => {
            let mut builder = QueryBuilder::new(
                "
                SELECT
                    page_id,
                    right_type,
                    user_id,
                    added,
                    timestamp
                FROM
                    user_protect_rights
                WHERE
                    page_id = ",
            );
            builder.push_bind(id.to_string());
            builder
        }
        Subject::PendingTitle { namespace, title } => {
            let mut builder = QueryBuilder::new(
                "
                SELECT
                    namespace,
                    title,
                    right_type,
                    user_id,
                    added,
                    timestamp
                FROM
                    user_protect_titles
                WHERE
                    namespace = ",
            );
            builder
                .push_bind(namespace.get())
                .push(" AND title = ")
                .push_bind(title.to_string());
            builder
        }
    }
}

fn push_right_types(builder: &mut QueryBuilder<'_, Sqlite>, right_types: &BTreeSet<RightType>) {
    if right_types.is_empty() {
        builder.push(" AND 0");
        return;
    }

    builder.push(" AND right_type IN (");
    let mut separated = builder.separated(", ");
    for right_type in right_types {
        separated.push_bind(right_type.to_string());
    }
    separated.push_unseparated(")");
}

async fn fetch_rows(
    subject: &Subject,
    mut builder: QueryBuilder<'_, Sqlite>,
    pool: &sqlx::SqlitePool,
) -> Result<Vec<OverrideRow>, SqliteError> {
    builder.push(" ORDER BY rowid");

    match subject {
        Subject::ExistingPage { .. } => builder
            .build_query_as::<PageOverrideRow>()
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(OverrideRow::try_from)
            .collect(),
        Subject::PendingTitle { .. } => builder
            .build_query_as::<TitleOverrideRow>()
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(OverrideRow::try_from)
            .collect(),
    }
}

impl<'a> OverrideStore for SqliteStore<'a> {
    type Error = SqliteError;

    async fn overrides_for_user(
        &self,
        subject: &Subject,
        user_id: UserId,
        right_types: &BTreeSet<RightType>,
    ) -> Result<Vec<OverrideRow>, Self::Error> {
        self.execute(async |pool| {
            let mut builder = select_query(subject);
            builder.push(" AND user_id = ").push_bind(user_id.to_string());
            push_right_types(&mut builder, right_types);
            fetch_rows(subject, builder, pool).await
        })
        .await
    }

    async fn overrides_for_subject(
        &self,
        subject: &Subject,
        right_types: &BTreeSet<RightType>,
    ) -> Result<Vec<OverrideRow>, Self::Error> {
        self.execute(async |pool| {
            let mut builder = select_query(subject);
            push_right_types(&mut builder, right_types);
            fetch_rows(subject, builder, pool).await
        })
        .await
    }

    async fn delete_overrides(&self, subject: &Subject) -> Result<u64, Self::Error> {
        let result = self
            .tx(async |tx| {
                let statement = match subject {
                    Subject::ExistingPage { id } => query(
                        "
                        DELETE FROM
                            user_protect_rights
                        WHERE
                            page_id = ?
                        ",
                    )
                    .bind(id.to_string()),
                    Subject::PendingTitle { namespace, title } => query(
                        "
                        DELETE FROM
                            user_protect_titles
                        WHERE
                            namespace = ?
                            AND title = ?
                        ",
                    )
                    .bind(namespace.get())
                    .bind(title.to_string()),
                };

                statement
                    .execute(&mut **tx)
                    .await
                    .map_err(SqliteError::Sqlite)
            })
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_overrides(&self, rows: &[OverrideRow]) -> Result<u64, Self::Error> {
        let page_rows: Vec<(PageId, &OverrideRow)> = rows
            .iter()
            .filter_map(|row| match &row.subject {
                Subject::ExistingPage { id } => Some((*id, row)),
                Subject::PendingTitle { .. } => None,
            })
            .collect();

        let title_rows: Vec<(Namespace, &TitleKey, &OverrideRow)> = rows
            .iter()
            .filter_map(|row| match &row.subject {
                Subject::ExistingPage { .. } => None,
                Subject::PendingTitle { namespace, title } => Some((*namespace, title, row)),
            })
            .collect();

        self.tx(async |tx| {
            let mut inserted = 0;

            for chunk in page_rows.chunks(INSERT_CHUNK_SIZE) {
                let mut builder = QueryBuilder::<Sqlite>::new(
                    "
                    INSERT INTO
                        user_protect_rights (
                            page_id,
                            right_type,
                            user_id,
                            added,
                            timestamp
                        )
                    ",
                );
                builder.push_values(chunk, |mut values, (id, row)| {
                    values
                        .push_bind(id.to_string())
                        .push_bind(row.right_type.to_string())
                        .push_bind(row.user_id.to_string())
                        .push_bind(row.direction.is_added())
                        .push_bind(row.timestamp.to_string());
                });
                inserted += builder.build().execute(&mut **tx).await?.rows_affected();
            }

            for chunk in title_rows.chunks(INSERT_CHUNK_SIZE) {
                let mut builder = QueryBuilder::<Sqlite>::new(
                    "
                    INSERT INTO
                        user_protect_titles (
                            namespace,
                            title,
                            right_type,
                            user_id,
                            added,
                            timestamp
                        )
                    ",
                );
                builder.push_values(chunk, |mut values, (namespace, title, row)| {
                    values
                        .push_bind(namespace.get())
                        .push_bind(title.to_string())
                        .push_bind(row.right_type.to_string())
                        .push_bind(row.user_id.to_string())
                        .push_bind(row.direction.is_added())
                        .push_bind(row.timestamp.to_string());
                });
                inserted += builder.build().execute(&mut **tx).await?.rows_affected();
            }

            Ok(inserted)
        })
        .await
    }
}
