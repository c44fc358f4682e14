// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistent storage.
use std::sync::Arc;

use sqlx::migrate::{MigrateDatabase, Migrator};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, migrate};
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use userprotect_core::{RightError, SubjectError};

use crate::traits::{TransactionPermit, TransactionSlot};

/// Creates the SQLite database holding the override tables if it doesn't exist yet.
pub async fn create_database(url: &str) -> Result<(), SqliteError> {
    if !Sqlite::database_exists(url).await? {
        Sqlite::create_database(url).await?
    }
    Ok(())
}

/// Brings the override tables up to the latest schema.
pub async fn run_pending_migrations(pool: &sqlx::SqlitePool) -> Result<(), SqliteError> {
    let migrator: Migrator = migrate!();
    migrator.run(pool).await?;
    Ok(())
}

/// Connects to the override database, creating it if needed.
pub struct SqliteStoreBuilder {
    url: String,
    max_connections: u32,
    run_migrations: bool,
}

impl Default for SqliteStoreBuilder {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".into(),
            // Every connection to an in-memory database opens a database of its own.
            max_connections: 1,
            run_migrations: true,
        }
    }
}

impl SqliteStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn random_memory_url(mut self) -> Self {
        // Tests running in parallel would otherwise share one in-memory database, see
        // https://github.com/launchbadge/sqlx/issues/2510
        self.url = format!(
            "sqlite://dbmem{}?mode=memory&cache=private",
            rand::random::<u32>()
        );
        self
    }

    pub fn database_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn run_default_migrations(mut self, run_migrations: bool) -> Self {
        self.run_migrations = run_migrations;
        self
    }

    pub async fn build<'a>(self) -> Result<SqliteStore<'a>, SqliteError> {
        create_database(&self.url).await?;

        let pool: sqlx::SqlitePool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await?;

        if self.run_migrations {
            run_pending_migrations(&pool).await?;
        }

        Ok(SqliteStore::new(pool))
    }
}

pub type Transaction<'a> = sqlx::Transaction<'a, Sqlite>;

/// Connection slot holding the uncommitted transaction of the running override save.
type TransactionCell<'a> = Arc<Mutex<Option<Transaction<'a>>>>;

impl TransactionSlot for TransactionCell<'_> {
    fn discard(&self) {
        // The lock is free unless the save was cancelled in the middle of a query. `begin` rolls
        // back whatever is left over in that case.
        if let Ok(mut tx_ref) = self.try_lock() {
            // Dropping an open sqlx transaction rolls it back and returns the connection.
            tx_ref.take();
        }
    }
}

/// Override store in a SQLite database.
///
/// Clones share the connection pool and the transaction of the currently running save.
///
/// SQLite serializes writing transactions, so saves of overrides (and the cleanups when pages get
/// created or deleted) run one after another, also when they concern different subjects. A save
/// holds a `TransactionPermit` from `begin` until it committed or rolled back. Resolutions never
/// need a transaction and read the committed state through the pool with `execute`.
///
/// ```text
/// Save I (page 42):
/// begin --> delete --> insert --> commit
///
///                                        Save II (page 7):
///                                        begin --> delete --> insert --> commit
///
/// Resolution (any page):
///    --> read --> read --> read --> read --> read -->
/// ```
///
/// Reads running in parallel to a save see the override set from before the save until it got
/// committed, never the intermediate state after the delete.
#[derive(Clone, Debug)]
pub struct SqliteStore<'a> {
    tx: TransactionCell<'a>,
    pool: sqlx::SqlitePool,
    semaphore: Arc<Semaphore>,
}

impl<'a> SqliteStore<'a> {
    pub(crate) fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            tx: Arc::default(),
            pool,
            // One writing transaction at a time, matching what SQLite allows.
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// In-memory database with a random name and a single connection, for tests.
    #[cfg(any(test, feature = "test_utils"))]
    pub async fn temporary() -> Self {
        SqliteStoreBuilder::new()
            .random_memory_url()
            .max_connections(1)
            .build()
            .await
            .expect("migrations succeeded")
    }

    /// Runs statements inside the transaction of the current save.
    ///
    /// Fails with `TransactionMissing` when `begin` was not called before. A failing statement
    /// leaves the transaction open, the caller decides about rolling it back.
    pub async fn tx<F, R>(&self, f: F) -> Result<R, SqliteError>
    where
        F: AsyncFnOnce(&mut Transaction<'a>) -> Result<R, SqliteError>,
    {
        let mut tx_ref = self.tx.lock().await;
        let tx = tx_ref.as_mut().ok_or(SqliteError::TransactionMissing)?;

        f(tx).await
    }

    /// Runs queries against committed state, outside of any transaction.
    pub async fn execute<F, R>(&self, f: F) -> Result<R, SqliteError>
    where
        F: AsyncFnOnce(&sqlx::SqlitePool) -> Result<R, SqliteError>,
    {
        f(&self.pool).await
    }
}

impl<'a> crate::traits::Transaction for SqliteStore<'a> {
    type Error = SqliteError;

    type Permit = TransactionPermit<TransactionCell<'a>>;

    /// Begins the transaction of an override save.
    ///
    /// Waits until the save currently holding the permit committed, rolled back or was dropped.
    async fn begin(&self) -> Result<Self::Permit, SqliteError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("if semaphore is closed then the whole struct is gone as well");

        let mut tx_ref = self.tx.lock().await;

        // A save cancelled while running a statement can leave its transaction behind.
        if let Some(stranded) = tx_ref.take() {
            stranded.rollback().await?;
        }

        let tx = self.pool.begin().await?;
        tx_ref.replace(tx);

        Ok(TransactionPermit::new(permit, self.tx.clone()))
    }

    /// Rolls back all uncommitted changes of the save and frees the permit.
    async fn rollback(&self, permit: Self::Permit) -> Result<(), SqliteError> {
        let Some(tx) = self.tx.lock().await.take() else {
            panic!("can't have no transaction without dropping permit first")
        };

        let result = tx.rollback().await.map_err(SqliteError::Sqlite);
        drop(permit);

        result
    }

    /// Commits the save and frees the permit.
    async fn commit(&self, permit: Self::Permit) -> Result<(), SqliteError> {
        let Some(tx) = self.tx.lock().await.take() else {
            panic!("can't have no transaction without dropping permit first")
        };

        let result = tx.commit().await.map_err(SqliteError::Sqlite);
        drop(permit);

        result
    }
}

#[derive(Debug, Error)]
pub enum SqliteError {
    /// This is a critical error as it indicates that something is wrong with the usage of this
    /// API: Queries using transactions can only ever occur if a transaction was started _before_.
    #[error("tried to interact with inexistant transaction")]
    TransactionMissing,

    /// SQLite database and connection error.
    #[error(transparent)]
    Sqlite(#[from] sqlx::Error),

    /// SQL table schema migration error.
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Invalid, corrupted data was found in the database. This is a critical error.
    #[error("could not decode corrupted '{0}' value from database: {1}")]
    Decode(String, DecodeError),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Subject(#[from] SubjectError),

    #[error(transparent)]
    Right(#[from] RightError),

    #[error("parsing from string failed")]
    FromStr,
}

#[cfg(test)]
mod tests {
    use std::task::Poll;

    use futures_test::task::noop_context;
    use sqlx::{Executor, query, query_as};
    use tokio::pin;

    use crate::sqlite::{SqliteError, SqliteStoreBuilder};
    use crate::traits::Transaction;

    #[tokio::test]
    async fn transaction_provider() {
        let pool = SqliteStoreBuilder::new()
            .run_default_migrations(false)
            .random_memory_url()
            .build()
            .await
            .unwrap();

        // Executing with an in-existant transaction should throw error.
        assert!(matches!(
            pool.tx(async |_| Ok(())).await,
            Err(SqliteError::TransactionMissing)
        ));

        let permit = pool.begin().await.expect("no error");

        // .. attempting to start a second one should make us wait.
        assert!(matches!(
            {
                let fut = pool.begin();
                let mut cx = noop_context();
                pin!(fut);
                fut.poll(&mut cx)
            },
            Poll::Pending
        ));

        assert!(pool.tx(async |_| Ok(())).await.is_ok());
        assert!(pool.commit(permit).await.is_ok());

        // .. and now running a transaction should fail.
        assert!(matches!(
            pool.tx(async |_| Ok(())).await,
            Err(SqliteError::TransactionMissing)
        ));
    }

    #[tokio::test]
    async fn begin_rolls_back_stranded_transaction() {
        let store = SqliteStoreBuilder::new()
            .run_default_migrations(false)
            .max_connections(1)
            .random_memory_url()
            .build()
            .await
            .unwrap();

        store
            .execute(async |pool| {
                pool.execute("CREATE TABLE test(x INTEGER)").await?;
                pool.execute("INSERT INTO test (x) VALUES (5)").await?;
                Ok(())
            })
            .await
            .unwrap();

        let permit = store.begin().await.unwrap();
        store
            .tx(async |tx| {
                query("DELETE FROM test").execute(&mut **tx).await?;
                Ok(())
            })
            .await
            .unwrap();

        // Permit dropped while a statement still holds the transaction, it stays in the slot.
        let tx_ref = store.tx.lock().await;
        drop(permit);
        drop(tx_ref);
        assert!(store.tx.lock().await.is_some());

        let permit = store.begin().await.unwrap();
        let count = store
            .tx(async |tx| {
                let row: (i64,) = query_as("SELECT COUNT(*) FROM test")
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(row.0)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        store.commit(permit).await.unwrap();
    }

    #[tokio::test]
    async fn rollback_discards_uncommitted_writes() {
        let store = SqliteStoreBuilder::new()
            .run_default_migrations(false)
            .max_connections(1)
            .random_memory_url()
            .build()
            .await
            .unwrap();

        store
            .execute(async |pool| {
                pool.execute("CREATE TABLE test(x INTEGER)").await?;
                pool.execute("INSERT INTO test (x) VALUES (5)").await?;
                Ok(())
            })
            .await
            .unwrap();

        let permit = store.begin().await.unwrap();

        store
            .tx(async |tx| {
                query("DELETE FROM test").execute(&mut **tx).await?;
                Ok(())
            })
            .await
            .unwrap();

        // The "dirty read" inside the transaction sees the delete.
        let count = store
            .tx(async |tx| {
                let row: (i64,) = query_as("SELECT COUNT(*) FROM test")
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(row.0)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);

        store.rollback(permit).await.unwrap();

        let count = store
            .execute(async |pool| {
                let row: (i64,) = query_as("SELECT COUNT(*) FROM test").fetch_one(pool).await?;
                Ok(row.0)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn default_migrations_create_override_tables() {
        let store = SqliteStoreBuilder::new()
            .random_memory_url()
            .max_connections(1)
            .build()
            .await
            .unwrap();

        let tables = store
            .execute(async |pool| {
                let rows: Vec<(String,)> = query_as(
                    "
                    SELECT
                        name
                    FROM
                        sqlite_master
                    WHERE
                        type = 'table'
                        AND name LIKE 'user_protect_%'
                    ORDER BY
                        name
                    ",
                )
                .fetch_all(pool)
                .await?;
                Ok(rows.into_iter().map(|row| row.0).collect::<Vec<String>>())
            })
            .await
            .unwrap();

        assert_eq!(tables, vec!["user_protect_rights", "user_protect_titles"]);
    }
}
