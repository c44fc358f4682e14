// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use userprotect_core::{OverrideRow, Subject};

use crate::traits::{Transaction, TransactionPermit, TransactionSlot};

pub(crate) type OverrideTables = BTreeMap<Subject, Vec<OverrideRow>>;

/// Staged copy of all tables while a save is running.
type StagedTables = Rc<RefCell<Option<OverrideTables>>>;

impl TransactionSlot for StagedTables {
    fn discard(&self) {
        if let Ok(mut staged) = self.try_borrow_mut() {
            staged.take();
        }
    }
}

/// In-memory store.
///
/// This does not persist data permamently, all changes are lost when the process ends. Use this
/// only in development or test contexts.
///
/// Transactions work on a staged copy of all tables which replaces the committed state on
/// `commit` and is thrown away on `rollback` or when the permit gets dropped. All saves share the
/// one staged copy, so like with SQLite they run one after another, also for different subjects.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    pub(crate) committed: Rc<RefCell<OverrideTables>>,
    pub(crate) staged: StagedTables,
    semaphore: Arc<Semaphore>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            committed: Rc::new(RefCell::new(BTreeMap::new())),
            staged: Rc::new(RefCell::new(None)),
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Apply a change to the staged tables of the currently running transaction.
    pub(crate) fn staged<F, R>(&self, f: F) -> Result<R, MemoryStoreError>
    where
        F: FnOnce(&mut OverrideTables) -> R,
    {
        let mut staged = self.staged.borrow_mut();
        let tables = staged.as_mut().ok_or(MemoryStoreError::TransactionMissing)?;
        Ok(f(tables))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction for MemoryStore {
    type Error = MemoryStoreError;

    type Permit = TransactionPermit<StagedTables>;

    async fn begin(&self) -> Result<Self::Permit, MemoryStoreError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("if semaphore is closed then the whole struct is gone as well");

        // Replaces leftovers of a save which went away without releasing its permit cleanly.
        self.staged.replace(Some(self.committed.borrow().clone()));

        Ok(TransactionPermit::new(permit, self.staged.clone()))
    }

    async fn rollback(&self, permit: Self::Permit) -> Result<(), MemoryStoreError> {
        let Some(_) = self.staged.borrow_mut().take() else {
            panic!("can't have no transaction without dropping permit first")
        };
        drop(permit);
        Ok(())
    }

    async fn commit(&self, permit: Self::Permit) -> Result<(), MemoryStoreError> {
        let Some(tables) = self.staged.borrow_mut().take() else {
            panic!("can't have no transaction without dropping permit first")
        };
        self.committed.replace(tables);
        drop(permit);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("tried to interact with inexistant transaction")]
    TransactionMissing,
}

// Trait implementations are in the regarding modules, see for example `overrides`.
