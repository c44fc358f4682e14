// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use tokio::sync::OwnedSemaphorePermit;

/// Transaction provider of an override store.
///
/// Saves hold the returned permit until they commit or roll back, which makes the delete and
/// insert of one save visible to readers all at once.
pub trait Transaction {
    type Error: Error;

    type Permit;

    /// Begins a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Permit, Self::Error>>;

    /// Rolls back the transaction and with that all uncommitted changes.
    fn rollback(&self, permit: Self::Permit) -> impl Future<Output = Result<(), Self::Error>>;

    /// Commits the transaction.
    fn commit(&self, permit: Self::Permit) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Place where a store keeps the uncommitted state of the running transaction.
pub trait TransactionSlot {
    /// Throws away uncommitted state, if there is any.
    fn discard(&self);
}

/// Proof of holding the single transaction slot of a store.
///
/// Stores drop the permit after committing or rolling back. A permit dropped before that, for
/// example because the save holding it was cancelled, discards the uncommitted state so the next
/// transaction starts from the committed one.
pub struct TransactionPermit<S: TransactionSlot> {
    _permit: OwnedSemaphorePermit,
    slot: S,
}

impl<S: TransactionSlot> TransactionPermit<S> {
    pub(crate) fn new(permit: OwnedSemaphorePermit, slot: S) -> Self {
        Self {
            _permit: permit,
            slot,
        }
    }
}

impl<S: TransactionSlot> Drop for TransactionPermit<S> {
    fn drop(&mut self) {
        self.slot.discard();
    }
}
