// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Observable snapshot cell shared by every store.
//!
//! A [`StoreCell`] owns one snapshot and publishes each change on a
//! `tokio::sync::watch` channel, so consumers can either poll
//! [`StoreCell::snapshot`] or await changes on a receiver.
//!
//! Operations hold an [`Operation`] guard for their whole lifetime. The
//! cell counts guards in flight and reports `loading` while any are
//! outstanding, so a quick operation settling never hides a slower one.

use crate::error::AppError;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// What consumers see: the data plus operation status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<D> {
    pub data: D,
    /// True while at least one operation is in flight
    pub loading: bool,
    /// Message of the most recent failure since the last operation began
    pub error: Option<String>,
}

/// Single owner of a store's snapshot.
pub struct StoreCell<D> {
    tx: watch::Sender<Snapshot<D>>,
    /// Guards every write so the in-flight count and snapshot change together.
    in_flight: Mutex<usize>,
    initial: D,
}

impl<D: Clone + Send + Sync + 'static> StoreCell<D> {
    pub fn new(initial: D) -> Self {
        let (tx, _) = watch::channel(Snapshot {
            data: initial.clone(),
            loading: false,
            error: None,
        });
        Self {
            tx,
            in_flight: Mutex::new(0),
            initial,
        }
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<D>> {
        self.tx.subscribe()
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> Snapshot<D> {
        self.tx.borrow().clone()
    }

    /// Borrow the current data without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.tx.borrow().data)
    }

    /// Change the data outside of any remote operation.
    pub fn update_data(&self, f: impl FnOnce(&mut D)) {
        let _count = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        self.tx.send_modify(|snapshot| f(&mut snapshot.data));
    }

    /// Back to the initial data with no error. Outstanding operations
    /// still settle, but their results land on the fresh state.
    pub fn reset(&self) {
        let count = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let loading = *count > 0;
        self.tx.send_modify(|snapshot| {
            snapshot.data = self.initial.clone();
            snapshot.error = None;
            snapshot.loading = loading;
        });
    }

    /// Start an operation: mark loading and clear the previous error.
    pub fn begin(&self, name: &'static str) -> Operation<'_, D> {
        let mut count = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        self.tx.send_modify(|snapshot| {
            snapshot.loading = true;
            snapshot.error = None;
        });
        tracing::debug!(operation = name, in_flight = *count, "Store operation started");
        Operation {
            cell: self,
            name,
            settled: false,
            on_cancel: None,
        }
    }

    fn settle(&self, is_current: impl FnOnce() -> bool, error: Option<String>, apply: impl FnOnce(&mut D)) -> bool {
        let mut count = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        let loading = *count > 0;
        let current = is_current();
        self.tx.send_modify(|snapshot| {
            if current {
                apply(&mut snapshot.data);
                if error.is_some() {
                    snapshot.error = error;
                }
            }
            snapshot.loading = loading;
        });
        current
    }
}

/// Change applied when an operation is dropped before it settles.
type CancelFn<'a, D> = Box<dyn FnOnce(&mut D) + Send + 'a>;

/// In-flight operation on a [`StoreCell`]. Dropping it unsettled (e.g. a
/// cancelled future) settles it, touching the data only through the hook
/// registered with [`Operation::stage`].
#[must_use = "an operation must be settled"]
pub struct Operation<'a, D: Clone + Send + Sync + 'static> {
    cell: &'a StoreCell<D>,
    name: &'static str,
    settled: bool,
    on_cancel: Option<CancelFn<'a, D>>,
}

impl<'a, D: Clone + Send + Sync + 'static> Operation<'a, D> {
    /// Publish an intermediate change (e.g. a phase transition) while still in flight.
    pub fn update(&self, f: impl FnOnce(&mut D)) {
        self.cell.update_data(f);
    }

    /// Publish an intermediate change and register `undo`, which runs only
    /// if the operation is dropped before it settles.
    pub fn stage(&mut self, f: impl FnOnce(&mut D), undo: impl FnOnce(&mut D) + Send + 'a) {
        self.cell.update_data(f);
        self.on_cancel = Some(Box::new(undo));
    }

    /// Settle successfully, applying `apply` to the data.
    pub fn succeed(self, apply: impl FnOnce(&mut D)) {
        self.finish(|| true, None, apply);
    }

    /// Settle with a failure; the data is left as it was.
    pub fn fail(self, err: &AppError) {
        self.fail_with(err, |_| {});
    }

    /// Settle with a failure but still apply `apply` (e.g. clearing a session).
    pub fn fail_with(self, err: &AppError, apply: impl FnOnce(&mut D)) {
        tracing::warn!(operation = self.name, error = %err, "Store operation failed");
        self.finish(|| true, Some(err.to_string()), apply);
    }

    /// Settle, applying the outcome only if `is_current()` still holds at
    /// publish time. Returns whether the outcome was applied.
    pub fn finish(
        mut self,
        is_current: impl FnOnce() -> bool,
        error: Option<String>,
        apply: impl FnOnce(&mut D),
    ) -> bool {
        self.settled = true;
        let applied = self.cell.settle(is_current, error, apply);
        if !applied {
            tracing::debug!(operation = self.name, "Discarding superseded result");
        }
        applied
    }
}

impl<D: Clone + Send + Sync + 'static> Drop for Operation<'_, D> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::debug!(operation = self.name, "Store operation dropped before settling");
        match self.on_cancel.take() {
            Some(undo) => {
                self.cell.settle(|| true, None, undo);
            }
            None => {
                self.cell.settle(|| false, None, |_| {});
            }
        }
    }
}
