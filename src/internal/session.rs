//! Registry of live result handles held across tool calls.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::internal::ipc::schema::{Ref, ResultHandle};

/// A result handle plus the impact method it was calculated with, so
/// later contribution calls can resolve category names.
#[derive(Clone, Debug)]
pub struct StoredResult {
    pub handle: ResultHandle,
    pub method: Option<Ref>,
}

/// Maps opaque result ids to live server-side handles. The host may
/// interleave tool calls, so access goes through a mutex.
///
/// Entries stay until [`ResultStore::take`] removes them; the server
/// memory behind a handle is only freed by an explicit dispose call.
#[derive(Default)]
pub struct ResultStore {
    entries: Mutex<HashMap<String, StoredResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a result and returns the id handed to the caller.
    pub fn insert(&self, handle: ResultHandle, method: Option<Ref>) -> String {
        let id = Uuid::new_v4().to_string();
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id.clone(), StoredResult { handle, method });
        id
    }

    pub fn get(&self, id: &str) -> Option<StoredResult> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    /// Removes and returns an entry; the caller owns disposal.
    pub fn take(&self, id: &str) -> Option<StoredResult> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
