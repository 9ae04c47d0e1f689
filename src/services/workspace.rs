//! Shared program state with a single writer
//!
//! Readers take an `Arc` of the current snapshot and keep it as long as they
//! like. Writers are serialized: a fix or rename is computed against the
//! snapshot current when it starts and swapped in only if it succeeded.

use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};

use crate::error::RenameError;
use crate::models::edit::RenameEdit;
use crate::models::program::ProgramSnapshot;
use crate::services::fix::{CodeAction, FixOutcome};

#[derive(Debug, Default)]
pub struct Workspace {
    current: RwLock<Arc<ProgramSnapshot>>,
    writer: Mutex<()>,
}

impl Workspace {
    pub fn new(program: ProgramSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(program)),
            writer: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<ProgramSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply a code action, waiting for any in-flight writer
    pub fn apply(&self, action: &CodeAction) -> FixOutcome {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.commit(action.apply(&self.snapshot()))
    }

    /// Apply a code action unless another writer is in flight
    pub fn try_apply(&self, action: &CodeAction) -> FixOutcome {
        let _guard = match self.writer.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return FixOutcome::Rejected(RenameError::Busy),
        };
        self.commit(action.apply(&self.snapshot()))
    }

    /// Run an arbitrary edit under the writer lock
    pub fn edit_with(
        &self,
        edit: impl FnOnce(&ProgramSnapshot) -> Result<(ProgramSnapshot, RenameEdit), RenameError>,
    ) -> FixOutcome {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = match edit(&self.snapshot()) {
            Ok((snapshot, edit)) => FixOutcome::Applied { snapshot, edit },
            Err(e) => FixOutcome::Rejected(e),
        };
        self.commit(outcome)
    }

    fn commit(&self, outcome: FixOutcome) -> FixOutcome {
        if let FixOutcome::Applied { snapshot, .. } = &outcome {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = Arc::new(snapshot.clone());
        }
        outcome
    }
}
