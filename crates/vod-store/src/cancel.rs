//! Per-call interrupt slot
//!
//! An [`OpSlot`] links one caller to the SQLite statement currently running
//! on its behalf. The slot is armed with the connection's interrupt handle
//! when the work starts and disarmed before the connection goes back to the
//! pool, so a late cancel can never hit a statement owned by another caller.

use rusqlite::InterruptHandle;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::connection::StoreError;

enum SlotState {
    Idle,
    Running(InterruptHandle),
    Finished,
    Cancelled,
}

pub struct OpSlot {
    state: Mutex<SlotState>,
}

impl Default for OpSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl OpSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Idle),
        }
    }

    /// Cancel the operation, interrupting its statement if one is running
    pub fn cancel(&self) {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, SlotState::Cancelled) {
            SlotState::Running(handle) => handle.interrupt(),
            SlotState::Finished => *state = SlotState::Finished,
            SlotState::Idle | SlotState::Cancelled => {}
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.lock(), SlotState::Cancelled)
    }

    /// Arm the slot with the interrupt handle of the connection about to run
    pub(crate) fn begin(&self, handle: InterruptHandle) -> Result<(), StoreError> {
        let mut state = self.lock();
        if matches!(*state, SlotState::Cancelled) {
            return Err(StoreError::Cancelled);
        }
        *state = SlotState::Running(handle);
        Ok(())
    }

    /// Disarm the slot; later cancels become no-ops
    pub(crate) fn finish(&self) {
        let mut state = self.lock();
        if matches!(*state, SlotState::Running(_)) {
            *state = SlotState::Finished;
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_cancel_before_begin_rejects_work() {
        let conn = Connection::open_in_memory().unwrap();
        let slot = OpSlot::new();
        slot.cancel();
        assert!(slot.is_cancelled());
        assert!(matches!(slot.begin(conn.get_interrupt_handle()), Err(StoreError::Cancelled)));
    }

    #[test]
    fn test_cancel_after_finish_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        let slot = OpSlot::new();
        slot.begin(conn.get_interrupt_handle()).unwrap();
        slot.finish();
        slot.cancel();
        assert!(!slot.is_cancelled());

        // The connection is not left with a pending interrupt
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_cancel_interrupts_running_statement() {
        let conn = Connection::open_in_memory().unwrap();
        let slot = OpSlot::new();
        slot.begin(conn.get_interrupt_handle()).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                std::thread::sleep(std::time::Duration::from_millis(50));
                slot.cancel();
            });
            let result: rusqlite::Result<i64> = conn.query_row(
                "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 1000000000) SELECT COUNT(*) FROM n",
                [],
                |row| row.get(0),
            );
            let err = StoreError::from(result.unwrap_err());
            assert!(matches!(err, StoreError::Cancelled));
        });
        slot.finish();
        assert!(slot.is_cancelled());
    }
}
