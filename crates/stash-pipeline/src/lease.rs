//! Single-flight lease.
//!
//! A [`LeaseSlot`] hands out at most one [`Lease`] at a time. The lease names
//! the capture being processed and frees the slot when dropped, so an early
//! return or a panic inside processing cannot leave the slot stuck.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct LeaseSlot {
    holder: Arc<Mutex<Option<String>>>,
}

impl LeaseSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for `capture_id`. `None` if any capture holds it.
    #[must_use]
    pub fn try_acquire(&self, capture_id: &str) -> Option<Lease> {
        let mut holder = self.lock();
        if holder.is_some() {
            return None;
        }
        *holder = Some(capture_id.to_string());
        Some(Lease {
            slot: self.clone(),
            capture_id: capture_id.to_string(),
        })
    }

    /// The capture currently in flight, if any.
    #[must_use]
    pub fn holder(&self) -> Option<String> {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.lock().is_some()
    }
}

/// Exclusive claim on one capture. Released on drop.
#[derive(Debug)]
pub struct Lease {
    slot: LeaseSlot,
    capture_id: String,
}

impl Lease {
    #[must_use]
    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut holder = self.slot.lock();
        if holder.as_deref() == Some(self.capture_id.as_str()) {
            *holder = None;
        }
    }
}
