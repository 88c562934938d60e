//! Minimal publish/subscribe primitive used by the store and view controllers.
//!
//! Listeners take no payload; they pull whatever state they need when called.
//! `emit()` works on the slot list captured at call time and skips slots that
//! were released after the capture, so a released subscription never fires
//! again even if the release races an in-flight emit.
//!
//! There is no error isolation: a panicking listener unwinds out of `emit()`
//! and later listeners in the same emit do not run.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub type Listener = Arc<dyn Fn() + Send + Sync>;

struct Slot {
    listener: Listener,
    removed: AtomicBool,
}

type SlotList = Mutex<Vec<Arc<Slot>>>;

#[derive(Default)]
pub struct ChangeEmitter {
    slots: Arc<SlotList>,
}

impl ChangeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The returned handle releases the slot when
    /// `unsubscribe()` is called or when it is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    /// Register an already-shared listener. Registering the same `Arc` twice
    /// creates two independent slots.
    pub fn subscribe_listener(&self, listener: Listener) -> Subscription {
        let slot = Arc::new(Slot {
            listener,
            removed: AtomicBool::new(false),
        });
        self.slots.lock().push(slot.clone());
        Subscription {
            slot,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Invoke every registered listener once, in registration order.
    pub fn emit(&self) {
        let captured: Vec<Arc<Slot>> = self.slots.lock().clone();
        for slot in captured {
            if !slot.removed.load(Ordering::Acquire) {
                (slot.listener)();
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Drop every slot. Outstanding handles become no-ops.
    pub fn clear(&self) {
        let drained: Vec<Arc<Slot>> = self.slots.lock().drain(..).collect();
        for slot in drained {
            slot.removed.store(true, Ordering::Release);
        }
    }
}

/// Handle for one registered listener slot.
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    slot: Arc<Slot>,
    slots: Weak<SlotList>,
}

impl Subscription {
    /// Remove this slot. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if self.slot.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(slots) = self.slots.upgrade() {
            slots.lock().retain(|s| !Arc::ptr_eq(s, &self.slot));
        }
    }

    pub fn is_active(&self) -> bool {
        !self.slot.removed.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
