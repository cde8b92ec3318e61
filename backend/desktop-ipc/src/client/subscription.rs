use std::sync::{Mutex, PoisonError};

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Handle to an event listener.
///
/// Dropping the handle leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it. Repeated calls are no-ops.
pub struct Subscription {
    unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Mutex::new(Some(Box::new(unsubscribe))),
        }
    }

    pub fn unsubscribe(&self) {
        let pending = self
            .unsubscribe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(unsubscribe) = pending {
            unsubscribe();
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
