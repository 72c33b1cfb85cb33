//! Change notification channel.
//!
//! A synchronous, in-process fan-out scoped to one object. Listeners are
//! held by weak reference, invoked in registration order on the caller's
//! thread, and never deduplicated: registering the same listener twice
//! delivers every notification twice.
//!
//! Delivery iterates over a snapshot of the registered listeners taken
//! before the first call, so a listener may register further listeners
//! while being notified. There is no cycle detection; a listener that
//! writes back into an object which notifies it again recurses.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{ListenerError, ObjectError};
use crate::object::UavObject;

/// Observer of object changes.
///
/// Closures of the form `Fn(&dyn UavObject) -> Result<(), ListenerError>`
/// implement this trait; [`listener_from_fn`] wraps one ready for
/// registration.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use uavlink_objects::{listener_from_fn, DataObject, ObjectDefinition, UavObject};
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&hits);
/// let listener = listener_from_fn(move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
///
/// let object = DataObject::new(ObjectDefinition::new(0x10, "Heartbeat")).unwrap();
/// object.add_change_listener(&listener);
/// object.notify_change_listeners().unwrap();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub trait ChangeListener: Send + Sync {
    /// Called after `object` changed.
    fn object_changed(&self, object: &dyn UavObject) -> Result<(), ListenerError>;
}

impl<F> ChangeListener for F
where
    F: Fn(&dyn UavObject) -> Result<(), ListenerError> + Send + Sync,
{
    fn object_changed(&self, object: &dyn UavObject) -> Result<(), ListenerError> {
        self(object)
    }
}

/// Wrap a closure as a shareable listener.
pub fn listener_from_fn<F>(f: F) -> Arc<dyn ChangeListener>
where
    F: Fn(&dyn UavObject) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What notification does when a listener fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerFailurePolicy {
    /// Keep delivering to the remaining listeners, then return the first
    /// failure to the caller of the mutator.
    #[default]
    Propagate,
    /// Log each failure and report success.
    Isolate,
}

/// The listeners registered on one object.
#[derive(Default)]
pub struct ChangeListeners {
    entries: Mutex<Vec<Weak<dyn ChangeListener>>>,
    policy: Mutex<ListenerFailurePolicy>,
}

impl ChangeListeners {
    /// An empty listener set with the default failure policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener by weak reference.
    pub fn add(&self, listener: &Arc<dyn ChangeListener>) {
        self.entries.lock().push(Arc::downgrade(listener));
    }

    /// Unregister every entry pointing at `listener`.
    pub fn remove(&self, listener: &Arc<dyn ChangeListener>) {
        let target = Arc::downgrade(listener);
        self.entries.lock().retain(|entry| !Weak::ptr_eq(entry, &target));
    }

    /// Number of registrations whose listener is still alive.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Whether no live listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current failure policy.
    pub fn failure_policy(&self) -> ListenerFailurePolicy {
        *self.policy.lock()
    }

    /// Choose how listener failures are handled.
    pub fn set_failure_policy(&self, policy: ListenerFailurePolicy) {
        *self.policy.lock() = policy;
    }

    /// Invoke every live listener with `object`, in registration order.
    pub fn notify(&self, object: &dyn UavObject) -> Result<(), ObjectError> {
        let snapshot: Vec<Weak<dyn ChangeListener>> = {
            let mut entries = self.entries.lock();
            entries.retain(|entry| entry.strong_count() > 0);
            entries.clone()
        };
        let policy = self.failure_policy();

        let mut first_error = None;
        for entry in snapshot {
            let Some(listener) = entry.upgrade() else {
                continue;
            };
            if let Err(source) = listener.object_changed(object) {
                warn!(object = %object.name(), error = %source, "change listener failed");
                if first_error.is_none() {
                    first_error = Some(source);
                }
            }
        }

        match (first_error, policy) {
            (Some(source), ListenerFailurePolicy::Propagate) => Err(ObjectError::Listener {
                object: object.name().into_owned(),
                source,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("live", &self.len())
            .field("policy", &self.failure_policy())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
