//! In-process publish/subscribe.
//!
//! An [`Observable`] keeps an ordered list of subscribers and delivers every
//! message synchronously on the caller's thread, in subscription order. There
//! is no isolation between subscribers: an observer that blocks stalls the
//! publisher, and observers must not call back into the object that is
//! notifying them.

use std::sync::Arc;

/// Anything that wants to hear about state changes.
pub trait Observer: Send + Sync {
    fn update(&self, message: &str);
}

/// Shared handle to an observer.
pub type SharedObserver = Arc<dyn Observer>;

/// Identity of an observer allocation, used to de-duplicate recipients.
pub(crate) fn observer_id<T: ?Sized>(observer: &Arc<T>) -> *const () {
    Arc::as_ptr(observer) as *const ()
}

/// Ordered list of subscribers.
#[derive(Clone, Default)]
pub struct Observable {
    observers: Vec<SharedObserver>,
}

impl Observable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Subscribing the same observer twice delivers twice.
    pub fn subscribe(&mut self, observer: SharedObserver) {
        self.observers.push(observer);
    }

    /// Remove the first subscription of `observer`. Returns whether one was removed.
    pub fn unsubscribe(&mut self, observer: &SharedObserver) -> bool {
        let target = observer_id(observer);
        match self.observers.iter().position(|o| observer_id(o) == target) {
            Some(index) => {
                self.observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed<T: ?Sized>(&self, observer: &Arc<T>) -> bool {
        let target = observer_id(observer);
        self.observers.iter().any(|o| observer_id(o) == target)
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn observers(&self) -> &[SharedObserver] {
        &self.observers
    }

    pub fn notify(&self, message: &str) {
        for observer in &self.observers {
            observer.update(message);
        }
    }
}

impl std::fmt::Debug for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Observer for Recorder {
        fn update(&self, message: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.tag, message));
        }
    }

    #[test]
    fn test_delivers_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut observable = Observable::new();
        observable.subscribe(Arc::new(Recorder {
            tag: "a",
            log: log.clone(),
        }));
        observable.subscribe(Arc::new(Recorder {
            tag: "b",
            log: log.clone(),
        }));

        observable.notify("hello");

        assert_eq!(*log.lock().unwrap(), vec!["a:hello", "b:hello"]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_observer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first: SharedObserver = Arc::new(Recorder {
            tag: "a",
            log: log.clone(),
        });
        let second: SharedObserver = Arc::new(Recorder {
            tag: "b",
            log: log.clone(),
        });
        let mut observable = Observable::new();
        observable.subscribe(first.clone());
        observable.subscribe(second.clone());

        assert!(observable.unsubscribe(&first));
        assert!(!observable.unsubscribe(&first));
        assert!(observable.is_subscribed(&second));
        assert_eq!(observable.len(), 1);

        observable.notify("ping");
        assert_eq!(*log.lock().unwrap(), vec!["b:ping"]);
    }

    #[test]
    fn test_empty_observable_is_silent() {
        let observable = Observable::new();
        assert!(observable.is_empty());
        observable.notify("nobody listens");
    }
}
