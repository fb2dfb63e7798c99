use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observers of one value. Listeners run synchronously on the thread that
/// fires, outside the registry lock, so a listener may subscribe or
/// unsubscribe without deadlocking.
pub struct Feedback<T> {
    name: String,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T> Feedback<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    pub fn fire(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        tracing::trace!("{}: notifying {} listener(s)", self.name, listeners.len());
        for listener in listeners {
            listener(value);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener<T>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for Feedback<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feedback")
            .field("name", &self.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value: &T| sink.lock().unwrap().push(value.clone()))
    }

    #[test]
    fn every_listener_sees_every_value() {
        let feedback = Feedback::<u8>::new("pan_speed");
        let (first, listener) = recorder();
        feedback.subscribe(listener);
        let (second, listener) = recorder();
        feedback.subscribe(listener);

        feedback.fire(&10);
        feedback.fire(&10);

        assert_eq!(*first.lock().unwrap(), vec![10, 10]);
        assert_eq!(*second.lock().unwrap(), vec![10, 10]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let feedback = Feedback::<String>::new("name");
        let (seen, listener) = recorder();
        let id = feedback.subscribe(listener);
        assert!(feedback.unsubscribe(id));
        assert!(!feedback.unsubscribe(id));

        feedback.fire(&"camera".to_string());
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(feedback.listener_count(), 0);
    }

    #[test]
    fn listener_may_subscribe_while_firing() {
        let feedback = Arc::new(Feedback::<u8>::new("zoom_speed"));
        let inner = feedback.clone();
        feedback.subscribe(move |_| {
            inner.subscribe(|_| {});
        });
        feedback.fire(&1);
        assert_eq!(feedback.listener_count(), 2);
    }
}
