//! Explicit change notification for values the display layer watches.
//!
//! Handlers run synchronously on the thread that performs the change, in
//! subscription order.

/// Token returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

pub struct EventHandlers<E> {
    next_id: u64,
    handlers: Vec<(Subscription, Handler<E>)>,
}

impl<E> EventHandlers<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if the subscription was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(id, _)| *id != subscription);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> Default for EventHandlers<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A value that notifies subscribers whenever it is replaced by a different one.
pub struct Observable<T> {
    value: T,
    changed: EventHandlers<T>,
}

impl<T: PartialEq> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            changed: EventHandlers::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Stores `value` and notifies subscribers. Returns false, without
    /// notifying, when the new value equals the current one.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.changed.emit(&self.value);
        true
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&T) + 'static) -> Subscription {
        self.changed.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.changed.unsubscribe(subscription)
    }
}

impl<T: PartialEq + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.changed.len())
            .finish()
    }
}
