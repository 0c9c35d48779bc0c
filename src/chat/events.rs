// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Change notifications
//!
//! [`Emitter`] is a synchronous publish/subscribe channel. `fire` calls every
//! listener on the calling task, in subscription order, after releasing its
//! own lock, so listeners may read back into the object that fired.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ListenerList<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// Fan-out notification channel for payloads of type `T`
pub struct Emitter<T> {
    inner: Arc<Mutex<ListenerList<T>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListenerList {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }
}

fn lock<T>(list: &Mutex<ListenerList<T>>) -> MutexGuard<'_, ListenerList<T>> {
    match list.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(target: "parley.events", "listener list lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut list = lock(&self.inner);
            let id = list.next_id;
            list.next_id += 1;
            list.listeners.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<ListenerList<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    lock(&inner).listeners.retain(|(existing, _)| *existing != id);
                }
            })),
        }
    }

    /// Deliver `payload` to every current listener
    pub fn fire(&self, payload: &T) {
        let listeners: Vec<Listener<T>> = lock(&self.inner)
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(payload);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

/// Handle returned by [`Emitter::subscribe`]; removes the listener on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        self.run_remove();
    }

    /// Keep the listener registered for the lifetime of the emitter
    pub fn detach(mut self) {
        self.remove = None;
    }

    fn run_remove(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}
