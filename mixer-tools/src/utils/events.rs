//! Defines the mixer event manager system.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::Error;

type Callback = Box<dyn FnMut(Arc<dyn Any + Send + Sync>) -> Result<(), Error> + Send>;
type SyncedCallbackMap = Mutex<HashMap<String, Vec<CallbackWrapper>>>;
pub type EventHandler = usize;

#[derive(Clone, Default)]
pub struct EventManager {
    callbacks: Arc<SyncedCallbackMap>,
    next_id: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct CallbackWrapper {
    id: EventHandler,
    callback: Arc<Mutex<Callback>>,
}

impl EventManager {
    /// Register event handler for a specific event name.
    ///
    /// # Parameters
    /// * `event` - The event name (any type that matches an Into<String>)
    /// * `callback` - A callback that accepts a single parameter as an argument.
    ///                The argument can be anything that might be both `Send + Sync`.
    ///                You can trick multiple parameters by turning them in a single tuple.
    ///
    /// # Return
    /// Returns an EventHandler that can be used by the `unregister()` method.
    ///
    /// # Errors
    /// If the event handler does not match the expected emitted event exactly it will fail silently.
    /// That means if the tuple gave in the callback parameter does not exactly match the emit one
    /// no handler will be called.
    ///
    /// # Notes
    /// Callbacks run synchronously inside `emit()`. They may register or unregister handlers: the
    /// change applies from the next `emit()`. A callback emitting the event it is handling is
    /// skipped for that nested emission.
    ///
    /// # Example
    ///
    /// ```
    /// use mixer_tools::utils::EventManager;
    ///
    /// let events: EventManager = Default::default();
    /// events.on("change", |(id, value): (usize, u16)| {
    ///     println!("Pot {} is now at {}%", id, value);
    ///     Ok(())
    /// });
    ///
    /// events.emit("change", (2usize, 42u16));
    /// ```
    pub fn on<S, F, T>(&self, event: S, mut callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) -> Result<(), Error> + Send + 'static,
    {
        let event_name = event.into();
        let callback_event = event_name.clone();
        // Generate a unique ID.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // Boxes the callback and downcast its parameter.
        let boxed_callback: Callback = Box::new(move |arg: Arc<dyn Any + Send + Sync>| {
            match arg.downcast::<T>() {
                Ok(arg) => (callback)((*arg).clone()),
                Err(_) => {
                    log::warn!(
                        "The callback for event '{}' could not be called because parameter does not match",
                        callback_event
                    );
                    Ok(())
                }
            }
        });

        let wrapper = CallbackWrapper {
            id,
            callback: Arc::new(Mutex::new(boxed_callback)),
        };

        self.callbacks
            .lock()
            .entry(event_name)
            .or_default()
            .push(wrapper);

        id
    }

    /// Invoke all event handlers registered for a specific event name.
    /// Only the callback registered by the `on()` method and whose payload matches the declared
    /// callback type will be called. All others will be silently skipped.
    /// A failing callback is logged and does not prevent the following ones from running.
    ///
    /// # Parameters
    /// * `event`:  The event name (any type that matches an `Into<String>`)
    /// * `payload`: The event payload (must be `'static + Send + Sync`)
    pub fn emit<S, T>(&self, event: S, payload: T)
    where
        S: Into<String>,
        T: 'static + Send + Sync,
    {
        let event_name = event.into();
        let payload_any: Arc<dyn Any + Send + Sync> = Arc::new(payload);
        // Callbacks run without the registry lock held.
        let callbacks = match self.callbacks.lock().get(&event_name) {
            Some(callbacks) => callbacks.clone(),
            None => return,
        };
        for wrapper in callbacks {
            let Some(mut callback) = wrapper.callback.try_lock() else {
                log::warn!(
                    "The callback {} for event '{}' is already running: skipped",
                    wrapper.id,
                    event_name
                );
                continue;
            };
            if let Err(error) = (*callback)(payload_any.clone()) {
                log::error!("Callback for event '{}' failed: {}", event_name, error);
            }
        }
    }

    /// Unregister a given handler if found.
    pub fn unregister(&self, handler: EventHandler) {
        self.callbacks
            .lock()
            .values_mut()
            .for_each(|v| v.retain(|cb| cb.id != handler));
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count: usize = self.callbacks.lock().values().map(Vec::len).sum();
        write!(f, "EventManager {{ callbacks: {} }}", count)
    }
}
