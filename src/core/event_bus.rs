//! Named-channel callback bus for decoupled viewer observers.
//!
//! Architecture:
//! - Channels are plain strings and must be enabled before use
//! - Subscribers register a [`Callback`] plus bound args/kwargs
//! - publish() invokes every subscriber synchronously, in registration order
//!
//! Each subscriber is isolated: an `Err` or a panic from one handler is logged
//! and delivery moves on to the next one. Cross-channel order is undefined.
//!
//! Delivery iterates a snapshot of the channel's subscriber list, so a handler
//! may subscribe, clear, or publish on the same bus without deadlocking. A
//! nested publish interleaves with the outer delivery loop; handlers that need
//! strict ordering should queue follow-up work instead of acting inline.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::{error, trace};

use super::args::{Arg, CallbackArgs, KwArgs};
use crate::error::{Result, ViewerError};

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// What a handler returns. `Ok(true)` marks the event as handled.
pub type HandlerResult = anyhow::Result<bool>;

type HandlerFn<S> = dyn Fn(&S, &CallbackArgs) -> HandlerResult + Send + Sync;

/// A handler with a stable identity.
///
/// Identity is assigned once at construction and shared by clones, which is
/// what duplicate-subscription detection compares (closures themselves have no
/// usable equality).
pub struct Callback<S> {
    id: u64,
    func: Arc<HandlerFn<S>>,
}

impl<S> Callback<S> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&S, &CallbackArgs) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            id: NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed),
            func: Arc::new(func),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<S> Clone for Callback<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Arc::clone(&self.func),
        }
    }
}

impl<S> fmt::Debug for Callback<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("id", &self.id).finish()
    }
}

struct Subscription<S> {
    callback: Callback<S>,
    args: Vec<Arg>,
    kwargs: KwArgs,
}

impl<S> Subscription<S> {
    // Callback identity + structural equality of bound arguments.
    // KwArgs equality is order-insensitive.
    fn same_as(&self, callback: &Callback<S>, args: &[Arg], kwargs: &KwArgs) -> bool {
        self.callback.id == callback.id && self.args == args && &self.kwargs == kwargs
    }
}

type Channels<S> = HashMap<String, Vec<Arc<Subscription<S>>>>;

/// Result of a publish.
///
/// `any_true` is a weak aggregate: a single handler returning `true` makes it
/// true even if every other handler failed.
/// Check `failures` when partial failure matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The channel was never enabled.
    NoSuchChannel,
    /// The channel exists but nobody is listening.
    NoSubscribers,
    /// At least one subscriber was invoked.
    Handled { any_true: bool, failures: usize },
}

impl Outcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Outcome::Handled { .. })
    }

    pub fn any_true(&self) -> bool {
        matches!(self, Outcome::Handled { any_true: true, .. })
    }
}

/// Channel registry shared by clones of the same bus.
///
/// `S` is the publisher type; it is handed to every handler as the first
/// argument of the call.
pub struct EventBus<S> {
    channels: Arc<RwLock<Channels<S>>>,
    log_target: Option<Arc<str>>,
}

impl<S> Clone for EventBus<S> {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            log_target: self.log_target.clone(),
        }
    }
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for EventBus<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.channels.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("EventBus")
            .field("channels", &channels)
            .field("log_target", &self.log_target)
            .finish()
    }
}

impl<S> EventBus<S> {
    /// Bus without a logger: handler failures are dropped silently.
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            log_target: None,
        }
    }

    /// Bus that reports handler failures through `log` under `target`.
    pub fn with_logger(target: &str) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            log_target: Some(Arc::from(target)),
        }
    }

    // ========== Channels ==========

    /// Create the channel if missing. Existing subscribers are kept.
    pub fn enable(&self, channel: &str) {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(channel.to_string())
            .or_default();
    }

    /// Drop every subscriber of `channel`, creating it if absent.
    pub fn clear(&self, channel: &str) {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(channel.to_string())
            .or_default()
            .clear();
    }

    /// Whether the channel exists (it may still have no subscribers).
    pub fn has(&self, channel: &str) -> bool {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(channel)
    }

    /// Delete the channel entirely.
    pub fn remove_channel(&self, channel: &str) -> Result<()> {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(channel)
            .map(|_| ())
            .ok_or_else(|| ViewerError::UnknownChannel(channel.to_string()))
    }

    pub fn subscriber_count(&self, channel: &str) -> Option<usize> {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel)
            .map(Vec::len)
    }

    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    // ========== Subscriptions ==========

    /// Register `callback` on an enabled channel.
    ///
    /// Registering the same callback with equal bound args and kwargs again
    /// is a no-op, so repeated wiring never double-fires.
    pub fn subscribe(
        &self,
        channel: &str,
        callback: &Callback<S>,
        args: Vec<Arg>,
        kwargs: KwArgs,
    ) -> Result<()> {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let subs = channels
            .get_mut(channel)
            .ok_or_else(|| ViewerError::UnknownChannel(channel.to_string()))?;

        if subs.iter().any(|s| s.same_as(callback, &args, &kwargs)) {
            trace!("'{}': callback {} already registered", channel, callback.id);
            return Ok(());
        }

        subs.push(Arc::new(Subscription {
            callback: callback.clone(),
            args,
            kwargs,
        }));
        Ok(())
    }

    /// Enable `channel` if needed, then subscribe.
    pub fn connect(
        &self,
        channel: &str,
        callback: &Callback<S>,
        args: Vec<Arg>,
        kwargs: KwArgs,
    ) -> Result<()> {
        self.enable(channel);
        self.subscribe(channel, callback, args, kwargs)
    }

    /// Remove all subscribers. Unlike [`clear`](Self::clear) the channel must exist.
    pub fn unsubscribe_all(&self, channel: &str) -> Result<()> {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(channel)
            .map(Vec::clear)
            .ok_or_else(|| ViewerError::UnknownChannel(channel.to_string()))
    }

    // ========== Delivery ==========

    /// Invoke every subscriber of `channel` with `source` and the merged args.
    ///
    /// Never fails: handler errors and panics are caught per subscriber.
    pub fn publish(&self, source: &S, channel: &str, call: impl Into<CallbackArgs>) -> Outcome {
        let snapshot: Vec<Arc<Subscription<S>>> = {
            let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
            match channels.get(channel) {
                None => return Outcome::NoSuchChannel,
                Some(subs) if subs.is_empty() => return Outcome::NoSubscribers,
                Some(subs) => subs.clone(),
            }
        };

        let call = call.into();
        let mut any_true = false;
        let mut failures = 0;

        for sub in &snapshot {
            let args = CallbackArgs::merged(&call, &sub.args, &sub.kwargs);
            trace!("'{}' -> callback {} {:?}", channel, sub.callback.id, args.args);

            let func = &sub.callback.func;
            match panic::catch_unwind(AssertUnwindSafe(|| func(source, &args))) {
                Ok(Ok(handled)) => any_true |= handled,
                Ok(Err(e)) => {
                    failures += 1;
                    if let Some(target) = self.log_target.as_deref() {
                        error!(target: target, "Error making callback '{}': {}", channel, e);
                        error!(target: target, "Traceback:\n{:?}", e);
                    }
                }
                Err(payload) => {
                    failures += 1;
                    if let Some(target) = self.log_target.as_deref() {
                        error!(
                            target: target,
                            "Callback '{}' panicked: {}",
                            channel,
                            panic_message(payload.as_ref())
                        );
                    }
                }
            }
        }

        Outcome::Handled { any_true, failures }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Traceback information unavailable.".to_string()
    }
}
