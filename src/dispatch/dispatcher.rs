//! # In-process signal dispatcher.
//!
//! [`Dispatcher`] is a multiple-producer, multiple-receiver broadcast hub:
//! receivers register for a signal type with [`connect`](Dispatcher::connect)
//! and emitters deliver with [`send`](Dispatcher::send) (robust) or
//! [`send_strict`](Dispatcher::send_strict).
//!
//! ## Architecture
//! ```text
//! Emitters (many):                 Receivers (many, per signal type):
//!   registry ──┐                      ┌──► receiver A (weak)
//!   app code ──┼──► Dispatcher ───────┼──► receiver B (strong)
//!   app code ──┘    (typed fan-out)   └──► receiver C (weak)
//! ```
//!
//! ## Rules
//! - A registration is keyed by signal type; one receiver may be registered
//!   for several types independently.
//! - Weak registrations die with the caller's `Arc`. Dead entries are
//!   detected when dereferenced and swept opportunistically on the next
//!   connect/disconnect/send; a dead entry never makes delivery fail.
//! - Re-connecting the same receiver with the same [`ConnectMode`] is a
//!   no-op. Connecting it with the other mode adds a second, distinct
//!   registration; one [`disconnect`](Dispatcher::disconnect) removes both.
//! - Delivery order among receivers is unspecified.
//! - Receivers run on the sender's thread, outside the dispatcher lock, so
//!   a receiver may itself connect or disconnect. A slow receiver blocks
//!   its sender.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::error::BoxError;

use super::signal::{ConnectMode, Receiver, Signal};

type AnyArc = Arc<dyn Any + Send + Sync>;
type AnyWeak = Weak<dyn Any + Send + Sync>;
type InvokeFn = fn(&(dyn Any + Send + Sync), &(dyn Any + Send + Sync)) -> Result<(), BoxError>;

/// A receiver failed during strict delivery.
#[derive(Debug, Error)]
#[error("receiver for signal '{signal}' failed: {source}")]
pub struct DispatchError {
    signal: &'static str,
    source: BoxError,
}

impl DispatchError {
    /// Returns the type name of the signal being delivered.
    pub fn signal(&self) -> &'static str {
        self.signal
    }

    /// Unwraps the receiver's own error.
    pub fn into_source(self) -> BoxError {
        self.source
    }
}

/// Invokes a type-erased receiver with a type-erased signal.
///
/// Entries are stored under the `TypeId` of `S` with a thunk monomorphized
/// for the exact `(S, R)` pair, so the downcasts cannot miss.
fn invoke_as<S, R>(
    receiver: &(dyn Any + Send + Sync),
    signal: &(dyn Any + Send + Sync),
) -> Result<(), BoxError>
where
    S: Signal,
    R: Receiver<S>,
{
    match (receiver.downcast_ref::<R>(), signal.downcast_ref::<S>()) {
        (Some(receiver), Some(signal)) => receiver.receive(signal),
        _ => Ok(()),
    }
}

/// How one registration holds its receiver.
enum Held {
    Strong(AnyArc),
    Weak(AnyWeak),
}

impl Held {
    fn mode(&self) -> ConnectMode {
        match self {
            Held::Strong(_) => ConnectMode::Strong,
            Held::Weak(_) => ConnectMode::Weak,
        }
    }

    fn is_dead(&self) -> bool {
        matches!(self, Held::Weak(weak) if weak.strong_count() == 0)
    }

    /// Returns a strong handle to the receiver, or `None` when it is gone.
    fn upgrade(&self) -> Option<AnyArc> {
        match self {
            Held::Strong(receiver) => Some(Arc::clone(receiver)),
            Held::Weak(weak) => weak.upgrade(),
        }
    }

    /// Compares the referent against a receiver address.
    fn matches(&self, target: *const ()) -> bool {
        match self {
            Held::Strong(receiver) => Arc::as_ptr(receiver) as *const () == target,
            Held::Weak(weak) => match weak.upgrade() {
                Some(receiver) => Arc::as_ptr(&receiver) as *const () == target,
                None => false,
            },
        }
    }
}

struct Entry {
    held: Held,
    invoke: InvokeFn,
}

#[derive(Default)]
struct Registrations {
    receivers: HashMap<TypeId, Vec<Entry>>,
    has_dead_receivers: bool,
}

impl Registrations {
    /// Drops entries whose weak referent is gone.
    ///
    /// Cheap unless a dead receiver was observed since the last sweep.
    fn clear_dead_receivers(&mut self) {
        if !self.has_dead_receivers {
            return;
        }
        for entries in self.receivers.values_mut() {
            entries.retain(|entry| !entry.held.is_dead());
        }
        self.has_dead_receivers = false;
    }
}

/// Thread-safe, weak-reference-aware signal dispatcher.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use groundwork::{BoxError, ConnectMode, Dispatcher, Signal};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Debug)]
/// struct JobFinished;
/// impl Signal for JobFinished {}
///
/// let dispatcher = Dispatcher::new();
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let receiver = {
///     let seen = Arc::clone(&seen);
///     Arc::new(move |_: &JobFinished| -> Result<(), BoxError> {
///         seen.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     })
/// };
/// dispatcher.connect::<JobFinished, _>(&receiver, ConnectMode::Weak);
///
/// dispatcher.send(&JobFinished);
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
///
/// drop(receiver);
/// dispatcher.send(&JobFinished); // the weak registration died with the Arc
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct Dispatcher {
    state: Mutex<Registrations>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `receiver` for signals of type `S`.
    ///
    /// With [`ConnectMode::Weak`] the dispatcher keeps only a weak handle;
    /// dropping the caller's last `Arc` ends the registration without an
    /// explicit disconnect. With [`ConnectMode::Strong`] the dispatcher
    /// keeps the receiver alive itself.
    pub fn connect<S, R>(&self, receiver: &Arc<R>, mode: ConnectMode)
    where
        S: Signal,
        R: Receiver<S>,
    {
        log::debug!(
            "connect receiver '{}' to signal '{}'",
            type_name::<R>(),
            type_name::<S>()
        );
        let target = Arc::as_ptr(receiver) as *const ();

        let mut state = self.state.lock();
        state.clear_dead_receivers();

        let mut dead_seen = false;
        let mut duplicate = false;
        if let Some(entries) = state.receivers.get(&TypeId::of::<S>()) {
            for entry in entries {
                dead_seen |= entry.held.is_dead();
                duplicate |= entry.held.mode() == mode && entry.held.matches(target);
            }
        }
        state.has_dead_receivers |= dead_seen;
        if duplicate {
            return;
        }

        let held = match mode {
            ConnectMode::Strong => {
                let strong: Arc<R> = Arc::clone(receiver);
                let strong: AnyArc = strong;
                Held::Strong(strong)
            }
            ConnectMode::Weak => {
                let weak: Weak<R> = Arc::downgrade(receiver);
                let weak: AnyWeak = weak;
                Held::Weak(weak)
            }
        };
        state
            .receivers
            .entry(TypeId::of::<S>())
            .or_default()
            .push(Entry {
                held,
                invoke: invoke_as::<S, R>,
            });
    }

    /// Removes every registration of `receiver` for signals of type `S`,
    /// regardless of whether it was connected weakly or strongly.
    pub fn disconnect<S, R>(&self, receiver: &Arc<R>)
    where
        S: Signal,
        R: Receiver<S>,
    {
        log::debug!(
            "disconnect receiver '{}' from signal '{}'",
            type_name::<R>(),
            type_name::<S>()
        );
        let target = Arc::as_ptr(receiver) as *const ();

        let mut state = self.state.lock();
        state.clear_dead_receivers();
        if let Some(entries) = state.receivers.get_mut(&TypeId::of::<S>()) {
            entries.retain(|entry| !entry.held.matches(target));
        }
    }

    /// Delivers `signal` to every live receiver registered for its type,
    /// tolerating individual failures.
    ///
    /// Each failing receiver is logged and delivery continues with the
    /// rest: best-effort fan-out, not transactional.
    pub fn send<S: Signal>(&self, signal: &S) {
        for (receiver, invoke) in self.live_receivers::<S>() {
            if let Err(error) = invoke(receiver.as_ref(), signal) {
                log::error!(
                    "error executing receiver for signal '{}': {error}",
                    type_name::<S>()
                );
            }
        }
    }

    /// Delivers `signal`, stopping at the first receiver failure.
    ///
    /// The failure propagates to the sender and receivers not yet invoked
    /// do not run. Which receivers ran before the failure is unspecified.
    pub fn send_strict<S: Signal>(&self, signal: &S) -> Result<(), DispatchError> {
        for (receiver, invoke) in self.live_receivers::<S>() {
            invoke(receiver.as_ref(), signal).map_err(|source| DispatchError {
                signal: type_name::<S>(),
                source,
            })?;
        }
        Ok(())
    }

    /// Snapshots the live receivers for `S` under the lock.
    ///
    /// Dead weak entries are skipped and flagged for the next sweep. The
    /// snapshot is invoked after the lock is released.
    fn live_receivers<S: Signal>(&self) -> Vec<(AnyArc, InvokeFn)> {
        let mut state = self.state.lock();
        state.clear_dead_receivers();

        let mut live = Vec::new();
        let mut dead_seen = false;
        if let Some(entries) = state.receivers.get(&TypeId::of::<S>()) {
            for entry in entries {
                match entry.held.upgrade() {
                    Some(receiver) => live.push((receiver, entry.invoke)),
                    None => dead_seen = true,
                }
            }
        }
        state.has_dead_receivers |= dead_seen;
        live
    }
}

/// A [`Dispatcher`] handle whose target can be swapped at runtime.
///
/// Useful as a stable, shareable handle created before the real dispatcher
/// exists; wire the concrete instance in later with
/// [`set_source`](DispatcherProxy::set_source) and every holder of the proxy
/// observes the change without re-fetching anything.
pub struct DispatcherProxy {
    source: RwLock<Arc<Dispatcher>>,
}

impl DispatcherProxy {
    /// Wraps the given dispatcher.
    pub fn new(source: Arc<Dispatcher>) -> Self {
        Self {
            source: RwLock::new(source),
        }
    }

    /// Replaces the wrapped dispatcher.
    pub fn set_source(&self, source: Arc<Dispatcher>) {
        *self.source.write() = source;
    }

    /// Returns the currently wrapped dispatcher.
    pub fn source(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.source.read())
    }

    /// Forwards to [`Dispatcher::connect`] on the current source.
    pub fn connect<S, R>(&self, receiver: &Arc<R>, mode: ConnectMode)
    where
        S: Signal,
        R: Receiver<S>,
    {
        self.source().connect(receiver, mode);
    }

    /// Forwards to [`Dispatcher::disconnect`] on the current source.
    pub fn disconnect<S, R>(&self, receiver: &Arc<R>)
    where
        S: Signal,
        R: Receiver<S>,
    {
        self.source().disconnect::<S, R>(receiver);
    }

    /// Forwards to [`Dispatcher::send`] on the current source.
    pub fn send<S: Signal>(&self, signal: &S) {
        self.source().send(signal);
    }

    /// Forwards to [`Dispatcher::send_strict`] on the current source.
    pub fn send_strict<S: Signal>(&self, signal: &S) -> Result<(), DispatchError> {
        self.source().send_strict(signal)
    }
}

impl Default for DispatcherProxy {
    fn default() -> Self {
        Self::new(Arc::new(Dispatcher::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Ping;
    impl Signal for Ping {}

    #[derive(Debug)]
    struct Pong;
    impl Signal for Pong {}

    type CountingReceiver = Arc<dyn Fn(&Ping) -> Result<(), BoxError> + Send + Sync>;

    fn counting_receiver(
        counter: &Arc<AtomicUsize>,
    ) -> Arc<impl Fn(&Ping) -> Result<(), BoxError> + Send + Sync + 'static> {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &Ping| -> Result<(), BoxError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_weak_receiver_dies_with_its_arc() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let receiver = counting_receiver(&hits);

        dispatcher.connect::<Ping, _>(&receiver, ConnectMode::Weak);
        dispatcher.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(receiver);
        // The dead entry is skipped without error.
        dispatcher.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1, "dead receiver must not run");
    }

    #[test]
    fn test_strong_receiver_survives_scope_drop() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let receiver = counting_receiver(&hits);
            dispatcher.connect::<Ping, _>(&receiver, ConnectMode::Strong);
        }
        dispatcher.send(&Ping);
        assert_eq!(
            hits.load(Ordering::SeqCst),
            1,
            "strongly held receiver outlives its defining scope"
        );
    }

    #[test]
    fn test_disconnect_removes_weak_and_strong_registrations() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let receiver = counting_receiver(&hits);

        dispatcher.connect::<Ping, _>(&receiver, ConnectMode::Weak);
        dispatcher.connect::<Ping, _>(&receiver, ConnectMode::Strong);
        dispatcher.send(&Ping);
        assert_eq!(
            hits.load(Ordering::SeqCst),
            2,
            "weak and strong registrations are distinct entries"
        );

        dispatcher.disconnect::<Ping, _>(&receiver);
        dispatcher.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 2, "both registrations removed");
    }

    #[test]
    fn test_reconnect_same_mode_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let receiver = counting_receiver(&hits);

        dispatcher.connect::<Ping, _>(&receiver, ConnectMode::Weak);
        dispatcher.connect::<Ping, _>(&receiver, ConnectMode::Weak);
        dispatcher.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_is_per_signal_type() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let receiver = counting_receiver(&hits);

        dispatcher.connect::<Ping, _>(&receiver, ConnectMode::Strong);
        dispatcher.send(&Pong);
        assert_eq!(hits.load(Ordering::SeqCst), 0, "wrong signal type");

        dispatcher.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_robust_send_survives_failing_receiver() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let failing =
            Arc::new(|_: &Ping| -> Result<(), BoxError> { Err("receiver broke".into()) });
        let counting = counting_receiver(&hits);

        dispatcher.connect::<Ping, _>(&failing, ConnectMode::Strong);
        dispatcher.connect::<Ping, _>(&counting, ConnectMode::Strong);

        dispatcher.send(&Ping);
        assert_eq!(
            hits.load(Ordering::SeqCst),
            1,
            "robust delivery reaches the healthy receiver despite the failure"
        );
    }

    #[test]
    fn test_strict_send_propagates_the_failure() {
        let dispatcher = Dispatcher::new();
        let failing =
            Arc::new(|_: &Ping| -> Result<(), BoxError> { Err("receiver broke".into()) });
        dispatcher.connect::<Ping, _>(&failing, ConnectMode::Strong);

        let err = dispatcher.send_strict(&Ping).unwrap_err();
        assert!(err.signal().contains("Ping"));
        assert_eq!(err.into_source().to_string(), "receiver broke");
    }

    #[test]
    fn test_receiver_may_disconnect_during_delivery() {
        let dispatcher = Arc::new(Dispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let counting = counting_receiver(&hits);

        // A receiver that disconnects the counting receiver while a send is
        // in progress; the snapshot taken for this delivery is unaffected.
        let unsubscriber = {
            let dispatcher = Arc::clone(&dispatcher);
            let counting = Arc::clone(&counting);
            Arc::new(move |_: &Ping| -> Result<(), BoxError> {
                dispatcher.disconnect::<Ping, _>(&counting);
                Ok(())
            })
        };

        dispatcher.connect::<Ping, _>(&counting, ConnectMode::Strong);
        dispatcher.connect::<Ping, _>(&unsubscriber, ConnectMode::Strong);

        // Both receivers are in this delivery's snapshot; the disconnect
        // takes effect afterwards and must not deadlock.
        dispatcher.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        dispatcher.send(&Ping);
        assert_eq!(
            hits.load(Ordering::SeqCst),
            1,
            "the counting receiver was disconnected during the first delivery"
        );
    }

    #[test]
    fn test_proxy_swaps_its_source() {
        let proxy = DispatcherProxy::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let receiver = counting_receiver(&hits);

        proxy.connect::<Ping, _>(&receiver, ConnectMode::Strong);
        proxy.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // A fresh source has no registrations.
        proxy.set_source(Arc::new(Dispatcher::new()));
        proxy.send(&Ping);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
