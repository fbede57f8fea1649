//! The script-loading controller behind every `PayPalScriptProvider`.
//!
//! A [`ScriptLoadingController`] owns one [`ScriptState`], drives the
//! [`ScriptLoader`] and notifies subscribers whenever the state changes. It is
//! a cheap `Rc` handle; clones share the same store.
//!
//! Loads are tracked per epoch (see [`OptionsIdentity::epoch`]):
//!
//! - [`start_load_if_pending`](ScriptLoadingController::start_load_if_pending)
//!   starts at most one load per epoch;
//! - a completion is applied only if the epoch it started under is still the
//!   current one and the controller has not been torn down.
//!
//! The network fetch itself is never aborted; stale results are dropped.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, error, warn};

use crate::error::PayPalError;
use crate::identity::OptionsIdentity;
use crate::loader::ScriptLoader;
use crate::options::ScriptOptions;
use crate::state::{Action, DerivedStatus, LoadingStatus, ScriptState, StatusChange};

type Listener = Rc<dyn Fn(&ScriptState)>;

struct Inner {
    state: RefCell<ScriptState>,
    loader: Rc<dyn ScriptLoader>,
    in_flight: Cell<Option<u64>>,
    torn_down: Cell<bool>,
    listeners: RefCell<Vec<(usize, Listener)>>,
    next_listener: Cell<usize>,
}

#[derive(Clone)]
pub struct ScriptLoadingController {
    inner: Rc<Inner>,
}

impl ScriptLoadingController {
    /// Create a controller in `Initial` (deferred) or `Pending` state.
    ///
    /// Nothing is loaded until [`start_load_if_pending`](Self::start_load_if_pending).
    pub fn new(options: ScriptOptions, defer_loading: bool, loader: Rc<dyn ScriptLoader>) -> Self {
        let state = ScriptState::initialize(options, defer_loading);
        debug!("script controller created for {} ({})", state.identity(), state.status());
        ScriptLoadingController {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                loader,
                in_flight: Cell::new(None),
                torn_down: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ScriptState {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> LoadingStatus {
        self.inner.state.borrow().status()
    }

    pub fn identity(&self) -> OptionsIdentity {
        self.inner.state.borrow().identity().clone()
    }

    pub fn derived(&self) -> DerivedStatus {
        self.inner.state.borrow().derived()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }

    /// Apply an action. `ResetOptions` also removes the script injected for
    /// the previous identity. No-op after teardown.
    pub fn dispatch(&self, action: Action) {
        if self.is_torn_down() {
            debug!("ignoring {:?} after teardown", action);
            return;
        }
        if matches!(action, Action::ResetOptions(_)) {
            let previous = self.identity();
            self.inner.loader.remove(&previous);
            self.inner.in_flight.set(None);
        }
        let next = self.inner.state.borrow().reduce(action);
        self.commit(next);
    }

    pub fn set_loading_status(&self, change: StatusChange) {
        self.dispatch(Action::SetLoadingStatus(change));
    }

    pub fn reset_options(&self, options: ScriptOptions) {
        self.dispatch(Action::ResetOptions(options));
    }

    /// Start the loader if the state is `Pending` and nothing is in flight for
    /// the current epoch.
    ///
    /// Returns the completion future; the caller decides how to drive it
    /// (`wasm_bindgen_futures::spawn_local` in the browser).
    pub fn start_load_if_pending(&self) -> Option<LocalBoxFuture<'static, ()>> {
        if self.is_torn_down() {
            return None;
        }
        let (options, identity) = {
            let state = self.inner.state.borrow();
            if state.status() != LoadingStatus::Pending {
                return None;
            }
            (state.options().clone(), state.identity().clone())
        };
        let epoch = identity.epoch();
        if self.inner.in_flight.get() == Some(epoch) {
            debug!("load for {} already in flight", identity);
            return None;
        }
        self.inner.in_flight.set(Some(epoch));
        debug!("loading SDK script {}", identity);

        let load = self.inner.loader.load(&options, &identity);
        let inner = Rc::downgrade(&self.inner);
        Some(
            async move {
                let outcome = load.await;
                if let Some(controller) = Self::upgrade(&inner) {
                    controller.settle(epoch, outcome);
                }
            }
            .boxed_local(),
        )
    }

    /// Stop applying results and notifying listeners. Idempotent.
    pub fn teardown(&self) {
        if !self.inner.torn_down.replace(true) {
            debug!("script controller for {} torn down", self.identity());
            self.inner.listeners.borrow_mut().clear();
        }
    }

    /// Call `listener` after every state change; unsubscribes on drop.
    pub fn subscribe(&self, listener: impl Fn(&ScriptState) + 'static) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| ScriptLoadingController { inner })
    }

    fn settle(&self, epoch: u64, outcome: Result<(), PayPalError>) {
        if self.is_torn_down() {
            debug!("dropping load result for epoch {epoch} after teardown");
            return;
        }
        let current = self.identity();
        if current.epoch() != epoch {
            warn!("dropping stale load result for epoch {epoch}, current is {current}");
            return;
        }
        if self.inner.in_flight.get() == Some(epoch) {
            self.inner.in_flight.set(None);
        }
        let change = match outcome {
            Ok(()) => StatusChange::Resolved,
            Err(err) => {
                error!("failed to load SDK script {current}: {err}");
                StatusChange::Rejected(err.to_string())
            }
        };
        self.dispatch(Action::SetLoadingStatus(change));
    }

    fn commit(&self, next: ScriptState) {
        {
            let mut state = self.inner.state.borrow_mut();
            if *state == next {
                return;
            }
            *state = next;
        }
        self.notify();
    }

    fn notify(&self) {
        let snapshot = self.state();
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

impl PartialEq for ScriptLoadingController {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ScriptLoadingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptLoadingController")
            .field("state", &*self.inner.state.borrow())
            .field("in_flight", &self.inner.in_flight.get())
            .field("torn_down", &self.inner.torn_down.get())
            .finish()
    }
}

/// Listener registration returned by [`ScriptLoadingController::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    inner: Weak<Inner>,
    id: usize,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::block_on;

    type Settle = oneshot::Sender<Result<(), PayPalError>>;

    /// Loader whose loads settle when the test says so.
    #[derive(Default)]
    struct MockLoader {
        calls: RefCell<Vec<ScriptOptions>>,
        removed: RefCell<Vec<String>>,
        pending: RefCell<Vec<Settle>>,
    }

    impl MockLoader {
        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        /// Settle the `index`-th load issued so far.
        fn settle(&self, index: usize, outcome: Result<(), PayPalError>) {
            let sender = std::mem::replace(
                &mut self.pending.borrow_mut()[index],
                oneshot::channel().0,
            );
            sender.send(outcome).unwrap();
        }
    }

    impl ScriptLoader for MockLoader {
        fn load(
            &self,
            options: &ScriptOptions,
            _identity: &OptionsIdentity,
        ) -> LocalBoxFuture<'static, Result<(), PayPalError>> {
            let (tx, rx) = oneshot::channel();
            self.calls.borrow_mut().push(options.clone());
            self.pending.borrow_mut().push(tx);
            rx.map(|received| {
                received.unwrap_or_else(|_| Err(PayPalError::LoadFailure("dropped".into())))
            })
            .boxed_local()
        }

        fn remove(&self, identity: &OptionsIdentity) {
            self.removed.borrow_mut().push(identity.script_id().to_owned());
        }
    }

    fn controller(options: ScriptOptions, defer: bool) -> (ScriptLoadingController, Rc<MockLoader>) {
        let loader = Rc::new(MockLoader::default());
        (ScriptLoadingController::new(options, defer, loader.clone()), loader)
    }

    #[test]
    fn pending_load_resolves() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), false);
        assert_eq!(controller.status(), LoadingStatus::Pending);

        let load = controller.start_load_if_pending().expect("load should start");
        loader.settle(0, Ok(()));
        block_on(load);

        assert_eq!(controller.status(), LoadingStatus::Resolved);
        assert!(controller.derived().is_resolved);
        assert_eq!(loader.call_count(), 1);
    }

    #[test]
    fn deferred_load_waits_for_start() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), true);
        assert_eq!(controller.status(), LoadingStatus::Initial);
        assert!(controller.start_load_if_pending().is_none());
        assert_eq!(loader.call_count(), 0);

        controller.set_loading_status(StatusChange::Pending);
        let load = controller.start_load_if_pending().expect("load should start");
        assert_eq!(loader.call_count(), 1);

        loader.settle(0, Ok(()));
        block_on(load);
        assert_eq!(controller.status(), LoadingStatus::Resolved);
    }

    #[test]
    fn reset_reloads_with_new_options() {
        let (controller, loader) = controller(ScriptOptions::new("abc"), false);
        let first = controller.start_load_if_pending().unwrap();
        loader.settle(0, Ok(()));
        block_on(first);
        let old_script_id = controller.identity().script_id().to_owned();

        controller.reset_options(ScriptOptions::new("xyz").disable_funding("card"));
        assert_eq!(controller.status(), LoadingStatus::Pending);
        assert_eq!(*loader.removed.borrow(), vec![old_script_id]);

        let second = controller.start_load_if_pending().unwrap();
        loader.settle(1, Ok(()));
        block_on(second);

        assert_eq!(controller.status(), LoadingStatus::Resolved);
        let calls = loader.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].client_id(), Some("abc"));
        assert_eq!(calls[1].client_id(), Some("xyz"));
        assert_eq!(calls[1].get("disable-funding"), Some("card"));
    }

    #[test]
    fn rejection_is_captured_as_state() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), false);
        let load = controller.start_load_if_pending().unwrap();
        loader.settle(0, Err(PayPalError::LoadFailure("Network error".into())));
        block_on(load);

        let state = controller.state();
        assert_eq!(state.status(), LoadingStatus::Rejected);
        assert_eq!(state.error_message(), Some("Network error"));
    }

    #[test]
    fn pending_load_is_started_once() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), false);
        let first = controller.start_load_if_pending();
        let second = controller.start_load_if_pending();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(loader.call_count(), 1);
    }

    #[test]
    fn reset_yields_new_identity_for_identical_options() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), false);
        let load = controller.start_load_if_pending().unwrap();
        loader.settle(0, Ok(()));
        block_on(load);
        let before = controller.identity();

        controller.reset_options(ScriptOptions::new("sb"));
        let after = controller.identity();

        assert_eq!(controller.status(), LoadingStatus::Pending);
        assert_ne!(before, after);
        assert!(controller.start_load_if_pending().is_some());
        assert_eq!(loader.call_count(), 2);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (controller, loader) = controller(ScriptOptions::new("one"), false);
        let stale = controller.start_load_if_pending().unwrap();

        controller.reset_options(ScriptOptions::new("two"));
        let fresh = controller.start_load_if_pending().unwrap();

        loader.settle(1, Ok(()));
        block_on(fresh);
        assert_eq!(controller.status(), LoadingStatus::Resolved);

        loader.settle(0, Err(PayPalError::LoadFailure("old".into())));
        block_on(stale);

        let state = controller.state();
        assert_eq!(state.status(), LoadingStatus::Resolved);
        assert_eq!(state.options().client_id(), Some("two"));
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn stale_completion_does_not_settle_a_pending_reload() {
        let (controller, loader) = controller(ScriptOptions::new("one"), false);
        let stale = controller.start_load_if_pending().unwrap();
        controller.reset_options(ScriptOptions::new("two"));

        loader.settle(0, Ok(()));
        block_on(stale);

        assert_eq!(controller.status(), LoadingStatus::Pending);
        assert!(controller.start_load_if_pending().is_some());
    }

    #[test]
    fn teardown_silences_late_completion() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), false);
        let seen = Rc::new(Cell::new(0));
        let _subscription = controller.subscribe({
            let seen = seen.clone();
            move |_| seen.set(seen.get() + 1)
        });

        let load = controller.start_load_if_pending().unwrap();
        controller.teardown();
        loader.settle(0, Ok(()));
        block_on(load);

        assert_eq!(controller.status(), LoadingStatus::Pending);
        assert_eq!(seen.get(), 0);
        assert!(controller.start_load_if_pending().is_none());
    }

    #[test]
    fn completion_after_drop_is_a_no_op() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), false);
        let load = controller.start_load_if_pending().unwrap();
        drop(controller);
        loader.settle(0, Ok(()));
        block_on(load);
    }

    #[test]
    fn listeners_fire_only_on_change() {
        let (controller, loader) = controller(ScriptOptions::new("sb"), true);
        let statuses = Rc::new(RefCell::new(Vec::new()));
        let subscription = controller.subscribe({
            let statuses = statuses.clone();
            move |state: &ScriptState| statuses.borrow_mut().push(state.status())
        });

        controller.set_loading_status(StatusChange::Pending);
        controller.set_loading_status(StatusChange::Pending);
        let load = controller.start_load_if_pending().unwrap();
        loader.settle(0, Ok(()));
        block_on(load);
        controller.set_loading_status(StatusChange::Initial);

        assert_eq!(
            *statuses.borrow(),
            vec![LoadingStatus::Pending, LoadingStatus::Resolved]
        );

        drop(subscription);
        controller.reset_options(ScriptOptions::new("other"));
        assert_eq!(statuses.borrow().len(), 2);
    }

    #[test]
    fn listener_may_dispatch_reentrantly() {
        let (controller, _loader) = controller(ScriptOptions::new("sb"), true);
        let _subscription = controller.subscribe({
            let controller = controller.clone();
            move |state: &ScriptState| {
                if state.status() == LoadingStatus::Pending {
                    controller.set_loading_status(StatusChange::Rejected("nope".into()));
                }
            }
        });

        controller.set_loading_status(StatusChange::Pending);
        assert_eq!(controller.status(), LoadingStatus::Rejected);
    }
}
