//! Context published by [`PayPalScriptProvider`](crate::PayPalScriptProvider)
//! and the hooks dependents use to read it.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_paypal::use_paypal_script;
//!
//! #[function_component(LoadingBadge)]
//! fn loading_badge() -> Html {
//!     let script = use_paypal_script();
//!     let status = script.derived();
//!     html! {
//!         if status.is_pending {
//!             <p>{ "⏳ Loading PayPal…" }</p>
//!         } else if status.is_rejected {
//!             <p>{ script.error_message().unwrap_or_default() }</p>
//!         }
//!     }
//! }
//! ```

use yew::prelude::*;

use crate::controller::ScriptLoadingController;
use crate::error::PayPalError;
use crate::identity::OptionsIdentity;
use crate::options::ScriptOptions;
use crate::state::{Action, DerivedStatus, LoadingStatus, ScriptState};

const HOOK: &str = "use_paypal_script";
const PROVIDER: &str = "PayPalScriptProvider";

/// Snapshot of the provider's state plus a handle to dispatch actions.
///
/// Two contexts are equal when their snapshots are, which is what keeps
/// dependents from re-rendering on unrelated provider renders.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptContext {
    state: ScriptState,
    controller: ScriptLoadingController,
}

impl ScriptContext {
    pub fn new(state: ScriptState, controller: ScriptLoadingController) -> Self {
        ScriptContext { state, controller }
    }

    pub fn state(&self) -> &ScriptState {
        &self.state
    }

    pub fn options(&self) -> &ScriptOptions {
        self.state.options()
    }

    pub fn identity(&self) -> &OptionsIdentity {
        self.state.identity()
    }

    pub fn status(&self) -> LoadingStatus {
        self.state.status()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.state.error_message()
    }

    pub fn derived(&self) -> DerivedStatus {
        self.state.derived()
    }

    /// Global the SDK is installed under.
    pub fn namespace(&self) -> &str {
        self.state.options().namespace()
    }

    pub fn dispatch(&self, action: Action) {
        self.controller.dispatch(action);
    }

    pub fn controller(&self) -> &ScriptLoadingController {
        &self.controller
    }
}

pub(crate) fn require_context<T>(
    context: Option<T>,
    hook: &'static str,
    provider: &'static str,
) -> Result<T, PayPalError> {
    context.ok_or(PayPalError::MissingProviderContext { hook, provider })
}

/// Fallible form of [`use_paypal_script`].
#[hook]
pub fn use_try_paypal_script() -> Result<ScriptContext, PayPalError> {
    require_context(use_context::<ScriptContext>(), HOOK, PROVIDER)
}

/// Read the enclosing provider's script state.
///
/// # Panics
/// When called outside of a [`PayPalScriptProvider`](crate::PayPalScriptProvider).
#[hook]
pub fn use_paypal_script() -> ScriptContext {
    match use_try_paypal_script() {
        Ok(context) => context,
        Err(err) => panic!("{err}"),
    }
}
