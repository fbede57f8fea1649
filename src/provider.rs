//! `PayPalScriptProvider`: owns a [`ScriptLoadingController`] and publishes
//! its state to every dependent below it.
//!
//! # Example
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_paypal::{PayPalButtons, PayPalScriptProvider, ScriptOptions};
//!
//! #[function_component(App)]
//! fn app() -> Html {
//!     let options = ScriptOptions::new("test").currency("USD");
//!     html! {
//!         <PayPalScriptProvider {options}>
//!             <PayPalButtons />
//!         </PayPalScriptProvider>
//!     }
//! }
//! ```

use std::rc::Rc;

use yew::prelude::*;

use crate::context::ScriptContext;
use crate::controller::ScriptLoadingController;
use crate::identity::script_id_for;
use crate::loader::{ScriptLoader, SdkScriptLoader};
use crate::options::ScriptOptions;
use crate::state::{Action, LoadingStatus, ScriptState, StatusChange};

/// Loader handle comparable by pointer, so it can travel through props.
#[derive(Clone)]
pub struct LoaderHandle(pub Rc<dyn ScriptLoader>);

impl PartialEq for LoaderHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Properties for [`PayPalScriptProvider`].
///
/// * `options` – SDK configuration. Changing it (by content) reloads the SDK.
/// * `defer_loading` – start in `Initial`; the SDK loads once this turns
///   `false` or a dependent dispatches `SetLoadingStatus(Pending)`.
/// * `loader` – override the browser loader.
#[derive(Properties, PartialEq)]
pub struct PayPalScriptProviderProps {
    pub options: ScriptOptions,
    #[prop_or_default]
    pub defer_loading: bool,
    #[prop_or_default]
    pub loader: Option<LoaderHandle>,
    #[prop_or_default]
    pub children: Children,
}

#[function_component(PayPalScriptProvider)]
pub fn paypal_script_provider(props: &PayPalScriptProviderProps) -> Html {
    let controller = {
        let options = props.options.clone();
        let defer_loading = props.defer_loading;
        let loader = props
            .loader
            .as_ref()
            .map(|handle| handle.0.clone())
            .unwrap_or_else(|| Rc::new(SdkScriptLoader));
        use_memo((), move |_| ScriptLoadingController::new(options, defer_loading, loader))
    };
    let state = {
        let controller = controller.clone();
        use_state_eq(move || controller.state())
    };

    // Mirror controller changes into component state; tear down on unmount.
    {
        let controller = controller.clone();
        let state = state.clone();
        use_effect_with((), move |_| {
            let subscription = {
                let state = state.clone();
                controller.subscribe(move |next: &ScriptState| state.set(next.clone()))
            };
            state.set(controller.state());
            move || {
                drop(subscription);
                controller.teardown();
            }
        });
    }

    // Options changed by content: drop the old script and reload.
    {
        let controller = controller.clone();
        use_effect_with(props.options.clone(), move |options| {
            if script_id_for(options) != controller.identity().script_id() {
                controller.dispatch(Action::ResetOptions(options.clone()));
            }
            || ()
        });
    }

    {
        let controller = controller.clone();
        use_effect_with(props.defer_loading, move |defer_loading| {
            if !*defer_loading && controller.status() == LoadingStatus::Initial {
                controller.dispatch(Action::SetLoadingStatus(StatusChange::Pending));
            }
            || ()
        });
    }

    {
        let controller = controller.clone();
        let key = (state.status(), state.identity().epoch());
        use_effect_with(key, move |_| {
            if let Some(load) = controller.start_load_if_pending() {
                wasm_bindgen_futures::spawn_local(load);
            }
            || ()
        });
    }

    let context = ScriptContext::new((*state).clone(), (*controller).clone());
    html! {
        <ContextProvider<ScriptContext> {context}>
            { for props.children.iter() }
        </ContextProvider<ScriptContext>>
    }
}
