//! `PayPalButtons`: Smart Payment Buttons via `paypal.Buttons(options)`.
//!
//! # Example
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_paypal::{AsyncCallback, ApproveData, PayPalButtons, SdkCallbackArgs};
//!
//! #[function_component(Checkout)]
//! fn checkout() -> Html {
//!     let create_order = AsyncCallback::new(|_args: SdkCallbackArgs| async {
//!         // call your backend, return the order id
//!         Ok::<_, String>("5O190127TN364715T".to_string())
//!     });
//!     let on_approve = AsyncCallback::new(|args: SdkCallbackArgs| async move {
//!         let data: ApproveData = args.data_as().map_err(|e| e.to_string())?;
//!         log::info!("approved {:?}", data.order_id);
//!         Ok(())
//!     });
//!     html! {
//!         <PayPalButtons create_order={Some(create_order)} on_approve={Some(on_approve)} />
//!     }
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use log::debug;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;
use yew::prelude::*;

use super::{await_cleanup, await_render, report, set_property, to_js_object};
use crate::bindings::{ButtonActions, ButtonsInstance};
use crate::callback::{AsyncCallback, JsCallbacks, SdkCallbackArgs};
use crate::context::use_paypal_script;
use crate::error::{js_message, PayPalError};
use crate::namespace::{lookup_constructor, WindowNamespace, BUTTONS};

const TAG: &str = "PayPalButtons";

/// Serializable part of the `paypal.Buttons` options.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ButtonsOptions {
    /// Button style (`layout`, `color`, `shape`, `label`, `height`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<serde_json::Value>,

    /// Render a single button for this funding source, e.g. `"paypal"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_source: Option<String>,

    /// Any other JSON-serializable option.
    #[serde(flatten)]
    pub extra: Option<serde_json::Value>,
}

/// Properties for [`PayPalButtons`].
///
/// Handlers are read at call time, so replacing them does not re-render the
/// buttons. Changing `options` or `force_re_render` does.
#[derive(Properties, PartialEq, Clone)]
pub struct PayPalButtonsProps {
    #[prop_or_default]
    pub options: ButtonsOptions,
    #[prop_or_default]
    pub create_order: Option<AsyncCallback<SdkCallbackArgs, String>>,
    #[prop_or_default]
    pub create_subscription: Option<AsyncCallback<SdkCallbackArgs, String>>,
    #[prop_or_default]
    pub create_billing_agreement: Option<AsyncCallback<SdkCallbackArgs, String>>,
    #[prop_or_default]
    pub on_approve: Option<AsyncCallback<SdkCallbackArgs, ()>>,
    #[prop_or_default]
    pub on_shipping_change: Option<AsyncCallback<SdkCallbackArgs, ()>>,
    #[prop_or_default]
    pub on_cancel: Option<Callback<SdkCallbackArgs>>,
    #[prop_or_default]
    pub on_click: Option<Callback<SdkCallbackArgs>>,
    #[prop_or_default]
    pub on_init: Option<Callback<SdkCallbackArgs>>,
    /// The SDK's own `onError`.
    #[prop_or_default]
    pub on_error: Option<Callback<PayPalError>>,
    /// Missing `Buttons` component, render failures.
    #[prop_or_default]
    pub on_render_error: Callback<PayPalError>,
    /// Extra values that force a re-render when they change.
    #[prop_or_default]
    pub force_re_render: Vec<AttrValue>,
    #[prop_or_default]
    pub disabled: bool,
    #[prop_or_default]
    pub class: Classes,
    /// Rendered instead of the buttons when they are not eligible.
    #[prop_or_default]
    pub children: Children,
}

type Latest = Rc<RefCell<PayPalButtonsProps>>;
type Actions = Rc<RefCell<Option<ButtonActions>>>;

#[function_component(PayPalButtons)]
pub fn paypal_buttons(props: &PayPalButtonsProps) -> Html {
    let script = use_paypal_script();
    let container = use_node_ref();
    let eligible = use_state_eq(|| true);
    let actions: Actions = use_mut_ref(|| None);
    let latest: Latest = use_mut_ref(|| props.clone());
    *latest.borrow_mut() = props.clone();

    {
        let namespace = script.namespace().to_owned();
        let components = script.options().get("components").map(str::to_owned);
        let container = container.clone();
        let eligible = eligible.clone();
        let actions = actions.clone();
        let latest = latest.clone();
        let deps = (
            script.derived().is_resolved,
            script.identity().clone(),
            props.options.clone(),
            props.force_re_render.clone(),
        );
        use_effect_with(deps, move |(is_resolved, _, options, _)| {
            let mut mounted: Option<(ButtonsInstance, JsCallbacks)> = None;
            if *is_resolved {
                let on_render_error = latest.borrow().on_render_error.clone();
                match create_buttons(&namespace, components.as_deref(), options, &latest, &actions) {
                    Ok((instance, callbacks)) => match instance.is_eligible() {
                        Ok(true) => {
                            eligible.set(true);
                            if let Some(element) = container.cast::<HtmlElement>() {
                                match instance.render(&element) {
                                    Ok(promise) => await_render(TAG, element, promise, on_render_error),
                                    Err(err) => report(TAG, PayPalError::from_js(err), &on_render_error),
                                }
                            }
                            mounted = Some((instance, callbacks));
                        }
                        Ok(false) => {
                            debug!("<{TAG} /> is not eligible for {:?}", options.funding_source);
                            eligible.set(false);
                        }
                        Err(err) => report(TAG, PayPalError::from_js(err), &on_render_error),
                    },
                    Err(err) => report(TAG, err, &on_render_error),
                }
            }
            move || {
                actions.borrow_mut().take();
                if let Some((instance, callbacks)) = mounted {
                    await_cleanup(TAG, instance.close(), callbacks);
                }
            }
        });
    }

    {
        let actions = actions.clone();
        use_effect_with(props.disabled, move |disabled| {
            apply_disabled(actions.borrow().as_ref(), *disabled);
            || ()
        });
    }

    html! {
        <>
            <div ref={container} class={props.class.clone()} />
            if !*eligible {
                { for props.children.iter() }
            }
        </>
    }
}

fn create_buttons(
    namespace: &str,
    components: Option<&str>,
    options: &ButtonsOptions,
    latest: &Latest,
    actions: &Actions,
) -> Result<(ButtonsInstance, JsCallbacks), PayPalError> {
    let constructor = lookup_constructor(&WindowNamespace, namespace, &BUTTONS, components)?;
    let js_options = to_js_object(options)?;
    let mut callbacks = JsCallbacks::default();

    {
        let props = latest.borrow();
        if props.create_order.is_some() {
            let f = callbacks.promise_fn(forward(latest, |p| p.create_order.clone(), JsValue::from));
            set_property(&js_options, "createOrder", &f)?;
        }
        if props.create_subscription.is_some() {
            let f = callbacks.promise_fn(forward(latest, |p| p.create_subscription.clone(), JsValue::from));
            set_property(&js_options, "createSubscription", &f)?;
        }
        if props.create_billing_agreement.is_some() {
            let f = callbacks.promise_fn(forward(latest, |p| p.create_billing_agreement.clone(), JsValue::from));
            set_property(&js_options, "createBillingAgreement", &f)?;
        }
        if props.on_approve.is_some() {
            let f = callbacks.promise_fn(forward(latest, |p| p.on_approve.clone(), |()| JsValue::UNDEFINED));
            set_property(&js_options, "onApprove", &f)?;
        }
        if props.on_shipping_change.is_some() {
            let f = callbacks.promise_fn(forward(latest, |p| p.on_shipping_change.clone(), |()| JsValue::UNDEFINED));
            set_property(&js_options, "onShippingChange", &f)?;
        }
    }

    let on_cancel = {
        let latest = latest.clone();
        callbacks.args_fn(move |args| {
            if let Some(cb) = latest.borrow().on_cancel.clone() {
                cb.emit(args);
            }
        })
    };
    set_property(&js_options, "onCancel", &on_cancel)?;

    let on_click = {
        let latest = latest.clone();
        callbacks.args_fn(move |args| {
            if let Some(cb) = latest.borrow().on_click.clone() {
                cb.emit(args);
            }
        })
    };
    set_property(&js_options, "onClick", &on_click)?;

    let on_error = {
        let latest = latest.clone();
        callbacks.value_fn(move |err| {
            let err = PayPalError::Js(js_message(&err));
            match latest.borrow().on_error.clone() {
                Some(cb) => cb.emit(err),
                None => log::error!("<{TAG} /> SDK error: {err}"),
            }
        })
    };
    set_property(&js_options, "onError", &on_error)?;

    let on_init = {
        let latest = latest.clone();
        let actions = actions.clone();
        callbacks.args_fn(move |args| {
            let handle: ButtonActions = args.actions.clone().unchecked_into();
            let props = latest.borrow().clone();
            apply_disabled(Some(&handle), props.disabled);
            *actions.borrow_mut() = Some(handle);
            if let Some(cb) = props.on_init {
                cb.emit(args);
            }
        })
    };
    set_property(&js_options, "onInit", &on_init)?;

    let instance = constructor
        .call1(&JsValue::NULL, &js_options)
        .map_err(PayPalError::from_js)?
        .unchecked_into::<ButtonsInstance>();
    Ok((instance, callbacks))
}

/// JS-facing handler that calls whichever async prop is current at call time.
fn forward<OUT: 'static>(
    latest: &Latest,
    pick: fn(&PayPalButtonsProps) -> Option<AsyncCallback<SdkCallbackArgs, OUT>>,
    into_js: fn(OUT) -> JsValue,
) -> impl Fn(SdkCallbackArgs) -> LocalBoxFuture<'static, Result<JsValue, String>> + 'static {
    let latest = latest.clone();
    move |args| match pick(&latest.borrow()) {
        Some(cb) => cb.emit(args).map(move |result| result.map(into_js)).boxed_local(),
        None => future::ready(Err(format!("<{TAG} /> handler was removed"))).boxed_local(),
    }
}

fn apply_disabled(actions: Option<&ButtonActions>, disabled: bool) {
    let Some(actions) = actions else { return };
    let result = if disabled { actions.disable() } else { actions.enable() };
    if let Err(err) = result {
        debug!("<{TAG} /> could not toggle disabled: {}", js_message(&err));
    }
}
