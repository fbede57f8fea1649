//! Yew components wrapping the SDK's UI constructors.
//!
//! Every component here reads the provider state through
//! [`use_paypal_script`](crate::use_paypal_script), does nothing until the
//! SDK is resolved, renders into a container `<div>` it owns and releases the
//! SDK widget when its dependencies change or it unmounts. Side effects are
//! keyed on `(is_resolved, identity, explicit deps)` only.

mod braintree;
mod buttons;
mod hosted_buttons;
mod hosted_fields;
mod marks;
mod messages;

pub use braintree::*;
pub use buttons::*;
pub use hosted_buttons::*;
pub use hosted_fields::*;
pub use marks::*;
pub use messages::*;

use gloo_utils::format::JsValueSerdeExt;
use log::{debug, error};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Object, Promise, Reflect};
use web_sys::HtmlElement;
use yew::prelude::*;

use crate::error::{js_message, PayPalError};

/// Log `err` and hand it to the component's error callback.
pub(crate) fn report(tag: &'static str, err: PayPalError, on_error: &Callback<PayPalError>) {
    error!("<{tag} />: {err}");
    on_error.emit(err);
}

/// Await an SDK `render` promise.
///
/// A rejection is only reported while `container` is still attached; after
/// an unmount it is expected and ignored.
pub(crate) fn await_render(
    tag: &'static str,
    container: HtmlElement,
    promise: Promise,
    on_error: Callback<PayPalError>,
) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(value) = JsFuture::from(promise).await {
            let message = js_message(&value);
            if !container.is_connected() {
                debug!("<{tag} /> render rejected after unmount: {message}");
                return;
            }
            report(tag, PayPalError::RenderRejection { tag, message }, &on_error);
        }
    });
}

/// Await a cleanup promise (`close`, `teardown`), keeping `guard` alive until
/// it settles.
pub(crate) fn await_cleanup<G: 'static>(tag: &'static str, promise: Result<Promise, JsValue>, guard: G) {
    match promise {
        Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
            if let Err(value) = JsFuture::from(promise).await {
                debug!("<{tag} /> cleanup rejected: {}", js_message(&value));
            }
            drop(guard);
        }),
        Err(value) => debug!("<{tag} /> cleanup threw: {}", js_message(&value)),
    }
}

/// Serialize options into a plain JS object (not an ES `Map`).
pub(crate) fn to_js_object<T: Serialize>(value: &T) -> Result<Object, PayPalError> {
    JsValue::from_serde(value)?
        .dyn_into::<Object>()
        .map_err(|_| PayPalError::Serialize("options did not serialize to an object".into()))
}

pub(crate) fn set_property(target: &Object, key: &str, value: &JsValue) -> Result<(), PayPalError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(PayPalError::from_js)
}
