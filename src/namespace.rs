//! Access to the SDK globals (`window.paypal`, `window.braintree`).
//!
//! Components never read `window` directly; they go through a
//! [`NamespaceResolver`] so lookups can be swapped out in tests.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::{Function, Reflect};

use crate::error::PayPalError;

pub trait NamespaceResolver {
    /// The global registered under `key`, if it exists and is not `null`.
    fn resolve(&self, key: &str) -> Option<JsValue>;
}

/// Reads properties of the browser `window`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowNamespace;

impl NamespaceResolver for WindowNamespace {
    fn resolve(&self, key: &str) -> Option<JsValue> {
        let window = web_sys::window()?;
        Reflect::get(&window, &JsValue::from_str(key))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
    }
}

/// A member of an SDK namespace a component depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdkComponent {
    /// Component name used in error messages, e.g. `PayPalButtons`.
    pub tag: &'static str,
    /// Property on the namespace, e.g. `Buttons`.
    pub path: &'static str,
    /// Value for the `components` query parameter, when applicable.
    pub component: Option<&'static str>,
}

pub const BUTTONS: SdkComponent = SdkComponent {
    tag: "PayPalButtons",
    path: "Buttons",
    component: Some("buttons"),
};

pub const MARKS: SdkComponent = SdkComponent {
    tag: "PayPalMarks",
    path: "Marks",
    component: Some("marks"),
};

pub const MESSAGES: SdkComponent = SdkComponent {
    tag: "PayPalMessages",
    path: "Messages",
    component: Some("messages"),
};

pub const HOSTED_BUTTONS: SdkComponent = SdkComponent {
    tag: "PayPalHostedButtons",
    path: "HostedButtons",
    component: Some("hosted-buttons"),
};

pub const HOSTED_FIELDS: SdkComponent = SdkComponent {
    tag: "PayPalHostedFieldsProvider",
    path: "HostedFields",
    component: Some("hosted-fields"),
};

pub const BRAINTREE_CLIENT: SdkComponent = SdkComponent {
    tag: "BraintreePayPalButtons",
    path: "client",
    component: None,
};

pub const BRAINTREE_PAYPAL_CHECKOUT: SdkComponent = SdkComponent {
    tag: "BraintreePayPalButtons",
    path: "paypalCheckout",
    component: None,
};

/// Look up `namespace.<component.path>`.
///
/// `loaded_components` is the provider's current `components` option and
/// only feeds the error message.
pub fn lookup_member(
    resolver: &dyn NamespaceResolver,
    namespace: &str,
    component: &SdkComponent,
    loaded_components: Option<&str>,
) -> Result<JsValue, PayPalError> {
    resolver
        .resolve(namespace)
        .and_then(|ns| Reflect::get(&ns, &JsValue::from_str(component.path)).ok())
        .filter(|member| !member.is_undefined() && !member.is_null())
        .ok_or_else(|| {
            PayPalError::missing_capability(
                component.tag,
                namespace,
                component.path,
                component.component,
                loaded_components,
            )
        })
}

/// Like [`lookup_member`] but requires the member to be callable.
pub fn lookup_constructor(
    resolver: &dyn NamespaceResolver,
    namespace: &str,
    component: &SdkComponent,
    loaded_components: Option<&str>,
) -> Result<Function, PayPalError> {
    lookup_member(resolver, namespace, component, loaded_components)?
        .dyn_into::<Function>()
        .map_err(|_| {
            PayPalError::missing_capability(
                component.tag,
                namespace,
                component.path,
                component.component,
                loaded_components,
            )
        })
}
