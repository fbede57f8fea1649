//! Errors surfaced by the PayPal script core and its components.

use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys;

/// Everything that can go wrong between loading the SDK and rendering a widget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayPalError {
    /// The loader rejected: network error, blocked resource, bad configuration.
    #[error("{0}")]
    LoadFailure(String),

    /// A hook was called outside of its provider.
    #[error("{hook} must be used within a {provider}")]
    MissingProviderContext {
        hook: &'static str,
        provider: &'static str,
    },

    /// The namespace resolved but lacks the requested constructor.
    #[error("{message}")]
    MissingNamespaceCapability {
        tag: &'static str,
        namespace: String,
        path: &'static str,
        message: String,
    },

    /// An SDK render promise rejected while its container was still attached.
    #[error("failed to render <{tag} />: {message}")]
    RenderRejection { tag: &'static str, message: String },

    #[error("<{0} /> requires a client token; set `data-client-token` on the PayPalScriptProvider options")]
    MissingClientToken(&'static str),

    #[error("hosted fields are missing required children: {0}")]
    MissingHostedFields(String),

    #[error("invalid SDK url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("browser environment unavailable: {0}")]
    Environment(&'static str),

    #[error("JavaScript error: {0}")]
    Js(String),
}

/// What the SDKs put on rejected promises, when they bother to.
#[derive(Deserialize)]
struct JsErrorShape {
    message: String,
}

impl PayPalError {
    /// Single message builder for every "component not loaded" failure.
    ///
    /// `component` is the value to add to the `components` query parameter;
    /// `None` for namespaces that are not configured that way (Braintree).
    pub fn missing_capability(
        tag: &'static str,
        namespace: &str,
        path: &'static str,
        component: Option<&str>,
        loaded_components: Option<&str>,
    ) -> Self {
        let mut message =
            format!("Unable to render <{tag} /> because window.{namespace}.{path} is undefined.");
        match component {
            Some(component) => {
                let suggestion = match loaded_components.filter(|c| !c.is_empty()) {
                    Some(loaded) => format!("{loaded},{component}"),
                    None => component.to_string(),
                };
                message.push_str(&format!(
                    "\nTo fix the issue, add '{component}' to the list of components passed to the parent PayPalScriptProvider: ScriptOptions::new(client_id).components(\"{suggestion}\")"
                ));
            }
            None => message.push_str(&format!(
                "\nMake sure the {namespace} scripts finished loading before rendering <{tag} />."
            )),
        }
        PayPalError::MissingNamespaceCapability {
            tag,
            namespace: namespace.to_string(),
            path,
            message,
        }
    }

    /// Best-effort conversion of a thrown value or promise rejection.
    pub fn from_js(value: JsValue) -> Self {
        PayPalError::Js(js_message(&value))
    }
}

/// Human-readable text of a JS error value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    if let Some(text) = value.as_string() {
        return text;
    }
    serde_wasm_bindgen::from_value::<JsErrorShape>(value.clone())
        .map(|shape| shape.message)
        .unwrap_or_else(|_| format!("{:?}", value))
}

impl From<serde_wasm_bindgen::Error> for PayPalError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        PayPalError::Serialize(err.to_string())
    }
}

impl From<serde_json::Error> for PayPalError {
    fn from(err: serde_json::Error) -> Self {
        PayPalError::Serialize(err.to_string())
    }
}
