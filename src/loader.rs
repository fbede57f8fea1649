//! loader.rs
//!
//! Injects SDK `<script>` tags into `<head>` and resolves once the SDK global
//! is available.
//!
//! # Overview
//! [`SdkScriptLoader`] is the browser implementation of [`ScriptLoader`]:
//!
//! - the tag's `src` is built from the non-`data-*` options
//!   (see [`ScriptOptions::sdk_url`]), the `data-*` options become attributes;
//! - a tag already carrying the same `data-yew-paypal-script-id` is reused
//!   when `window.<namespace>` is present, so remounting a provider with an
//!   identical configuration does not fetch the SDK twice;
//! - [`ScriptLoader::remove`] deletes tags by script id when the provider's
//!   options are reset.
//!
//! [`load_custom_script`] loads any other script once per `src` (Braintree).

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::Promise;
use web_sys::{Document, HtmlScriptElement};

use crate::error::PayPalError;
use crate::identity::OptionsIdentity;
use crate::namespace::{NamespaceResolver, WindowNamespace};
use crate::options::{ScriptOptions, SCRIPT_ID_ATTRIBUTE};

/// Marks a custom script tag whose `load` event already fired.
const LOADED_ATTRIBUTE: &str = "data-yew-paypal-loaded";

/// Loads and unloads the SDK for a [`ScriptLoadingController`](crate::ScriptLoadingController).
pub trait ScriptLoader {
    /// Load the SDK for `options`; resolves when its namespace is usable.
    fn load(
        &self,
        options: &ScriptOptions,
        identity: &OptionsIdentity,
    ) -> LocalBoxFuture<'static, Result<(), PayPalError>>;

    /// Remove any resource previously injected for `identity`.
    fn remove(&self, identity: &OptionsIdentity);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SdkScriptLoader;

impl ScriptLoader for SdkScriptLoader {
    fn load(
        &self,
        options: &ScriptOptions,
        identity: &OptionsIdentity,
    ) -> LocalBoxFuture<'static, Result<(), PayPalError>> {
        let options = options.clone();
        let script_id = identity.script_id().to_owned();
        async move { load_sdk_script(&options, &script_id).await }.boxed_local()
    }

    fn remove(&self, identity: &OptionsIdentity) {
        if let Err(err) = destroy_sdk_script(identity.script_id()) {
            warn!("could not remove SDK script {}: {}", identity.script_id(), err);
        }
    }
}

/// Inject the SDK described by `options` unless an equivalent tag is loaded.
pub async fn load_sdk_script(options: &ScriptOptions, script_id: &str) -> Result<(), PayPalError> {
    let document = document()?;
    let namespace = options.namespace();

    if let Some(existing) = find_sdk_script(&document, script_id)? {
        if WindowNamespace.resolve(namespace).is_some() {
            debug!("reusing SDK script {script_id}");
            return Ok(());
        }
        existing.remove();
    }

    let url = options.sdk_url()?;
    let script = create_script(&document, url.as_str(), options.script_attributes())?;
    insert_and_wait(&document, &script)
        .await
        .map_err(|_| script_failed(url.as_str()))?;

    if WindowNamespace.resolve(namespace).is_none() {
        return Err(PayPalError::LoadFailure(format!(
            "The window.{namespace} global variable is not available."
        )));
    }
    debug!("loaded SDK script {script_id}");
    Ok(())
}

/// Load an arbitrary script once per `src`, with extra attributes.
pub async fn load_custom_script<'a>(
    src: &str,
    attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<(), PayPalError> {
    let document = document()?;
    let selector = format!("script[src=\"{}\"]", css_escape(src));
    if let Some(existing) = document.query_selector(&selector).map_err(PayPalError::from_js)? {
        if existing.has_attribute(LOADED_ATTRIBUTE) {
            return Ok(());
        }
        existing.remove();
    }

    let script = create_script(&document, src, attributes)?;
    insert_and_wait(&document, &script)
        .await
        .map_err(|_| script_failed(src))?;
    script
        .set_attribute(LOADED_ATTRIBUTE, "")
        .map_err(PayPalError::from_js)?;
    Ok(())
}

/// Remove every SDK tag carrying `script_id`.
pub fn destroy_sdk_script(script_id: &str) -> Result<(), PayPalError> {
    let document = document()?;
    let nodes = document
        .query_selector_all(&script_selector(script_id))
        .map_err(PayPalError::from_js)?;
    for i in 0..nodes.length() {
        if let Some(node) = nodes.item(i) {
            if let Some(parent) = node.parent_node() {
                parent.remove_child(&node).map_err(PayPalError::from_js)?;
            }
        }
    }
    Ok(())
}

fn find_sdk_script(document: &Document, script_id: &str) -> Result<Option<web_sys::Element>, PayPalError> {
    document
        .query_selector(&script_selector(script_id))
        .map_err(PayPalError::from_js)
}

fn script_selector(script_id: &str) -> String {
    format!("script[{}=\"{}\"]", SCRIPT_ID_ATTRIBUTE, css_escape(script_id))
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn document() -> Result<Document, PayPalError> {
    web_sys::window()
        .and_then(|win| win.document())
        .ok_or(PayPalError::Environment("no window.document"))
}

fn create_script<'a>(
    document: &Document,
    src: &str,
    attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<HtmlScriptElement, PayPalError> {
    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(PayPalError::from_js)?
        .dyn_into()
        .map_err(|_| PayPalError::Environment("<script> is not an HtmlScriptElement"))?;
    script.set_src(src);
    for (name, value) in attributes {
        script.set_attribute(name, value).map_err(PayPalError::from_js)?;
    }
    Ok(script)
}

/// Append `script` to `<head>` and wait for its `load` or `error` event.
async fn insert_and_wait(document: &Document, script: &HtmlScriptElement) -> Result<(), PayPalError> {
    let settled = Promise::new(&mut |resolve, reject| {
        script.set_onload(Some(&resolve));
        script.set_onerror(Some(&reject));
    });
    document
        .head()
        .ok_or(PayPalError::Environment("no <head> element"))?
        .append_child(script)
        .map_err(PayPalError::from_js)?;
    let result = JsFuture::from(settled).await;
    script.set_onload(None);
    script.set_onerror(None);
    result.map(|_| ()).map_err(PayPalError::from_js)
}

fn script_failed(src: &str) -> PayPalError {
    PayPalError::LoadFailure(format!(
        "The script \"{src}\" failed to load. Check the HTTP status code and response body in DevTools to learn more."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_targets_script_id_attribute() {
        assert_eq!(
            script_selector("yew-paypal-00ff"),
            "script[data-yew-paypal-script-id=\"yew-paypal-00ff\"]"
        );
    }

    #[test]
    fn selector_escapes_quotes() {
        assert_eq!(css_escape(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn script_failure_names_the_url() {
        let err = script_failed("https://www.paypal.com/sdk/js?client-id=sb");
        assert!(err
            .to_string()
            .starts_with("The script \"https://www.paypal.com/sdk/js?client-id=sb\" failed to load."));
    }
}
