//! `PayPalMessages`: Pay Later messaging via `paypal.Messages(options)`.

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;
use yew::prelude::*;

use super::{await_render, report, to_js_object};
use crate::bindings::MessagesInstance;
use crate::context::use_paypal_script;
use crate::error::PayPalError;
use crate::namespace::{lookup_constructor, WindowNamespace, MESSAGES};

const TAG: &str = "PayPalMessages";

/// Options for `paypal.Messages`.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// `home`, `category`, `product`, `cart` or `payment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: Option<serde_json::Value>,
}

#[derive(Properties, PartialEq, Clone)]
pub struct PayPalMessagesProps {
    #[prop_or_default]
    pub options: MessagesOptions,
    #[prop_or_default]
    pub force_re_render: Vec<AttrValue>,
    #[prop_or_default]
    pub on_render_error: Callback<PayPalError>,
    #[prop_or_default]
    pub class: Classes,
}

#[function_component(PayPalMessages)]
pub fn paypal_messages(props: &PayPalMessagesProps) -> Html {
    let script = use_paypal_script();
    let container = use_node_ref();

    {
        let namespace = script.namespace().to_owned();
        let components = script.options().get("components").map(str::to_owned);
        let container = container.clone();
        let on_render_error = props.on_render_error.clone();
        let deps = (
            script.derived().is_resolved,
            script.identity().clone(),
            props.options.clone(),
            props.force_re_render.clone(),
        );
        use_effect_with(deps, move |(is_resolved, _, options, _)| {
            if *is_resolved {
                let rendered = create_messages(&namespace, components.as_deref(), options).and_then(|messages| {
                    let Some(element) = container.cast::<HtmlElement>() else {
                        return Ok(());
                    };
                    element.set_inner_html("");
                    let promise = messages.render(&element).map_err(PayPalError::from_js)?;
                    await_render(TAG, element, promise, on_render_error.clone());
                    Ok(())
                });
                if let Err(err) = rendered {
                    report(TAG, err, &on_render_error);
                }
            }
            move || {
                if let Some(element) = container.cast::<HtmlElement>() {
                    element.set_inner_html("");
                }
            }
        });
    }

    html! {
        <div ref={container} class={props.class.clone()} />
    }
}

fn create_messages(
    namespace: &str,
    components: Option<&str>,
    options: &MessagesOptions,
) -> Result<MessagesInstance, PayPalError> {
    let constructor = lookup_constructor(&WindowNamespace, namespace, &MESSAGES, components)?;
    let js_options = to_js_object(options)?;
    Ok(constructor
        .call1(&JsValue::NULL, &js_options)
        .map_err(PayPalError::from_js)?
        .unchecked_into::<MessagesInstance>())
}
