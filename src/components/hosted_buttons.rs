//! `PayPalHostedButtons`: no-code buttons configured in the PayPal dashboard.

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;
use yew::prelude::*;

use super::{await_render, report, to_js_object};
use crate::bindings::HostedButtonsInstance;
use crate::context::use_paypal_script;
use crate::error::PayPalError;
use crate::namespace::{lookup_constructor, WindowNamespace, HOSTED_BUTTONS};

const TAG: &str = "PayPalHostedButtons";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HostedButtonsOptions<'a> {
    hosted_button_id: &'a str,
}

#[derive(Properties, PartialEq, Clone)]
pub struct PayPalHostedButtonsProps {
    pub hosted_button_id: AttrValue,
    #[prop_or_default]
    pub on_render_error: Callback<PayPalError>,
    #[prop_or_default]
    pub class: Classes,
}

#[function_component(PayPalHostedButtons)]
pub fn paypal_hosted_buttons(props: &PayPalHostedButtonsProps) -> Html {
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
            props.hosted_button_id.clone(),
        );
        use_effect_with(deps, move |(is_resolved, _, hosted_button_id)| {
            if *is_resolved {
                let rendered = create_hosted_buttons(&namespace, components.as_deref(), hosted_button_id)
                    .and_then(|buttons| {
                        let Some(element) = container.cast::<HtmlElement>() else {
                            return Ok(());
                        };
                        element.set_inner_html("");
                        let promise = buttons.render(&element).map_err(PayPalError::from_js)?;
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

fn create_hosted_buttons(
    namespace: &str,
    components: Option<&str>,
    hosted_button_id: &str,
) -> Result<HostedButtonsInstance, PayPalError> {
    let constructor = lookup_constructor(&WindowNamespace, namespace, &HOSTED_BUTTONS, components)?;
    let js_options = to_js_object(&HostedButtonsOptions { hosted_button_id })?;
    Ok(constructor
        .call1(&JsValue::NULL, &js_options)
        .map_err(PayPalError::from_js)?
        .unchecked_into::<HostedButtonsInstance>())
}
