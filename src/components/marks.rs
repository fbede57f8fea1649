//! `PayPalMarks`: funding-source marks via `paypal.Marks(options)`.

use log::debug;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::Promise;
use web_sys::HtmlElement;
use yew::prelude::*;

use super::{await_render, report, to_js_object};
use crate::bindings::MarksInstance;
use crate::context::use_paypal_script;
use crate::error::PayPalError;
use crate::namespace::{lookup_constructor, WindowNamespace, MARKS};

const TAG: &str = "PayPalMarks";

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarksOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_source: Option<String>,
}

#[derive(Properties, PartialEq, Clone)]
pub struct PayPalMarksProps {
    #[prop_or_default]
    pub funding_source: Option<AttrValue>,
    #[prop_or_default]
    pub on_render_error: Callback<PayPalError>,
    #[prop_or_default]
    pub class: Classes,
    /// Rendered when the mark is not eligible.
    #[prop_or_default]
    pub children: Children,
}

#[function_component(PayPalMarks)]
pub fn paypal_marks(props: &PayPalMarksProps) -> Html {
    let script = use_paypal_script();
    let container = use_node_ref();
    let eligible = use_state_eq(|| true);

    {
        let namespace = script.namespace().to_owned();
        let components = script.options().get("components").map(str::to_owned);
        let container = container.clone();
        let eligible = eligible.clone();
        let on_render_error = props.on_render_error.clone();
        let deps = (
            script.derived().is_resolved,
            script.identity().clone(),
            props.funding_source.clone(),
        );
        use_effect_with(deps, move |(is_resolved, _, funding_source)| {
            if *is_resolved {
                let options = MarksOptions {
                    funding_source: funding_source.as_ref().map(|s| s.to_string()),
                };
                match create_marks(&namespace, components.as_deref(), &options) {
                    Ok(mark) => match mark.is_eligible() {
                        Ok(true) => {
                            eligible.set(true);
                            if let Some(element) = container.cast::<HtmlElement>() {
                                element.set_inner_html("");
                                match mark.render(&element) {
                                    Ok(value) => {
                                        if let Ok(promise) = value.dyn_into::<Promise>() {
                                            await_render(TAG, element, promise, on_render_error);
                                        }
                                    }
                                    Err(err) => report(TAG, PayPalError::from_js(err), &on_render_error),
                                }
                            }
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
                if let Some(element) = container.cast::<HtmlElement>() {
                    element.set_inner_html("");
                }
            }
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

fn create_marks(
    namespace: &str,
    components: Option<&str>,
    options: &MarksOptions,
) -> Result<MarksInstance, PayPalError> {
    let constructor = lookup_constructor(&WindowNamespace, namespace, &MARKS, components)?;
    let js_options = to_js_object(options)?;
    Ok(constructor
        .call1(&JsValue::NULL, &js_options)
        .map_err(PayPalError::from_js)?
        .unchecked_into::<MarksInstance>())
}
