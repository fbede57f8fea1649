//! `BraintreePayPalButtons`: PayPal buttons backed by a Braintree
//! `paypalCheckout` instance.
//!
//! Loads the Braintree `client` and `paypal-checkout` scripts, creates the
//! checkout instance from the provider's `data-client-token`, then renders
//! [`PayPalButtons`] whose handlers also receive that instance.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::Object;
use yew::prelude::*;

use super::buttons::{ButtonsOptions, PayPalButtons};
use super::{await_cleanup, report, set_property, to_js_object};
use crate::bindings::{BraintreeFactory, BraintreePayPalCheckout};
use crate::callback::{AsyncCallback, SdkCallbackArgs};
use crate::context::use_paypal_script;
use crate::error::{js_message, PayPalError};
use crate::loader::load_custom_script;
use crate::namespace::{lookup_member, WindowNamespace, BRAINTREE_CLIENT, BRAINTREE_PAYPAL_CHECKOUT};
use crate::options::BRAINTREE_NAMESPACE;

const TAG: &str = "BraintreePayPalButtons";

/// Braintree web SDK version loaded unless overridden.
pub const BRAINTREE_VERSION: &str = "3.92.0";

/// `(client, paypal-checkout)` script URLs for a Braintree version.
pub fn braintree_script_urls(version: &str) -> (String, String) {
    let base = format!("https://js.braintreegateway.com/web/{version}/js");
    (
        format!("{base}/client.min.js"),
        format!("{base}/paypal-checkout.min.js"),
    )
}

/// SDK callback arguments plus the Braintree checkout instance.
#[derive(Clone, Debug)]
pub struct BraintreeCallbackArgs {
    pub data: JsValue,
    pub actions: JsValue,
    pub braintree: BraintreePayPalCheckout,
}

#[derive(Properties, PartialEq, Clone)]
pub struct BraintreePayPalButtonsProps {
    #[prop_or_default]
    pub options: ButtonsOptions,
    #[prop_or_default]
    pub create_order: Option<AsyncCallback<BraintreeCallbackArgs, String>>,
    #[prop_or_default]
    pub create_billing_agreement: Option<AsyncCallback<BraintreeCallbackArgs, String>>,
    #[prop_or_default]
    pub on_approve: Option<AsyncCallback<BraintreeCallbackArgs, ()>>,
    #[prop_or_default]
    pub on_cancel: Option<Callback<SdkCallbackArgs>>,
    #[prop_or_default]
    pub on_error: Option<Callback<PayPalError>>,
    #[prop_or_default]
    pub on_render_error: Callback<PayPalError>,
    #[prop_or_default]
    pub force_re_render: Vec<AttrValue>,
    #[prop_or_default]
    pub disabled: bool,
    #[prop_or_default]
    pub class: Classes,
    #[prop_or(AttrValue::Static(BRAINTREE_VERSION))]
    pub braintree_version: AttrValue,
    #[prop_or_default]
    pub children: Children,
}

#[derive(Serialize)]
struct ClientOptions<'a> {
    authorization: &'a str,
}

#[function_component(BraintreePayPalButtons)]
pub fn braintree_paypal_buttons(props: &BraintreePayPalButtonsProps) -> Html {
    let script = use_paypal_script();
    let checkout = use_state(|| None::<BraintreePayPalCheckout>);

    {
        let checkout = checkout.clone();
        let on_render_error = props.on_render_error.clone();
        let deps = (
            script.options().client_token().map(str::to_owned),
            props.braintree_version.clone(),
        );
        use_effect_with(deps, move |(client_token, version)| {
            let cancelled = Rc::new(Cell::new(false));
            let created = Rc::new(RefCell::new(None::<BraintreePayPalCheckout>));

            match client_token.clone() {
                None => report(TAG, PayPalError::MissingClientToken(TAG), &on_render_error),
                Some(token) => {
                    let version = version.to_string();
                    let cancelled = cancelled.clone();
                    let created = created.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        match create_checkout(&token, &version).await {
                            Ok(instance) if cancelled.get() => {
                                await_cleanup(TAG, instance.teardown(), ());
                            }
                            Ok(instance) => {
                                *created.borrow_mut() = Some(instance.clone());
                                checkout.set(Some(instance));
                            }
                            Err(_) if cancelled.get() => {}
                            Err(err) => report(TAG, err, &on_render_error),
                        }
                    });
                }
            }

            move || {
                cancelled.set(true);
                if let Some(instance) = created.borrow_mut().take() {
                    await_cleanup(TAG, instance.teardown(), ());
                }
            }
        });
    }

    let Some(instance) = (*checkout).clone() else {
        return html! { <div class={props.class.clone()} /> };
    };

    html! {
        <PayPalButtons
            options={props.options.clone()}
            create_order={decorate(&props.create_order, &instance)}
            create_billing_agreement={decorate(&props.create_billing_agreement, &instance)}
            on_approve={decorate(&props.on_approve, &instance)}
            on_cancel={props.on_cancel.clone()}
            on_error={props.on_error.clone()}
            on_render_error={props.on_render_error.clone()}
            force_re_render={props.force_re_render.clone()}
            disabled={props.disabled}
            class={props.class.clone()}
        >
            { for props.children.iter() }
        </PayPalButtons>
    }
}

/// Adapt a Braintree-aware handler to the plain SDK handler shape.
fn decorate<OUT: 'static>(
    handler: &Option<AsyncCallback<BraintreeCallbackArgs, OUT>>,
    instance: &BraintreePayPalCheckout,
) -> Option<AsyncCallback<SdkCallbackArgs, OUT>> {
    let handler = handler.clone()?;
    let instance = instance.clone();
    Some(AsyncCallback::new(move |args: SdkCallbackArgs| {
        handler.emit(BraintreeCallbackArgs {
            data: args.data,
            actions: args.actions,
            braintree: instance.clone(),
        })
    }))
}

/// Load the Braintree scripts and create a `paypalCheckout` instance.
async fn create_checkout(client_token: &str, version: &str) -> Result<BraintreePayPalCheckout, PayPalError> {
    let (client_url, checkout_url) = braintree_script_urls(version);
    load_custom_script(&client_url, std::iter::empty()).await?;
    load_custom_script(&checkout_url, std::iter::empty()).await?;

    let client_factory: BraintreeFactory =
        lookup_member(&WindowNamespace, BRAINTREE_NAMESPACE, &BRAINTREE_CLIENT, None)?.unchecked_into();
    let client_options = to_js_object(&ClientOptions {
        authorization: client_token,
    })?;
    let client = JsFuture::from(client_factory.create(&client_options).map_err(PayPalError::from_js)?)
        .await
        .map_err(|err| PayPalError::LoadFailure(format!("braintree.client.create failed: {}", js_message(&err))))?;

    let checkout_factory: BraintreeFactory =
        lookup_member(&WindowNamespace, BRAINTREE_NAMESPACE, &BRAINTREE_PAYPAL_CHECKOUT, None)?.unchecked_into();
    let checkout_options = Object::new();
    set_property(&checkout_options, "client", &client)?;
    let checkout = JsFuture::from(checkout_factory.create(&checkout_options).map_err(PayPalError::from_js)?)
        .await
        .map_err(|err| {
            PayPalError::LoadFailure(format!("braintree.paypalCheckout.create failed: {}", js_message(&err)))
        })?;
    Ok(checkout.unchecked_into())
}
