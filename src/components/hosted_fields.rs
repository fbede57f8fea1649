//! Hosted card fields: `PayPalHostedFieldsProvider` renders
//! `paypal.HostedFields` into the `PayPalHostedField` children registered
//! below it and publishes the resulting card-fields instance.
//!
//! # Example
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_paypal::*;
//!
//! #[function_component(CardForm)]
//! fn card_form() -> Html {
//!     let create_order = AsyncCallback::new(|_| async { Ok::<_, String>("ORDER-ID".into()) });
//!     html! {
//!         <PayPalHostedFieldsProvider {create_order}>
//!             <PayPalHostedField hosted_field_type={HostedFieldType::Number}
//!                 options={HostedFieldOptions::new("#card-number")} />
//!             <PayPalHostedField hosted_field_type={HostedFieldType::Cvv}
//!                 options={HostedFieldOptions::new("#cvv")} />
//!             <PayPalHostedField hosted_field_type={HostedFieldType::ExpirationDate}
//!                 options={HostedFieldOptions::new("#expiration-date")} />
//!             <SubmitButton />
//!         </PayPalHostedFieldsProvider>
//!     }
//! }
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::FutureExt;
use log::debug;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::Promise;
use yew::prelude::*;

use super::{await_cleanup, report, set_property, to_js_object};
use crate::bindings::{HostedFieldsInstance, HostedFieldsNamespace};
use crate::callback::{AsyncCallback, JsCallbacks, SdkCallbackArgs};
use crate::context::{require_context, use_paypal_script};
use crate::error::{js_message, PayPalError};
use crate::namespace::{lookup_member, WindowNamespace, HOSTED_FIELDS};

const TAG: &str = "PayPalHostedFieldsProvider";

const REQUIRED_FIELDS: [HostedFieldType; 3] = [
    HostedFieldType::Number,
    HostedFieldType::Cvv,
    HostedFieldType::ExpirationDate,
];

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum HostedFieldType {
    Number,
    Cvv,
    ExpirationDate,
    ExpirationMonth,
    ExpirationYear,
    PostalCode,
}

impl HostedFieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            HostedFieldType::Number => "number",
            HostedFieldType::Cvv => "cvv",
            HostedFieldType::ExpirationDate => "expirationDate",
            HostedFieldType::ExpirationMonth => "expirationMonth",
            HostedFieldType::ExpirationYear => "expirationYear",
            HostedFieldType::PostalCode => "postalCode",
        }
    }
}

/// Per-field options; `selector` must point at the field's container.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HostedFieldOptions {
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(flatten)]
    pub extra: Option<serde_json::Value>,
}

impl HostedFieldOptions {
    pub fn new(selector: impl Into<String>) -> Self {
        HostedFieldOptions {
            selector: selector.into(),
            ..Default::default()
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// `id` for the container when the selector is an id selector.
    fn element_id(&self) -> Option<&str> {
        self.selector.strip_prefix('#')
    }
}

type FieldRegistry = Rc<RefCell<BTreeMap<HostedFieldType, HostedFieldOptions>>>;

/// Fields missing from `registered`, comma separated, or `None` if complete.
fn missing_fields(registered: &BTreeMap<HostedFieldType, HostedFieldOptions>) -> Option<String> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !registered.contains_key(field))
        .map(|field| field.as_str())
        .collect();
    (!missing.is_empty()).then(|| missing.join(", "))
}

#[derive(Serialize)]
struct RenderOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    styles: Option<&'a serde_json::Value>,
    fields: BTreeMap<&'static str, &'a HostedFieldOptions>,
}

/// Published by [`PayPalHostedFieldsProvider`].
#[derive(Clone, Debug)]
pub struct HostedFieldsContext {
    registry: FieldRegistry,
    instance: Option<HostedFieldsInstance>,
}

impl HostedFieldsContext {
    /// The rendered card fields, once available.
    pub fn instance(&self) -> Option<&HostedFieldsInstance> {
        self.instance.as_ref()
    }

    /// `cardFields.submit(options)`.
    pub async fn submit(&self, options: &serde_json::Value) -> Result<JsValue, PayPalError> {
        let instance = self
            .instance
            .as_ref()
            .ok_or(PayPalError::Environment("hosted fields are not rendered yet"))?;
        let options = to_js_object(options)?;
        let promise = instance.submit(&options).map_err(PayPalError::from_js)?;
        JsFuture::from(promise).await.map_err(PayPalError::from_js)
    }

    fn register(&self, field: HostedFieldType, options: HostedFieldOptions) {
        self.registry.borrow_mut().insert(field, options);
    }

    fn unregister(&self, field: HostedFieldType) {
        self.registry.borrow_mut().remove(&field);
    }
}

impl PartialEq for HostedFieldsContext {
    fn eq(&self, other: &Self) -> bool {
        let same_instance = match (&self.instance, &other.instance) {
            (Some(a), Some(b)) => AsRef::<JsValue>::as_ref(a) == AsRef::<JsValue>::as_ref(b),
            (None, None) => true,
            _ => false,
        };
        Rc::ptr_eq(&self.registry, &other.registry) && same_instance
    }
}

#[hook]
pub fn use_try_paypal_hosted_fields() -> Result<HostedFieldsContext, PayPalError> {
    require_context(
        use_context::<HostedFieldsContext>(),
        "use_paypal_hosted_fields",
        "PayPalHostedFieldsProvider",
    )
}

/// # Panics
/// When called outside of a [`PayPalHostedFieldsProvider`].
#[hook]
pub fn use_paypal_hosted_fields() -> HostedFieldsContext {
    match use_try_paypal_hosted_fields() {
        Ok(context) => context,
        Err(err) => panic!("{err}"),
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct PayPalHostedFieldsProviderProps {
    pub create_order: AsyncCallback<SdkCallbackArgs, String>,
    #[prop_or_default]
    pub styles: Option<serde_json::Value>,
    /// Rendered instead of the children when card fields are not eligible.
    #[prop_or_default]
    pub not_eligible: Option<Html>,
    #[prop_or_default]
    pub on_render_error: Callback<PayPalError>,
    #[prop_or_default]
    pub children: Children,
}

#[function_component(PayPalHostedFieldsProvider)]
pub fn paypal_hosted_fields_provider(props: &PayPalHostedFieldsProviderProps) -> Html {
    let script = use_paypal_script();
    let registry: FieldRegistry = use_mut_ref(BTreeMap::new);
    let published = use_state(|| None::<HostedFieldsInstance>);
    let eligible = use_state_eq(|| true);
    let create_order = use_mut_ref(|| props.create_order.clone());
    *create_order.borrow_mut() = props.create_order.clone();

    {
        let client_token = script.options().client_token().map(str::to_owned);
        let namespace = script.namespace().to_owned();
        let components = script.options().get("components").map(str::to_owned);
        let registry = registry.clone();
        let published = published.clone();
        let eligible = eligible.clone();
        let create_order = create_order.clone();
        let on_render_error = props.on_render_error.clone();
        let deps = (
            script.derived().is_resolved,
            script.identity().clone(),
            props.styles.clone(),
        );
        use_effect_with(deps, move |(is_resolved, _, styles)| {
            let cancelled = Rc::new(Cell::new(false));
            let current = Rc::new(RefCell::new(None::<HostedFieldsInstance>));
            let mut callbacks = JsCallbacks::default();

            if *is_resolved {
                let rendered = render_fields(
                    &namespace,
                    components.as_deref(),
                    client_token.is_some(),
                    &registry,
                    styles.as_ref(),
                    &create_order,
                    &mut callbacks,
                )
                .map(|promise| {
                    eligible.set(promise.is_some());
                    promise
                });

                match rendered {
                    Ok(Some(promise)) => {
                        let cancelled = cancelled.clone();
                        let current = current.clone();
                        let published = published.clone();
                        let on_render_error = on_render_error.clone();
                        wasm_bindgen_futures::spawn_local(async move {
                            match JsFuture::from(promise).await {
                                Ok(value) => {
                                    let instance: HostedFieldsInstance = value.unchecked_into();
                                    if cancelled.get() {
                                        await_cleanup(TAG, instance.teardown(), ());
                                        return;
                                    }
                                    *current.borrow_mut() = Some(instance.clone());
                                    published.set(Some(instance));
                                }
                                Err(err) if !cancelled.get() => report(
                                    TAG,
                                    PayPalError::RenderRejection { tag: TAG, message: js_message(&err) },
                                    &on_render_error,
                                ),
                                Err(err) => debug!("<{TAG} /> render rejected after unmount: {}", js_message(&err)),
                            }
                        });
                    }
                    Ok(None) => {}
                    Err(err) => report(TAG, err, &on_render_error),
                }
            }

            move || {
                cancelled.set(true);
                match current.borrow_mut().take() {
                    Some(instance) => await_cleanup(TAG, instance.teardown(), callbacks),
                    None => drop(callbacks),
                }
            }
        });
    }

    if !*eligible {
        return props.not_eligible.clone().unwrap_or_default();
    }

    let context = HostedFieldsContext {
        registry,
        instance: (*published).clone(),
    };
    html! {
        <ContextProvider<HostedFieldsContext> {context}>
            { for props.children.iter() }
        </ContextProvider<HostedFieldsContext>>
    }
}

/// Validate the setup and start `HostedFields.render`.
///
/// `Ok(None)` when card fields are not eligible for this buyer.
fn render_fields(
    namespace: &str,
    components: Option<&str>,
    has_client_token: bool,
    registry: &FieldRegistry,
    styles: Option<&serde_json::Value>,
    create_order: &Rc<RefCell<AsyncCallback<SdkCallbackArgs, String>>>,
    callbacks: &mut JsCallbacks,
) -> Result<Option<Promise>, PayPalError> {
    if !has_client_token {
        return Err(PayPalError::MissingClientToken(TAG));
    }
    let hosted_fields: HostedFieldsNamespace =
        lookup_member(&WindowNamespace, namespace, &HOSTED_FIELDS, components)?.unchecked_into();
    if !hosted_fields.is_eligible().map_err(PayPalError::from_js)? {
        debug!("<{TAG} /> card fields are not eligible");
        return Ok(None);
    }

    let registered = registry.borrow();
    if let Some(missing) = missing_fields(&registered) {
        return Err(PayPalError::MissingHostedFields(missing));
    }
    let options = to_js_object(&RenderOptions {
        styles,
        fields: registered.iter().map(|(k, v)| (k.as_str(), v)).collect(),
    })?;
    let handler = {
        let create_order = create_order.clone();
        callbacks.promise_fn(move |args| {
            let cb = create_order.borrow().clone();
            async move { cb.emit(args).await.map(JsValue::from) }.boxed_local()
        })
    };
    set_property(&options, "createOrder", &handler)?;
    hosted_fields
        .render(&options)
        .map(Some)
        .map_err(PayPalError::from_js)
}

#[derive(Properties, PartialEq, Clone)]
pub struct PayPalHostedFieldProps {
    pub hosted_field_type: HostedFieldType,
    pub options: HostedFieldOptions,
    #[prop_or_default]
    pub class: Classes,
}

/// Container for one hosted card field. Registers itself with the enclosing
/// [`PayPalHostedFieldsProvider`] while rendering and unregisters on unmount.
#[function_component(PayPalHostedField)]
pub fn paypal_hosted_field(props: &PayPalHostedFieldProps) -> Html {
    let fields = use_paypal_hosted_fields();
    fields.register(props.hosted_field_type, props.options.clone());

    {
        let fields = fields.clone();
        use_effect_with(props.hosted_field_type, move |field| {
            let field = *field;
            move || fields.unregister(field)
        });
    }

    let id = props.options.element_id().map(|id| AttrValue::from(id.to_owned()));
    html! {
        <div id={id} class={props.class.clone()} />
    }
}
