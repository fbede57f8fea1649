//! yew_paypal/src/bindings.rs
//!
//! Low-level wasm-bindgen bindings to objects handed out by the PayPal JS SDK
//! and the Braintree web SDK.
//!
//! The constructors themselves (`paypal.Buttons`, `paypal.Marks`, ...) are
//! looked up at runtime through [`crate::namespace`], because the SDK can be
//! installed under any `data-namespace`. Their return values are typed here.

use wasm_bindgen::prelude::*;
use web_sys::js_sys::Promise;
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
    //------------------------------------------------------------------------------
    // Smart Payment Buttons
    //------------------------------------------------------------------------------

    /// `paypal.Buttons(options)` → buttons instance.
    #[derive(Debug, Clone)]
    pub type ButtonsInstance;

    #[wasm_bindgen(method, catch, js_name = isEligible)]
    pub fn is_eligible(this: &ButtonsInstance) -> Result<bool, JsValue>;

    /// `buttons.render(container)` → JS `Promise`
    #[wasm_bindgen(method, catch)]
    pub fn render(this: &ButtonsInstance, container: &HtmlElement) -> Result<Promise, JsValue>;

    /// `buttons.close()` → JS `Promise`
    #[wasm_bindgen(method, catch)]
    pub fn close(this: &ButtonsInstance) -> Result<Promise, JsValue>;

    /// `actions` passed to the buttons' `onInit(data, actions)`.
    #[derive(Debug, Clone)]
    pub type ButtonActions;

    #[wasm_bindgen(method, catch)]
    pub fn enable(this: &ButtonActions) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    pub fn disable(this: &ButtonActions) -> Result<JsValue, JsValue>;

    //------------------------------------------------------------------------------
    // Marks / Messages / Hosted Buttons
    //------------------------------------------------------------------------------

    /// `paypal.Marks(options)` → marks instance.
    #[derive(Debug, Clone)]
    pub type MarksInstance;

    #[wasm_bindgen(method, catch, js_name = isEligible)]
    pub fn is_eligible(this: &MarksInstance) -> Result<bool, JsValue>;

    /// Returns a `Promise` on current SDK versions, `undefined` on older ones.
    #[wasm_bindgen(method, catch)]
    pub fn render(this: &MarksInstance, container: &HtmlElement) -> Result<JsValue, JsValue>;

    /// `paypal.Messages(options)` → messages instance.
    #[derive(Debug, Clone)]
    pub type MessagesInstance;

    #[wasm_bindgen(method, catch)]
    pub fn render(this: &MessagesInstance, container: &HtmlElement) -> Result<Promise, JsValue>;

    /// `paypal.HostedButtons({ hostedButtonId })` → hosted buttons instance.
    #[derive(Debug, Clone)]
    pub type HostedButtonsInstance;

    #[wasm_bindgen(method, catch)]
    pub fn render(this: &HostedButtonsInstance, container: &HtmlElement) -> Result<Promise, JsValue>;

    //------------------------------------------------------------------------------
    // Hosted Fields
    //------------------------------------------------------------------------------

    /// The `paypal.HostedFields` object itself.
    #[derive(Debug, Clone)]
    pub type HostedFieldsNamespace;

    #[wasm_bindgen(method, catch, js_name = isEligible)]
    pub fn is_eligible(this: &HostedFieldsNamespace) -> Result<bool, JsValue>;

    /// `HostedFields.render({ createOrder, styles, fields })` → `Promise<HostedFieldsInstance>`
    #[wasm_bindgen(method, catch)]
    pub fn render(this: &HostedFieldsNamespace, options: &JsValue) -> Result<Promise, JsValue>;

    /// Resolved value of `HostedFields.render`.
    #[derive(Debug, Clone)]
    pub type HostedFieldsInstance;

    /// `cardFields.submit(options)` → JS `Promise`
    #[wasm_bindgen(method, catch)]
    pub fn submit(this: &HostedFieldsInstance, options: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getState)]
    pub fn get_state(this: &HostedFieldsInstance) -> Result<JsValue, JsValue>;

    /// `cardFields.teardown()` → JS `Promise`
    #[wasm_bindgen(method, catch)]
    pub fn teardown(this: &HostedFieldsInstance) -> Result<Promise, JsValue>;

    //------------------------------------------------------------------------------
    // Braintree
    //------------------------------------------------------------------------------

    /// `braintree.client` / `braintree.paypalCheckout` factory objects.
    #[derive(Debug, Clone)]
    pub type BraintreeFactory;

    /// `factory.create(options)` → JS `Promise`
    #[wasm_bindgen(method, catch)]
    pub fn create(this: &BraintreeFactory, options: &JsValue) -> Result<Promise, JsValue>;

    /// Resolved value of `braintree.paypalCheckout.create`.
    #[derive(Debug, Clone)]
    pub type BraintreePayPalCheckout;

    /// `checkout.teardown()` → JS `Promise`
    #[wasm_bindgen(method, catch)]
    pub fn teardown(this: &BraintreePayPalCheckout) -> Result<Promise, JsValue>;
}
