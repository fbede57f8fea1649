//! Rust handlers exposed to the SDK as JavaScript functions.
//!
//! The SDK calls `createOrder`, `onApprove`, ... with `(data, actions)` and
//! expects a `Promise` back from the asynchronous ones. [`AsyncCallback`] is
//! the prop type for those handlers; [`JsCallbacks`] turns Rust closures into
//! JS functions and keeps them alive as long as the SDK object using them.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use gloo_utils::format::JsValueSerdeExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::{self, Promise};

use crate::error::PayPalError;

/// The `(data, actions)` pair every SDK callback receives.
#[derive(Clone, Debug)]
pub struct SdkCallbackArgs {
    pub data: JsValue,
    pub actions: JsValue,
}

impl SdkCallbackArgs {
    /// Deserialize `data`, e.g. into [`ApproveData`].
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, PayPalError> {
        Ok(self.data.into_serde::<T>()?)
    }
}

/// `data` passed to `onApprove`.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApproveData {
    #[serde(rename = "orderID", default)]
    pub order_id: Option<String>,
    #[serde(rename = "payerID", default)]
    pub payer_id: Option<String>,
    #[serde(rename = "paymentID", default)]
    pub payment_id: Option<String>,
    #[serde(rename = "subscriptionID", default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub billing_token: Option<String>,
    #[serde(default)]
    pub facilitator_access_token: Option<String>,
    #[serde(default)]
    pub payment_source: Option<String>,
}

type AsyncFn<IN, OUT> = dyn Fn(IN) -> LocalBoxFuture<'static, Result<OUT, String>>;

/// An async handler prop; compares by pointer like `yew::Callback`.
///
/// The `Err` string is turned into a rejected `Promise` for the SDK.
pub struct AsyncCallback<IN, OUT> {
    inner: Rc<AsyncFn<IN, OUT>>,
}

impl<IN: 'static, OUT: 'static> AsyncCallback<IN, OUT> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(IN) -> Fut + 'static,
        Fut: Future<Output = Result<OUT, String>> + 'static,
    {
        AsyncCallback {
            inner: Rc::new(move |input| f(input).boxed_local()),
        }
    }
}

impl<IN, OUT> AsyncCallback<IN, OUT> {
    pub fn emit(&self, input: IN) -> LocalBoxFuture<'static, Result<OUT, String>> {
        (self.inner)(input)
    }
}

impl<IN, OUT> Clone for AsyncCallback<IN, OUT> {
    fn clone(&self) -> Self {
        AsyncCallback {
            inner: self.inner.clone(),
        }
    }
}

impl<IN, OUT> PartialEq for AsyncCallback<IN, OUT> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<IN, OUT> fmt::Debug for AsyncCallback<IN, OUT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncCallback<_>")
    }
}

/// Owns the `Closure`s handed to one SDK object.
#[derive(Default)]
pub struct JsCallbacks {
    closures: Vec<Box<dyn Any>>,
}

impl JsCallbacks {
    /// Keep `closure` alive and return the JS function backing it.
    pub fn keep<T: ?Sized + 'static>(&mut self, closure: Closure<T>) -> JsValue {
        let function: JsValue = closure.as_ref().clone();
        self.closures.push(Box::new(closure));
        function
    }

    /// `(data, actions) => Promise`
    pub fn promise_fn(
        &mut self,
        f: impl Fn(SdkCallbackArgs) -> LocalBoxFuture<'static, Result<JsValue, String>> + 'static,
    ) -> JsValue {
        let closure = Closure::wrap(Box::new(move |data: JsValue, actions: JsValue| -> Promise {
            let future = f(SdkCallbackArgs { data, actions });
            future_to_promise(async move {
                future
                    .await
                    .map_err(|message| js_sys::Error::new(&message).into())
            })
        }) as Box<dyn FnMut(JsValue, JsValue) -> Promise>);
        self.keep(closure)
    }

    /// `(data, actions) => void`
    pub fn args_fn(&mut self, f: impl Fn(SdkCallbackArgs) + 'static) -> JsValue {
        let closure = Closure::wrap(Box::new(move |data: JsValue, actions: JsValue| {
            f(SdkCallbackArgs { data, actions })
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        self.keep(closure)
    }

    /// `(value) => void`
    pub fn value_fn(&mut self, f: impl Fn(JsValue) + 'static) -> JsValue {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(JsValue)>);
        self.keep(closure)
    }

    pub fn len(&self) -> usize {
        self.closures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closures.is_empty()
    }
}

impl fmt::Debug for JsCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsCallbacks")
            .field("closures", &self.closures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn async_callback_compares_by_pointer() {
        let a: AsyncCallback<u32, u32> = AsyncCallback::new(|n| async move { Ok(n + 1) });
        let b = a.clone();
        let c: AsyncCallback<u32, u32> = AsyncCallback::new(|n| async move { Ok(n + 1) });

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn async_callback_emits_result() {
        let create_order: AsyncCallback<&'static str, String> =
            AsyncCallback::new(|prefix| async move { Ok(format!("{prefix}-ORDER-1")) });
        assert_eq!(block_on(create_order.emit("TEST")), Ok("TEST-ORDER-1".to_string()));

        let failing: AsyncCallback<(), ()> =
            AsyncCallback::new(|_| async { Err("declined".to_string()) });
        assert_eq!(block_on(failing.emit(())), Err("declined".to_string()));
    }

    #[test]
    fn approve_data_uses_sdk_field_names() {
        let data: ApproveData = serde_json::from_str(
            r#"{"orderID":"5O190127TN364715T","payerID":"FSMVU44LF3YUS","facilitatorAccessToken":"A21"}"#,
        )
        .unwrap();
        assert_eq!(data.order_id.as_deref(), Some("5O190127TN364715T"));
        assert_eq!(data.payer_id.as_deref(), Some("FSMVU44LF3YUS"));
        assert_eq!(data.facilitator_access_token.as_deref(), Some("A21"));
        assert_eq!(data.subscription_id, None);
    }
}
