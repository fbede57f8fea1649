//! Browser tests for `PayPalScriptProvider` and its dependents, mounted with
//! `yew::Renderer` over a recording loader.
#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use web_sys::js_sys::{Function, Object, Reflect};
use yew::platform::time::sleep;
use yew::prelude::*;
use yew::AppHandle;

use yew_paypal::{
    script_id_for, use_paypal_script, use_try_paypal_script, LoadingStatus, LoaderHandle, MessagesOptions,
    OptionsIdentity, PayPalError, PayPalMessages, PayPalScriptProvider, ScriptLoader, ScriptOptions,
};

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Default)]
struct RecordingLoader {
    loads: RefCell<Vec<ScriptOptions>>,
    removed: RefCell<Vec<String>>,
    pending: RefCell<Vec<oneshot::Sender<Result<(), PayPalError>>>>,
}

impl RecordingLoader {
    fn load_count(&self) -> usize {
        self.loads.borrow().len()
    }

    fn settle_first(&self, outcome: Result<(), PayPalError>) {
        let sender = self.pending.borrow_mut().remove(0);
        let _ = sender.send(outcome);
    }
}

impl ScriptLoader for RecordingLoader {
    fn load(
        &self,
        options: &ScriptOptions,
        _identity: &OptionsIdentity,
    ) -> LocalBoxFuture<'static, Result<(), PayPalError>> {
        let (tx, rx) = oneshot::channel();
        self.loads.borrow_mut().push(options.clone());
        self.pending.borrow_mut().push(tx);
        rx.map(|received| received.unwrap_or_else(|_| Err(PayPalError::LoadFailure("dropped".into()))))
            .boxed_local()
    }

    fn remove(&self, identity: &OptionsIdentity) {
        self.removed.borrow_mut().push(identity.script_id().to_owned());
    }
}

/// Shared test cell, compared by pointer so it can travel through props.
struct Shared<T>(Rc<RefCell<T>>);

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Shared(Rc::new(RefCell::new(T::default())))
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(self.0.clone())
    }
}

impl<T> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

type Control = Shared<Option<Callback<(ScriptOptions, bool)>>>;

#[derive(Properties, PartialEq)]
struct HarnessProps {
    loader: LoaderHandle,
    options: ScriptOptions,
    defer_loading: bool,
    control: Control,
    statuses: Shared<Vec<LoadingStatus>>,
    #[prop_or_default]
    children: Children,
}

/// Provider whose `options` and `defer_loading` the test can change.
#[function_component(Harness)]
fn harness(props: &HarnessProps) -> Html {
    let config = use_state(|| (props.options.clone(), props.defer_loading));
    {
        let config = config.clone();
        *props.control.0.borrow_mut() = Some(Callback::from(move |next: (ScriptOptions, bool)| config.set(next)));
    }
    let (options, defer_loading) = (*config).clone();

    html! {
        <PayPalScriptProvider {options} {defer_loading} loader={props.loader.clone()}>
            <StatusRecorder statuses={props.statuses.clone()} />
            { for props.children.iter() }
        </PayPalScriptProvider>
    }
}

#[derive(Properties, PartialEq)]
struct StatusRecorderProps {
    statuses: Shared<Vec<LoadingStatus>>,
}

#[function_component(StatusRecorder)]
fn status_recorder(props: &StatusRecorderProps) -> Html {
    let script = use_paypal_script();
    props.statuses.0.borrow_mut().push(script.status());
    html! {}
}

#[derive(Properties, PartialEq)]
struct OutsideProps {
    result: Shared<Option<PayPalError>>,
}

#[function_component(Outside)]
fn outside(props: &OutsideProps) -> Html {
    *props.result.0.borrow_mut() = use_try_paypal_script().err();
    html! {}
}

struct Fixture {
    loader: Rc<RecordingLoader>,
    control: Control,
    statuses: Shared<Vec<LoadingStatus>>,
    handle: AppHandle<Harness>,
}

impl Fixture {
    fn mount(options: ScriptOptions, defer_loading: bool, children: Children) -> Self {
        let loader = Rc::new(RecordingLoader::default());
        let control = Control::default();
        let statuses = Shared::default();
        let props = HarnessProps {
            loader: LoaderHandle(loader.clone()),
            options,
            defer_loading,
            control: control.clone(),
            statuses: statuses.clone(),
            children,
        };
        let handle = yew::Renderer::<Harness>::with_root_and_props(mount_point(), props).render();
        Fixture {
            loader,
            control,
            statuses,
            handle,
        }
    }

    fn configure(&self, options: ScriptOptions, defer_loading: bool) {
        let set = self.control.0.borrow().clone().unwrap();
        set.emit((options, defer_loading));
    }

    fn last_status(&self) -> Option<LoadingStatus> {
        self.statuses.0.borrow().last().copied()
    }
}

fn mount_point() -> web_sys::Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let root = document.create_element("div").unwrap();
    document.body().unwrap().append_child(&root).unwrap();
    root
}

async fn flush() {
    sleep(Duration::from_millis(20)).await;
}

#[wasm_bindgen_test]
async fn clearing_defer_flag_starts_exactly_one_load() {
    let options = ScriptOptions::new("sb");
    let fixture = Fixture::mount(options.clone(), true, Children::default());
    flush().await;
    assert_eq!(fixture.last_status(), Some(LoadingStatus::Initial));
    assert_eq!(fixture.loader.load_count(), 0);

    fixture.configure(options, false);
    flush().await;
    assert_eq!(fixture.last_status(), Some(LoadingStatus::Pending));
    assert_eq!(fixture.loader.load_count(), 1);

    flush().await;
    assert_eq!(fixture.loader.load_count(), 1);

    fixture.loader.settle_first(Ok(()));
    flush().await;
    assert_eq!(fixture.last_status(), Some(LoadingStatus::Resolved));
    fixture.handle.destroy();
}

#[wasm_bindgen_test]
async fn options_change_removes_old_script_and_reloads() {
    let first = ScriptOptions::new("sb").currency("USD");
    let second = ScriptOptions::new("sb").currency("EUR");
    let fixture = Fixture::mount(first.clone(), false, Children::default());
    flush().await;
    assert_eq!(fixture.loader.load_count(), 1);
    fixture.loader.settle_first(Ok(()));
    flush().await;
    assert_eq!(fixture.last_status(), Some(LoadingStatus::Resolved));

    fixture.configure(second, false);
    flush().await;

    assert_eq!(*fixture.loader.removed.borrow(), vec![script_id_for(&first)]);
    assert_eq!(fixture.loader.load_count(), 2);
    assert_eq!(fixture.loader.loads.borrow()[1].get("currency"), Some("EUR"));
    assert_eq!(fixture.last_status(), Some(LoadingStatus::Pending));
    fixture.handle.destroy();
}

#[wasm_bindgen_test]
async fn equal_options_do_not_reload() {
    let fixture = Fixture::mount(ScriptOptions::new("sb"), false, Children::default());
    flush().await;

    fixture.configure(ScriptOptions::new("sb"), false);
    flush().await;

    assert_eq!(fixture.loader.load_count(), 1);
    assert!(fixture.loader.removed.borrow().is_empty());
    fixture.handle.destroy();
}

#[wasm_bindgen_test]
async fn unmount_silences_late_completion() {
    let fixture = Fixture::mount(ScriptOptions::new("sb"), false, Children::default());
    flush().await;
    assert_eq!(fixture.loader.load_count(), 1);
    let recorded = fixture.statuses.0.borrow().len();

    let Fixture {
        loader,
        statuses,
        handle,
        ..
    } = fixture;
    handle.destroy();
    flush().await;
    loader.settle_first(Ok(()));
    flush().await;

    assert_eq!(statuses.0.borrow().len(), recorded);
    assert!(!statuses.0.borrow().contains(&LoadingStatus::Resolved));
}

#[wasm_bindgen_test]
async fn hook_outside_provider_reports_missing_context() {
    let result = Shared::<Option<PayPalError>>::default();
    let handle = yew::Renderer::<Outside>::with_root_and_props(
        mount_point(),
        OutsideProps {
            result: result.clone(),
        },
    )
    .render();
    flush().await;

    let err = result.0.borrow().clone();
    assert!(matches!(err, Some(PayPalError::MissingProviderContext { .. })));
    handle.destroy();
}

#[wasm_bindgen_test]
async fn messages_container_is_cleared_when_the_sdk_reloads() {
    let messages = Function::new_with_args(
        "options",
        "return { render: function (el) { el.appendChild(document.createElement('span')); return Promise.resolve(); } };",
    );
    let namespace = Object::new();
    Reflect::set(&namespace, &JsValue::from_str("Messages"), &messages).unwrap();
    Reflect::set(&web_sys::window().unwrap(), &JsValue::from_str("paypal"), &namespace).unwrap();

    let children = Children::new(vec![html! {
        <PayPalMessages options={MessagesOptions::default()} class="messages-under-reload" />
    }]);
    let fixture = Fixture::mount(ScriptOptions::new("sb"), false, children);
    flush().await;
    fixture.loader.settle_first(Ok(()));
    flush().await;

    let container = web_sys::window()
        .unwrap()
        .document()
        .unwrap()
        .query_selector(".messages-under-reload")
        .unwrap()
        .unwrap();
    assert_eq!(container.child_element_count(), 1);

    fixture.configure(ScriptOptions::new("sb").currency("EUR"), false);
    flush().await;

    assert_eq!(fixture.last_status(), Some(LoadingStatus::Pending));
    assert_eq!(container.child_element_count(), 0);
    fixture.handle.destroy();
}
