//! options.rs
//!
//! Script configuration for the PayPal JS SDK.
//!
//! [`ScriptOptions`] is a flat, serializable map of the query parameters and
//! `data-*` attributes the SDK `<script>` tag is built from. Keys are stored
//! in kebab-case (`clientId` is normalized to `client-id`) and kept sorted, so
//! two option sets with the same content compare and hash the same.
//!
//! # Example
//! ```rust
//! use yew_paypal::{Environment, ScriptOptions};
//!
//! let options = ScriptOptions::new("sb")
//!     .currency("EUR")
//!     .components("buttons,marks")
//!     .environment(Environment::Sandbox);
//!
//! assert_eq!(options.get("clientId"), Some("sb"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::PayPalError;

/// Global the PayPal SDK installs itself under unless `data-namespace` is set.
pub const DEFAULT_NAMESPACE: &str = "paypal";
/// Global the Braintree web SDK installs itself under.
pub const BRAINTREE_NAMESPACE: &str = "braintree";

pub const SDK_URL: &str = "https://www.paypal.com/sdk/js";
pub const SANDBOX_SDK_URL: &str = "https://www.sandbox.paypal.com/sdk/js";

/// Attribute carrying the content-derived identity of an injected SDK tag.
pub const SCRIPT_ID_ATTRIBUTE: &str = "data-yew-paypal-script-id";
/// Attribute the SDK reads to learn which integration loaded it.
pub const INTEGRATION_SOURCE_ATTRIBUTE: &str = "data-sdk-integration-source";
pub const INTEGRATION_SOURCE: &str = "yew-paypal";

pub const DATA_NAMESPACE: &str = "data-namespace";
pub const DATA_CLIENT_TOKEN: &str = "data-client-token";
pub const DATA_USER_ID_TOKEN: &str = "data-user-id-token";

const CLIENT_ID: &str = "client-id";
const ENVIRONMENT: &str = "environment";
const SDK_BASE_URL: &str = "sdk-base-url";

/// Which PayPal host serves the SDK.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Sandbox => "sandbox",
        }
    }

    /// Base SDK URL for this environment.
    pub fn sdk_url(self) -> &'static str {
        match self {
            Environment::Production => SDK_URL,
            Environment::Sandbox => SANDBOX_SDK_URL,
        }
    }
}

/// Key/value configuration handed to the SDK loader.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ScriptOptions(BTreeMap<String, String>);

/// Keys are normalized on the way in, same as [`ScriptOptions::insert`].
impl<'de> Deserialize<'de> for ScriptOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(BTreeMap::<String, String>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

impl ScriptOptions {
    /// Options with only the mandatory `client-id` set.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self::default().with(CLIENT_ID, client_id)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0.insert(normalize_key(key.as_ref()), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(&normalize_key(key))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&normalize_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn currency(self, currency: impl Into<String>) -> Self {
        self.with("currency", currency)
    }

    /// `capture`, `authorize`, `subscription` or `tokenize`.
    pub fn intent(self, intent: impl Into<String>) -> Self {
        self.with("intent", intent)
    }

    /// Comma separated SDK components, e.g. `"buttons,marks,messages"`.
    pub fn components(self, components: impl Into<String>) -> Self {
        self.with("components", components)
    }

    pub fn vault(self, vault: bool) -> Self {
        self.with("vault", vault.to_string())
    }

    pub fn commit(self, commit: bool) -> Self {
        self.with("commit", commit.to_string())
    }

    pub fn disable_funding(self, sources: impl Into<String>) -> Self {
        self.with("disable-funding", sources)
    }

    pub fn enable_funding(self, sources: impl Into<String>) -> Self {
        self.with("enable-funding", sources)
    }

    pub fn buyer_country(self, country: impl Into<String>) -> Self {
        self.with("buyer-country", country)
    }

    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.with("locale", locale)
    }

    pub fn merchant_id(self, merchant_id: impl Into<String>) -> Self {
        self.with("merchant-id", merchant_id)
    }

    pub fn debug(self, debug: bool) -> Self {
        self.with("debug", debug.to_string())
    }

    /// Client token required by hosted fields and the Braintree integration.
    pub fn data_client_token(self, token: impl Into<String>) -> Self {
        self.with(DATA_CLIENT_TOKEN, token)
    }

    pub fn data_user_id_token(self, token: impl Into<String>) -> Self {
        self.with(DATA_USER_ID_TOKEN, token)
    }

    /// Install the SDK under `window.<namespace>` instead of `window.paypal`.
    pub fn data_namespace(self, namespace: impl Into<String>) -> Self {
        self.with(DATA_NAMESPACE, namespace)
    }

    pub fn environment(self, environment: Environment) -> Self {
        self.with(ENVIRONMENT, environment.as_str())
    }

    /// Load the SDK from a custom URL (proxies, local mocks).
    pub fn sdk_base_url(self, url: impl Into<String>) -> Self {
        self.with(SDK_BASE_URL, url)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.get(CLIENT_ID)
    }

    pub fn client_token(&self) -> Option<&str> {
        self.get(DATA_CLIENT_TOKEN).filter(|token| !token.is_empty())
    }

    /// Global the SDK will be installed under.
    pub fn namespace(&self) -> &str {
        self.get(DATA_NAMESPACE)
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn target_environment(&self) -> Environment {
        match self.get(ENVIRONMENT) {
            Some("sandbox") => Environment::Sandbox,
            _ => Environment::Production,
        }
    }

    /// Pairs sent as URL query parameters.
    pub fn query_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(key, value)| {
            !key.starts_with("data-") && *key != ENVIRONMENT && *key != SDK_BASE_URL && !value.is_empty()
        })
    }

    /// Pairs set as attributes on the `<script>` tag.
    pub fn script_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(key, _)| key.starts_with("data-"))
    }

    /// Full SDK URL including query parameters.
    pub fn sdk_url(&self) -> Result<Url, PayPalError> {
        let base = self
            .get(SDK_BASE_URL)
            .unwrap_or_else(|| self.target_environment().sdk_url());
        let mut url = Url::parse(base)?;
        let params: Vec<(&str, &str)> = self.query_params().collect();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Stable textual form used for content hashing.
    ///
    /// Keys are sorted, so the result does not depend on insertion order.
    pub fn canonical(&self) -> String {
        self.iter()
            .filter(|(key, _)| *key != SCRIPT_ID_ATTRIBUTE && *key != INTEGRATION_SOURCE_ATTRIBUTE)
            .map(|(key, value)| format!("{}={}", escape(key), escape(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ScriptOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = ScriptOptions::default();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}

/// `clientId` → `client-id`; kebab-case keys pass through unchanged.
fn normalize_key(key: &str) -> String {
    let mut normalized = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            normalized.push('-');
            normalized.push(ch.to_ascii_lowercase());
        } else {
            normalized.push(ch);
        }
    }
    normalized
}

fn escape(part: &str) -> String {
    part.replace('%', "%25").replace('&', "%26").replace('=', "%3D")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_keys_are_normalized() {
        let options = ScriptOptions::default()
            .with("clientId", "sb")
            .with("disableFunding", "card");

        assert_eq!(options.get("client-id"), Some("sb"));
        assert_eq!(options.get("disableFunding"), Some("card"));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn data_keys_become_attributes_not_query() {
        let options = ScriptOptions::new("sb")
            .data_client_token("token")
            .data_namespace("paypalV2")
            .currency("USD");

        let query: Vec<_> = options.query_params().collect();
        assert_eq!(query, vec![("client-id", "sb"), ("currency", "USD")]);

        let attributes: Vec<_> = options.script_attributes().collect();
        assert_eq!(
            attributes,
            vec![("data-client-token", "token"), ("data-namespace", "paypalV2")]
        );
        assert_eq!(options.namespace(), "paypalV2");
    }

    #[test]
    fn namespace_defaults_to_paypal() {
        assert_eq!(ScriptOptions::new("sb").namespace(), DEFAULT_NAMESPACE);
        assert_eq!(ScriptOptions::new("sb").data_namespace("").namespace(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn sdk_url_uses_environment_host() {
        let production = ScriptOptions::new("sb").sdk_url().unwrap();
        assert_eq!(production.host_str(), Some("www.paypal.com"));

        let sandbox = ScriptOptions::new("sb")
            .environment(Environment::Sandbox)
            .sdk_url()
            .unwrap();
        assert_eq!(sandbox.host_str(), Some("www.sandbox.paypal.com"));
        assert_eq!(sandbox.path(), "/sdk/js");

        let pairs: Vec<(String, String)> = sandbox.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("client-id".to_string(), "sb".to_string())]);
    }

    #[test]
    fn sdk_base_url_overrides_host_and_is_not_sent() {
        let url = ScriptOptions::new("sb")
            .sdk_base_url("http://localhost:8000/sdk/js")
            .disable_funding("card,credit")
            .sdk_url()
            .unwrap();

        assert_eq!(url.host_str(), Some("localhost"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("client-id".to_string(), "sb".to_string()),
                ("disable-funding".to_string(), "card,credit".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let err = ScriptOptions::new("sb").sdk_base_url("not a url").sdk_url().unwrap_err();
        assert!(matches!(err, PayPalError::InvalidUrl(_)));
    }

    #[test]
    fn canonical_form_ignores_insertion_order_and_identity_attributes() {
        let a = ScriptOptions::new("sb").currency("USD");
        let b = ScriptOptions::default()
            .with("currency", "USD")
            .with("client-id", "sb")
            .with(SCRIPT_ID_ATTRIBUTE, "yew-paypal-1234");

        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.canonical(), "client-id=sb&currency=USD");
    }

    #[test]
    fn canonical_form_escapes_separators() {
        let tricky = ScriptOptions::default().with("a", "b&c=d");
        let split = ScriptOptions::default().with("a", "b").with("c", "d");
        assert_ne!(tricky.canonical(), split.canonical());
    }

    #[test]
    fn deserializes_from_json_object() {
        let options: ScriptOptions =
            serde_json::from_str(r#"{"client-id":"abc","currency":"EUR"}"#).unwrap();
        assert_eq!(options.client_id(), Some("abc"));
        assert_eq!(options.get("currency"), Some("EUR"));
    }

    #[test]
    fn deserialized_camel_case_keys_match_built_options() {
        let parsed: ScriptOptions = serde_json::from_str(r#"{"clientId":"sb","dataNamespace":"pp"}"#).unwrap();
        let built = ScriptOptions::new("sb").data_namespace("pp");

        assert_eq!(parsed.client_id(), Some("sb"));
        assert_eq!(parsed, built);
        assert_eq!(parsed.canonical(), built.canonical());
        let query: Vec<_> = parsed.query_params().collect();
        assert_eq!(query, vec![("client-id", "sb")]);
    }
}
