//! Content-derived identity of a script configuration.
//!
//! The script id is `yew-paypal-<fnv1a64 hex>` over [`ScriptOptions::canonical`]
//! and lands on the injected tag as `data-yew-paypal-script-id`. Identical
//! configurations share a script id and therefore a cached tag. The epoch is
//! bumped on every options reset, so an identity never compares equal to the
//! one it replaced even when the content did not change.

use std::fmt;

use crate::options::{ScriptOptions, INTEGRATION_SOURCE, INTEGRATION_SOURCE_ATTRIBUTE, SCRIPT_ID_ATTRIBUTE};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
pub fn content_hash(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Script id for a configuration, ignoring identity attributes already present.
pub fn script_id_for(options: &ScriptOptions) -> String {
    format!("{}-{:016x}", INTEGRATION_SOURCE, content_hash(&options.canonical()))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OptionsIdentity {
    script_id: String,
    epoch: u64,
}

impl OptionsIdentity {
    pub fn derive(options: &ScriptOptions, epoch: u64) -> Self {
        Self {
            script_id: script_id_for(options),
            epoch,
        }
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    /// Load-attempt token; strictly increases across resets.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Copy of `options` tagged with this identity and the integration source.
    pub fn tag(&self, options: &ScriptOptions) -> ScriptOptions {
        options
            .clone()
            .with(INTEGRATION_SOURCE_ATTRIBUTE, INTEGRATION_SOURCE)
            .with(SCRIPT_ID_ATTRIBUTE, self.script_id.clone())
    }
}

impl fmt::Display for OptionsIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.script_id, self.epoch)
    }
}
