//! Loading state of the SDK script and its reducer.
//!
//! ```text
//!   Initial ──start──▶ Pending ──ok──▶ Resolved
//!                        ▲  └──err──▶ Rejected
//!                        └──── reset ───┘
//! ```
//!
//! [`ScriptState::reduce`] is pure and total: transitions outside the graph
//! above are ignored rather than reported as errors.

use std::fmt;

use log::{debug, warn};

use crate::identity::OptionsIdentity;
use crate::options::ScriptOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadingStatus {
    Initial,
    Pending,
    Resolved,
    Rejected,
}

impl LoadingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadingStatus::Initial => "initial",
            LoadingStatus::Pending => "pending",
            LoadingStatus::Resolved => "resolved",
            LoadingStatus::Rejected => "rejected",
        }
    }

    /// Whether `SetLoadingStatus(next)` is accepted from `self`.
    ///
    /// Settled states only leave through `ResetOptions`.
    pub fn can_transition_to(self, next: LoadingStatus) -> bool {
        matches!(
            (self, next),
            (LoadingStatus::Initial, LoadingStatus::Pending)
                | (LoadingStatus::Pending, LoadingStatus::Resolved)
                | (LoadingStatus::Pending, LoadingStatus::Rejected)
        )
    }
}

impl fmt::Display for LoadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a `SetLoadingStatus` action. A rejection always carries a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusChange {
    Initial,
    Pending,
    Resolved,
    Rejected(String),
}

impl StatusChange {
    pub fn status(&self) -> LoadingStatus {
        match self {
            StatusChange::Initial => LoadingStatus::Initial,
            StatusChange::Pending => LoadingStatus::Pending,
            StatusChange::Resolved => LoadingStatus::Resolved,
            StatusChange::Rejected(_) => LoadingStatus::Rejected,
        }
    }
}

/// The closed set of mutations dependents may dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetLoadingStatus(StatusChange),
    ResetOptions(ScriptOptions),
}

/// Exactly one field is `true`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DerivedStatus {
    pub is_initial: bool,
    pub is_pending: bool,
    pub is_resolved: bool,
    pub is_rejected: bool,
}

impl From<LoadingStatus> for DerivedStatus {
    fn from(status: LoadingStatus) -> Self {
        DerivedStatus {
            is_initial: status == LoadingStatus::Initial,
            is_pending: status == LoadingStatus::Pending,
            is_resolved: status == LoadingStatus::Resolved,
            is_rejected: status == LoadingStatus::Rejected,
        }
    }
}

pub fn derive_status(state: &ScriptState) -> DerivedStatus {
    DerivedStatus::from(state.status)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptState {
    options: ScriptOptions,
    identity: OptionsIdentity,
    status: LoadingStatus,
    error_message: Option<String>,
}

impl ScriptState {
    /// `Initial` when loading is deferred, `Pending` otherwise.
    pub fn initialize(options: ScriptOptions, defer_loading: bool) -> Self {
        let identity = OptionsIdentity::derive(&options, 0);
        let options = identity.tag(&options);
        let status = if defer_loading {
            LoadingStatus::Initial
        } else {
            LoadingStatus::Pending
        };
        ScriptState {
            options,
            identity,
            status,
            error_message: None,
        }
    }

    /// Options as handed to the loader, identity attributes included.
    pub fn options(&self) -> &ScriptOptions {
        &self.options
    }

    pub fn identity(&self) -> &OptionsIdentity {
        &self.identity
    }

    pub fn status(&self) -> LoadingStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn derived(&self) -> DerivedStatus {
        derive_status(self)
    }

    pub fn reduce(&self, action: Action) -> ScriptState {
        match action {
            Action::SetLoadingStatus(change) => self.set_loading_status(change),
            Action::ResetOptions(options) => self.reset_options(options),
        }
    }

    fn set_loading_status(&self, change: StatusChange) -> ScriptState {
        let next = change.status();
        if next == self.status {
            return self.clone();
        }
        if !self.status.can_transition_to(next) {
            warn!(
                "ignoring loading status change {} -> {} for {}",
                self.status, next, self.identity
            );
            return self.clone();
        }
        debug!("script {}: {} -> {}", self.identity, self.status, next);
        let error_message = match change {
            StatusChange::Rejected(message) => Some(message),
            _ => None,
        };
        ScriptState {
            status: next,
            error_message,
            ..self.clone()
        }
    }

    fn reset_options(&self, options: ScriptOptions) -> ScriptState {
        let identity = OptionsIdentity::derive(&options, self.identity.epoch() + 1);
        debug!("script {} reset to {}", self.identity, identity);
        ScriptState {
            options: identity.tag(&options),
            identity,
            status: LoadingStatus::Pending,
            error_message: None,
        }
    }
}
