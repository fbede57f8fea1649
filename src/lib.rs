pub mod bindings;
mod callback;
mod components;
mod context;
mod controller;
mod error;
mod identity;
mod loader;
mod logging;
pub mod namespace;
mod options;
mod provider;
mod state;

pub use callback::*;
pub use components::*;
pub use context::*;
pub use controller::*;
pub use error::*;
pub use identity::*;
pub use loader::*;
pub use logging::*;
pub use options::*;
pub use provider::*;
pub use state::*;
