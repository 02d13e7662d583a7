//! Mount/session lifecycle.
//!
//! The stage drives the `Idle → Compiling → Mounted → Disposing → Idle`
//! cycle for one container and keeps the mounted content fitted to it.
//!
//! ## Modules
//!
//! - [`controller`] - the [`Stage`] state machine and materialization
//! - [`rescale`] - fit-to-container math

mod controller;
mod rescale;

pub use controller::{Stage, StageState};
pub use rescale::fit_to_container;
