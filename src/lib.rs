//! Snail Gauntlet core crate.
//!
//! A gauntlet of deliberately annoying mini-challenges. The crate owns the
//! level orchestration: which challenge is live, tearing it down before the
//! next one mounts, completion bookkeeping, and the per-level patience meter
//! and clock. Individual challenges plug in through the `Challenge` contract.
//!
//! The browser build wires everything to the page in `web`; the `headless`
//! platform runs the same engine natively (tests, simulations).

use wasm_bindgen::prelude::*;

pub mod challenges;
pub mod config;
pub mod dice;
pub mod engagement;
pub mod error;
pub mod headless;
pub mod lifecycle;
pub mod logging;
pub mod orchestrator;
pub mod platform;
pub mod registry;
pub mod verification;
pub mod web;

pub use challenges::default_registry;
pub use config::{EngagementConfig, GauntletConfig, VerificationConfig};
pub use dice::Dice;
pub use engagement::{EngagementSession, EngagementState, EngagementTracker};
pub use error::{GauntletError, Result};
pub use lifecycle::Disposer;
pub use orchestrator::{Completion, Orchestrator, Phase, Snapshot, clamp_level};
pub use platform::{Container, Hud, Platform, Scheduler};
pub use registry::{Challenge, LevelDescriptor, LevelId, MountContext, Registry};
pub use verification::Verifier;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
