//! Built-in challenges.
//!
//! Each file defines one level. They only talk to the engine through the
//! `Challenge` contract; ids not listed here are filler levels.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::orchestrator::Completion;
use crate::platform::Container;
use crate::registry::{LevelDescriptor, MountContext, Registry};
use crate::verification::Verifier;

mod challenge_level1;
mod challenge_level15;
mod challenge_level20;
mod challenge_level25;
mod challenge_level30;
mod challenge_level40;
mod challenge_level49;
mod challenge_level50;

pub use challenge_level1::MovingButton;
pub use challenge_level15::PaintDry;
pub use challenge_level20::SnailEssay;
pub use challenge_level25::SnailSpeedSlider;
pub use challenge_level30::CabbageCaptcha;
pub use challenge_level40::PasswordFromHell;
pub use challenge_level49::ShrekBlink;
pub use challenge_level50::SnailOverlord;

/// Every built-in level, keyed by id.
pub fn default_registry() -> Result<Registry> {
    Registry::new()
        .with(LevelDescriptor::new(
            1,
            "Click the Moving Button",
            "Click the button 10 times to complete the level.",
            MovingButton,
        ))?
        .with(LevelDescriptor::new(
            15,
            "Watch paint dry",
            "Click \"I feel enlightened.\" when you truly do.",
            PaintDry,
        ))?
        .with(LevelDescriptor::new(
            20,
            "Essay: Why snails are faster than Wi‑Fi",
            "300 words. Or thereabouts. The snail will know.",
            SnailEssay,
        ))?
        .with(LevelDescriptor::new(
            25,
            "Set snail speed to exactly 42",
            "Precision is an illusion. The snail forgives… sometimes.",
            SnailSpeedSlider,
        ))?
        .with(LevelDescriptor::new(
            30,
            "Cabbage Captcha",
            "Select all images with cabbage energy.",
            CabbageCaptcha,
        ))?
        .with(LevelDescriptor::new(
            40,
            "Password Strength From Hell",
            "Enter a password. We will reject it for reasons.",
            PasswordFromHell,
        ))?
        .with(LevelDescriptor::new(
            49,
            "Stare at Shrek until he blinks",
            "We will use very real AI to detect blinking.",
            ShrekBlink,
        ))?
        .with(LevelDescriptor::new(
            50,
            "You are the Snail Overlord",
            "Confetti. Everyone is last place.",
            SnailOverlord,
        ))
}

/// Runs the fake verification once and completes the level when it ends.
/// Presses while a run is in flight are ignored.
#[derive(Clone)]
pub(crate) struct VerifyGate {
    run: Rc<RefCell<Option<Disposer>>>,
    verifier: Verifier,
    container: Rc<dyn Container>,
    completion: Completion,
    success: Option<&'static str>,
}

impl VerifyGate {
    /// `None` shows the configured default success line.
    pub(crate) fn new(ctx: &MountContext, success: Option<&'static str>) -> Self {
        Self {
            run: Rc::new(RefCell::new(None)),
            verifier: ctx.verifier.clone(),
            container: ctx.container.clone(),
            completion: ctx.completion.clone(),
            success,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.run.borrow().is_some()
    }

    pub(crate) fn trigger(&self) {
        if self.is_running() || self.completion.has_fired() {
            return;
        }
        let completion = self.completion.clone();
        match self.verifier.run(
            &self.container,
            self.success,
            Box::new(move || completion.complete()),
        ) {
            Ok(run) => *self.run.borrow_mut() = Some(run),
            Err(e) => warn!("level {}: verification did not start: {e}", self.completion.level()),
        }
    }

    /// Cancels an unfinished run.
    pub(crate) fn disposer(&self) -> Disposer {
        let run = self.run.clone();
        Disposer::from_fn(move || {
            let pending = run.borrow_mut().take();
            drop(pending);
        })
    }
}

/// Mount a single-button level: render `html`, and on click of `button`
/// optionally show `status` text, then verify with `success`.
pub(crate) fn mount_button_gate(
    ctx: &MountContext,
    html: &str,
    button: &'static str,
    status: Option<(&'static str, &'static str)>,
    success: &'static str,
) -> Result<Disposer> {
    ctx.container.set_html(html);
    let gate = VerifyGate::new(ctx, Some(success));
    let mut cleanup = gate.disposer();

    let container = ctx.container.clone();
    let g = gate.clone();
    cleanup.adopt(ctx.container.listen(
        Some(button),
        "click",
        Box::new(move || {
            if let Some((selector, text)) = status {
                container.set_text(selector, text);
            }
            g.trigger();
        }),
    )?);
    Ok(cleanup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_holds_every_builtin() {
        let reg = default_registry().unwrap();
        assert_eq!(
            reg.ids().collect::<Vec<_>>(),
            vec![1, 15, 20, 25, 30, 40, 49, 50]
        );
        assert_eq!(reg.lookup(1).map(|d| d.title), Some("Click the Moving Button"));
        assert!(reg.lookup(2).is_none());
    }
}
