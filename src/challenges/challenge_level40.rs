// Level 40: Password Strength From Hell. The first four submissions are
// rejected with a rotating excuse and cost patience; the fifth is verified.
use std::cell::Cell;
use std::rc::Rc;

use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::registry::{Challenge, MountContext};

use super::VerifyGate;

#[cfg(test)]
pub const INPUT: &str = "#pwd";
pub const SUBMIT: &str = "#pwd-btn";
pub const STATUS: &str = "#pwd-status";
pub const ACCEPTED_ON_ATTEMPT: u32 = 5;
pub const REJECTION_PENALTY: i32 = 3;
pub const SUCCESS: &str = "Fine. Password spiritually strong.";

pub const REASONS: [&str; 5] = [
    "Too weak: lacks snail emojis.",
    "Rejected: contains insufficient cabbage entropy.",
    "Denied: password remembered by a goldfish.",
    "Nope: requires at least 3 silent letters and a haiku.",
    "Try again: does not start with \"I respect snails\".",
];

const MARKUP: &str = r#"<div class="grid pwd-box">
  <h3 class="challenge-title">Level 40</h3>
  <input id="pwd" class="input" type="password" placeholder="Enter a strong password" />
  <button class="secondary" id="pwd-btn">Submit</button>
  <div id="pwd-status" class="muted"></div>
</div>"#;

/// Excuse for the `attempt`-th rejection (1-based).
pub fn rejection_reason(attempt: u32) -> &'static str {
    REASONS[(attempt.saturating_sub(1) as usize) % REASONS.len()]
}

pub struct PasswordFromHell;

impl Challenge for PasswordFromHell {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        ctx.container.set_html(MARKUP);
        let gate = VerifyGate::new(&ctx, Some(SUCCESS));
        let mut cleanup = gate.disposer();

        let attempts = Rc::new(Cell::new(0u32));
        let container = ctx.container.clone();
        let engagement = ctx.engagement.clone();
        cleanup.adopt(ctx.container.listen(
            Some(SUBMIT),
            "click",
            Box::new(move || {
                let attempt = attempts.get() + 1;
                attempts.set(attempt);
                if attempt < ACCEPTED_ON_ATTEMPT {
                    container.set_text(STATUS, rejection_reason(attempt));
                    engagement.bump(REJECTION_PENALTY);
                } else {
                    gate.trigger();
                }
            }),
        )?);
        Ok(cleanup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GauntletConfig;
    use crate::headless::Rig;
    use crate::orchestrator::Orchestrator;
    use crate::registry::{LevelDescriptor, Registry};

    fn mounted(rig: &Rig) -> Orchestrator {
        let registry = Registry::new()
            .with(LevelDescriptor::new(40, "Password", "", PasswordFromHell))
            .unwrap();
        let o = Orchestrator::new(GauntletConfig::default(), registry, rig.platform()).unwrap();
        o.load_level(40).unwrap();
        o
    }

    #[test]
    fn reasons_rotate_from_the_first() {
        assert_eq!(rejection_reason(1), REASONS[0]);
        assert_eq!(rejection_reason(4), REASONS[3]);
        assert_eq!(rejection_reason(6), REASONS[0]);
    }

    #[test]
    fn four_rejections_then_acceptance() {
        let rig = Rig::new(40);
        let o = mounted(&rig);
        for attempt in 1..ACCEPTED_ON_ATTEMPT {
            rig.container.input(INPUT, "hunter2");
            rig.container.click(SUBMIT);
            assert_eq!(
                rig.container.text(STATUS).as_deref(),
                Some(rejection_reason(attempt))
            );
            rig.scheduler.advance(o.verifier().max_duration_ms() as f64);
            assert!(!o.is_current_complete());
        }
        rig.container.click(SUBMIT);
        rig.scheduler.advance(o.verifier().max_duration_ms() as f64);
        assert!(o.is_current_complete());
    }

    #[test]
    fn rejections_cost_patience() {
        let rig = Rig::new(40);
        let o = mounted(&rig);
        assert_eq!(o.engagement().meter(), 0);
        rig.container.click(SUBMIT);
        // Penalty plus the ordinary 1..=3 for the click bubbling up.
        let meter = o.engagement().meter() as i32;
        assert!((REJECTION_PENALTY + 1..=REJECTION_PENALTY + 3).contains(&meter));
        assert_eq!(rig.hud.meter() as i32, meter);
    }
}
