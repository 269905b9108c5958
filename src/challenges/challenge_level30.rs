// Level 30: Cabbage Captcha. Any selection, including none, is correct.
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::registry::{Challenge, MountContext};

use super::VerifyGate;

pub const BOXES: usize = 9;
pub const CABBAGE_CHANCE: f64 = 0.3;
pub const VERIFY: &str = "#captcha-verify";
pub const MESSAGE: &str = "#captcha-msg";
pub const CERTIFIED: &str = "Correct. You are now cabbage-certified.";
const PICKED_OUTLINE: &str = "3px solid #59ffa5";

pub fn box_selector(index: usize) -> String {
    format!("#cbox-{index}")
}

fn markup(cabbage: &[bool]) -> String {
    let boxes: String = cabbage
        .iter()
        .enumerate()
        .map(|(i, &is_cabbage)| {
            let color = if is_cabbage { "#2f5" } else { "#3a5" };
            format!(
                r#"<div id="cbox-{i}" data-id="{i}" class="cbox" style="height:70px;border-radius:12px;background:{color};border:2px solid #264" tabindex="0"></div>"#
            )
        })
        .collect();
    format!(
        r#"<div class="grid">
  <h3 class="challenge-title">Level 30</h3>
  <p class="challenge-desc">Which cabbage looks more trustworthy?</p>
  <div class="grid" style="grid-template-columns:repeat(3,1fr)">{boxes}</div>
  <button class="secondary" id="captcha-verify">I'm definitely a snail</button>
  <div id="captcha-msg" class="muted"></div>
</div>"#
    )
}

pub struct CabbageCaptcha;

impl Challenge for CabbageCaptcha {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        let cabbage: Vec<bool> = (0..BOXES).map(|_| ctx.dice.chance(CABBAGE_CHANCE)).collect();
        ctx.container.set_html(&markup(&cabbage));

        // Picks are recorded but never checked.
        let picks = Rc::new(RefCell::new(BTreeSet::new()));
        let mut cleanup = Disposer::noop();
        for index in 0..BOXES {
            let selector = box_selector(index);
            let container = ctx.container.clone();
            let picks = picks.clone();
            let target = selector.clone();
            cleanup.adopt(ctx.container.listen(
                Some(selector.as_str()),
                "click",
                Box::new(move || {
                    container.set_style(&target, "outline", PICKED_OUTLINE);
                    picks.borrow_mut().insert(index);
                }),
            )?);
        }

        let gate = VerifyGate::new(&ctx, None);
        cleanup.adopt(gate.disposer());
        let container = ctx.container.clone();
        cleanup.adopt(ctx.container.listen(
            Some(VERIFY),
            "click",
            Box::new(move || {
                container.set_text(MESSAGE, CERTIFIED);
                gate.trigger();
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
    use crate::verification::MESSAGE_SELECTOR;

    fn mounted(rig: &Rig) -> Orchestrator {
        let registry = Registry::new()
            .with(LevelDescriptor::new(30, "Cabbage Captcha", "", CabbageCaptcha))
            .unwrap();
        let o = Orchestrator::new(GauntletConfig::default(), registry, rig.platform()).unwrap();
        o.load_level(30).unwrap();
        o
    }

    #[test]
    fn renders_nine_boxes() {
        let rig = Rig::new(30);
        let _o = mounted(&rig);
        assert_eq!(rig.container.html().matches("class=\"cbox\"").count(), BOXES);
    }

    #[test]
    fn picking_outlines_the_box() {
        let rig = Rig::new(30);
        let _o = mounted(&rig);
        rig.container.click(&box_selector(4));
        assert_eq!(
            rig.container.style(&box_selector(4), "outline").as_deref(),
            Some(PICKED_OUTLINE)
        );
        assert_eq!(rig.container.style(&box_selector(0), "outline"), None);
    }

    #[test]
    fn verifying_without_picks_still_certifies() {
        let rig = Rig::new(30);
        let o = mounted(&rig);
        rig.container.click(VERIFY);
        assert_eq!(rig.container.text(MESSAGE).as_deref(), Some(CERTIFIED));
        rig.scheduler.advance(o.verifier().max_duration_ms() as f64);
        assert!(o.is_current_complete());
        assert_eq!(
            rig.container.text(MESSAGE_SELECTOR).as_deref(),
            Some("Snails approve.")
        );
    }
}
