// Level 15: Watch paint dry.
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::registry::{Challenge, MountContext};

use super::mount_button_gate;

pub const BUTTON: &str = "#enlightened";
pub const SUCCESS: &str = "Beige-certified. Proceed.";

const MARKUP: &str = r#"<div class="grid center">
  <h3 class="challenge-title">Level 15</h3>
  <p class="challenge-desc">Stare at this calming gradient.</p>
  <div style="height:180px;border-radius:12px;background:linear-gradient(90deg,#333,#666,#444);animation:shade 8s linear infinite"></div>
  <style>@keyframes shade{0%{filter:saturate(60%)}50%{filter:saturate(120%)}100%{filter:saturate(60%)}}</style>
  <button class="primary" id="enlightened">I feel enlightened</button>
</div>"#;

pub struct PaintDry;

impl Challenge for PaintDry {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        mount_button_gate(&ctx, MARKUP, BUTTON, None, SUCCESS)
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

    #[test]
    fn enlightenment_is_verified_then_completes() {
        let rig = Rig::new(15);
        let registry = Registry::new()
            .with(LevelDescriptor::new(15, "Watch paint dry", "", PaintDry))
            .unwrap();
        let o = Orchestrator::new(GauntletConfig::default(), registry, rig.platform()).unwrap();
        o.load_level(15).unwrap();
        assert!(rig.container.html().contains("I feel enlightened"));

        rig.container.click(BUTTON);
        // A second press while verifying does not start another run.
        rig.container.click(BUTTON);
        assert_eq!(rig.container.html().matches("verify-bar").count(), 1);
        assert!(!o.is_current_complete());

        rig.scheduler.advance(o.verifier().max_duration_ms() as f64);
        assert!(o.is_current_complete());
        assert_eq!(rig.container.text(MESSAGE_SELECTOR).as_deref(), Some(SUCCESS));
    }
}
