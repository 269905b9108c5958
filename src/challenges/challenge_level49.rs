// Level 49: stare at Shrek until he blinks.
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::registry::{Challenge, MountContext};

use super::mount_button_gate;

pub const BUTTON: &str = "#blink-btn";
pub const STATUS: &str = "#blink-status";
pub const ANALYSIS: &str = "Analyzing your eyes… detected 37% snail energy.";
pub const SUCCESS: &str = "Blink verified by cutting-edge imagination.";

const MARKUP: &str = r#"<div class="grid shrek-box">
  <h3 class="challenge-title">Level 49</h3>
  <div class="shrek" aria-label="Shrek"></div>
  <button class="primary" id="blink-btn">I witnessed the blink</button>
  <div id="blink-status" class="muted"></div>
</div>"#;

pub struct ShrekBlink;

impl Challenge for ShrekBlink {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        mount_button_gate(&ctx, MARKUP, BUTTON, Some((STATUS, ANALYSIS)), SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GauntletConfig;
    use crate::headless::Rig;
    use crate::orchestrator::Orchestrator;
    use crate::registry::{LevelDescriptor, Registry};

    #[test]
    fn blink_shows_analysis_before_completing() {
        let rig = Rig::new(49);
        let registry = Registry::new()
            .with(LevelDescriptor::new(49, "Shrek", "", ShrekBlink))
            .unwrap();
        let o = Orchestrator::new(GauntletConfig::default(), registry, rig.platform()).unwrap();
        o.load_level(49).unwrap();

        rig.container.click(BUTTON);
        assert_eq!(rig.container.text(STATUS).as_deref(), Some(ANALYSIS));
        assert!(!o.is_current_complete());
        rig.scheduler.advance(o.verifier().max_duration_ms() as f64);
        assert!(o.is_current_complete());
    }
}
