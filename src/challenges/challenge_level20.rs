// Level 20: the snail essay. Nobody reads it.
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::registry::{Challenge, MountContext};

use super::mount_button_gate;

#[cfg(test)]
pub const ESSAY: &str = "#essay";
pub const SUBMIT: &str = "#submit-essay";
pub const SUCCESS: &str = "Profound. Snail speed transcends routers.";

const MARKUP: &str = r#"<div class="grid">
  <h3 class="challenge-title">Level 20</h3>
  <p class="challenge-desc">Write your truth. We will skim 0 words.</p>
  <textarea id="essay" placeholder="Channel your inner snail…"></textarea>
  <button class="primary" id="submit-essay">Submit to Snail Council</button>
</div>"#;

pub struct SnailEssay;

impl Challenge for SnailEssay {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        mount_button_gate(&ctx, MARKUP, SUBMIT, None, SUCCESS)
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
    fn an_empty_essay_is_still_profound() {
        let rig = Rig::new(20);
        let registry = Registry::new()
            .with(LevelDescriptor::new(20, "Essay", "", SnailEssay))
            .unwrap();
        let o = Orchestrator::new(GauntletConfig::default(), registry, rig.platform()).unwrap();
        o.load_level(20).unwrap();

        rig.container.click(SUBMIT);
        rig.scheduler.advance(o.verifier().max_duration_ms() as f64);
        assert!(o.is_current_complete());
    }

    #[test]
    fn typing_alone_completes_nothing() {
        let rig = Rig::new(20);
        let registry = Registry::new()
            .with(LevelDescriptor::new(20, "Essay", "", SnailEssay))
            .unwrap();
        let o = Orchestrator::new(GauntletConfig::default(), registry, rig.platform()).unwrap();
        o.load_level(20).unwrap();

        rig.container.input(ESSAY, "Snails never buffer.");
        rig.scheduler.advance(60_000.0);
        assert!(!o.is_current_complete());
    }
}
