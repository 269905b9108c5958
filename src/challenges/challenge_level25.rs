// Level 25: set snail speed to exactly 42. The slider starts at 41.
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::registry::{Challenge, MountContext};

use super::VerifyGate;

pub const SLIDER: &str = "#snail-slider";
pub const READOUT: &str = "#slider-val";
pub const TARGET: &str = "42";
pub const SUCCESS: &str = "Close enough, we'll let it slide.";

const MARKUP: &str = r#"<div class="grid">
  <h3 class="challenge-title">Level 25</h3>
  <div class="slider-row">
    <input id="snail-slider" type="range" min="0" max="100" value="41" />
    <div>Value: <span id="slider-val">41</span></div>
  </div>
</div>"#;

pub struct SnailSpeedSlider;

impl Challenge for SnailSpeedSlider {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        ctx.container.set_html(MARKUP);
        let gate = VerifyGate::new(&ctx, Some(SUCCESS));
        let mut cleanup = gate.disposer();

        let container = ctx.container.clone();
        cleanup.adopt(ctx.container.listen(
            Some(SLIDER),
            "input",
            Box::new(move || {
                let Some(value) = container.value(SLIDER) else {
                    return;
                };
                container.set_text(READOUT, &value);
                if value == TARGET {
                    gate.trigger();
                }
            }),
        )?);
        Ok(cleanup)
    }
}
