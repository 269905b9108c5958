// Level 50: the finale. Completes the moment it is shown.
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::registry::{Challenge, MountContext};

const MARKUP: &str = r#"<div class="center">
  <h3 class="challenge-title">Level 50</h3>
  <p class="challenge-desc">Scanning desktop… scanning fridge… scanning brainwaves… LOL we didn't check.</p>
  <h2>Congratulations. You're now the Snail Overlord.</h2>
</div>"#;

pub struct SnailOverlord;

impl Challenge for SnailOverlord {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        ctx.container.set_html(MARKUP);
        ctx.completion.complete();
        Ok(Disposer::noop())
    }
}
