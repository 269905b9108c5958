//! Fake verification: a staged progress bar with random pauses and flavor
//! text. Purely cosmetic; it always succeeds.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;

use crate::config::VerificationConfig;
use crate::dice::Dice;
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::platform::{Container, Scheduler};

pub const BAR_SELECTOR: &str = "#verify-bar";
pub const MESSAGE_SELECTOR: &str = "#verify-msg";

const MARKUP: &str = r#"<div class="grid verify-box">
  <div>Checking your snail aura…</div>
  <div class="progress"><div id="verify-bar" style="width:0%"></div></div>
  <div id="verify-msg" class="muted"></div>
</div>"#;

#[derive(Clone)]
pub struct Verifier {
    config: Rc<VerificationConfig>,
    scheduler: Rc<dyn Scheduler>,
    dice: Dice,
}

struct Run {
    container: Rc<dyn Container>,
    next_step: usize,
    success: String,
    on_done: Option<Box<dyn FnOnce()>>,
    pending: Option<Disposer>,
}

impl Verifier {
    pub fn new(config: VerificationConfig, scheduler: Rc<dyn Scheduler>, dice: Dice) -> Self {
        Self {
            config: Rc::new(config),
            scheduler,
            dice,
        }
    }

    /// Append the verification box to `container` and walk through every
    /// progress step, then show `success` (or the configured default) and
    /// call `on_done`.
    ///
    /// The returned disposer cancels a run that has not finished yet;
    /// `on_done` is then never called.
    pub fn run(
        &self,
        container: &Rc<dyn Container>,
        success: Option<&str>,
        on_done: Box<dyn FnOnce()>,
    ) -> Result<Disposer> {
        container.append_html(MARKUP);
        let run = Rc::new(RefCell::new(Run {
            container: container.clone(),
            next_step: 0,
            success: success
                .unwrap_or(self.config.default_success.as_str())
                .to_string(),
            on_done: Some(on_done),
            pending: None,
        }));
        self.schedule(&run)?;

        let mut guard = Disposer::noop();
        guard.push(move || {
            let mut r = run.borrow_mut();
            r.on_done = None;
            let pending = r.pending.take();
            drop(r);
            drop(pending);
        });
        Ok(guard)
    }

    /// Worst-case total duration of one run.
    pub fn max_duration_ms(&self) -> u32 {
        let steps = u32::try_from(self.config.progress_steps.len()).unwrap_or(u32::MAX);
        self.config
            .step_delay_max_ms
            .saturating_mul(steps)
            .saturating_add(self.config.settle_ms)
    }

    fn schedule(&self, run: &Rc<RefCell<Run>>) -> Result<()> {
        let steps_left = run.borrow().next_step < self.config.progress_steps.len();
        let delay = if steps_left {
            self.dice
                .range_u32(self.config.step_delay_min_ms, self.config.step_delay_max_ms)
        } else {
            self.config.settle_ms
        };
        let weak: Weak<RefCell<Run>> = Rc::downgrade(run);
        let this = self.clone();
        let timer = self.scheduler.after(
            delay,
            Box::new(move || {
                if let Some(run) = weak.upgrade() {
                    this.advance(&run);
                }
            }),
        )?;
        run.borrow_mut().pending = Some(timer);
        Ok(())
    }

    fn advance(&self, run: &Rc<RefCell<Run>>) {
        let mut r = run.borrow_mut();
        if r.on_done.is_none() {
            return;
        }
        if let Some(&step) = self.config.progress_steps.get(r.next_step) {
            r.next_step += 1;
            let width = format!("{}%", step.min(100));
            r.container.set_style(BAR_SELECTOR, "width", &width);
            if let Some(msg) = self.dice.pick(&self.config.messages) {
                r.container.set_text(MESSAGE_SELECTOR, msg);
            }
            drop(r);
            if let Err(e) = self.schedule(run) {
                warn!("verification stalled: {e}");
            }
        } else {
            r.container.set_text(MESSAGE_SELECTOR, &r.success);
            let done = r.on_done.take();
            let finished_timer = r.pending.take();
            drop(r);
            drop(finished_timer);
            if let Some(done) = done {
                done();
            }
        }
    }
}
