// Level 1: Click the Moving Button.
// Ten clicks win. The button hops somewhere else after every click, and after
// 200ms of hovering. Completion lands one second after the tenth click.
use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::dice::Dice;
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::platform::{Container, Scheduler};
use crate::registry::{Challenge, MountContext};

pub const CLICKS_TO_WIN: u32 = 10;
pub const HOVER_DODGE_MS: u32 = 200;
pub const COMPLETE_DELAY_MS: u32 = 1000;

pub const BUTTON: &str = "#moving-btn";
pub const COUNT: &str = "#click-count";
pub const PROGRESS: &str = "#click-progress";

const MARKUP: &str = r#"<div class="center">
  <h3 class="challenge-title">Level 1</h3>
  <p class="challenge-desc">Click the button 10 times to complete the level. But be careful - it moves when you hover too long!</p>
  <div class="game-area" style="position:relative;width:100%;height:300px;border:2px dashed #2a3550;border-radius:12px;margin:20px 0;">
    <button id="moving-btn" class="primary" style="position:absolute;top:50%;left:50%;transform:translate(-50%,-50%);">Click Me!</button>
  </div>
  <div class="progress-info">
    <div>Clicks: <span id="click-count">0</span>/10</div>
    <div class="progress"><div id="click-progress" style="width:0%"></div></div>
  </div>
</div>"#;

pub struct MovingButton;

#[derive(Default)]
struct ButtonState {
    clicks: u32,
    hover_timer: Option<Disposer>,
    finish_timer: Option<Disposer>,
}

/// Jump to a random spot inside the play area (percent offsets keep it
/// within bounds without measuring the layout).
fn dodge(container: &dyn Container, dice: &Dice) {
    let left = dice.range(5, 80);
    let top = dice.range(5, 80);
    container.set_style(BUTTON, "left", &format!("{left}%"));
    container.set_style(BUTTON, "top", &format!("{top}%"));
    container.set_style(BUTTON, "transform", "none");
}

fn show_progress(container: &dyn Container, clicks: u32) {
    container.set_text(COUNT, &clicks.to_string());
    let pct = clicks.min(CLICKS_TO_WIN) * 100 / CLICKS_TO_WIN;
    container.set_style(PROGRESS, "width", &format!("{pct}%"));
}

impl Challenge for MovingButton {
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        ctx.container.set_html(MARKUP);
        show_progress(ctx.container.as_ref(), 0);

        let state = Rc::new(RefCell::new(ButtonState::default()));
        let mut cleanup = Disposer::noop();
        {
            let state = state.clone();
            cleanup.push(move || {
                let mut st = state.borrow_mut();
                let timers = (st.hover_timer.take(), st.finish_timer.take());
                drop(st);
                drop(timers);
            });
        }

        // Click: count, move, and eventually schedule the win.
        {
            let state = state.clone();
            let container = ctx.container.clone();
            let scheduler: Rc<dyn Scheduler> = ctx.scheduler.clone();
            let dice = ctx.dice.clone();
            let completion = ctx.completion.clone();
            cleanup.adopt(ctx.container.listen(
                Some(BUTTON),
                "click",
                Box::new(move || {
                    let clicks = {
                        let mut st = state.borrow_mut();
                        if st.clicks >= CLICKS_TO_WIN {
                            return;
                        }
                        st.clicks += 1;
                        st.clicks
                    };
                    show_progress(container.as_ref(), clicks);
                    if clicks < CLICKS_TO_WIN {
                        dodge(container.as_ref(), &dice);
                        return;
                    }
                    container.set_text(BUTTON, "Complete!");
                    container.set_style(BUTTON, "pointer-events", "none");
                    container.set_style(BUTTON, "background", "var(--ok)");
                    let completion = completion.clone();
                    match scheduler.after(COMPLETE_DELAY_MS, Box::new(move || completion.complete())) {
                        Ok(timer) => state.borrow_mut().finish_timer = Some(timer),
                        Err(e) => warn!("level 1 finish timer failed: {e}"),
                    }
                }),
            )?);
        }

        // Hovering too long makes it dodge.
        {
            let state = state.clone();
            let container = ctx.container.clone();
            let scheduler = ctx.scheduler.clone();
            let dice = ctx.dice.clone();
            cleanup.adopt(ctx.container.listen(
                Some(BUTTON),
                "mouseenter",
                Box::new(move || {
                    if state.borrow().clicks >= CLICKS_TO_WIN {
                        return;
                    }
                    let container = container.clone();
                    let dice = dice.clone();
                    match scheduler.after(
                        HOVER_DODGE_MS,
                        Box::new(move || dodge(container.as_ref(), &dice)),
                    ) {
                        Ok(timer) => {
                            let previous = state.borrow_mut().hover_timer.replace(timer);
                            drop(previous);
                        }
                        Err(e) => warn!("level 1 hover timer failed: {e}"),
                    }
                }),
            )?);
        }
        {
            let state = state.clone();
            cleanup.adopt(ctx.container.listen(
                Some(BUTTON),
                "mouseleave",
                Box::new(move || {
                    let timer = state.borrow_mut().hover_timer.take();
                    drop(timer);
                }),
            )?);
        }

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

    fn level_one(rig: &Rig) -> Orchestrator {
        let registry = Registry::new()
            .with(LevelDescriptor::new(1, "Click the Moving Button", "", MovingButton))
            .unwrap();
        let o = Orchestrator::new(GauntletConfig::default(), registry, rig.platform()).unwrap();
        o.load_level(1).unwrap();
        o
    }

    #[test]
    fn ten_clicks_then_a_second_later_complete() {
        let rig = Rig::new(3);
        let o = level_one(&rig);
        for _ in 0..9 {
            rig.container.click(BUTTON);
        }
        assert_eq!(rig.container.text(COUNT).as_deref(), Some("9"));
        assert!(!o.is_current_complete());

        rig.container.click(BUTTON);
        assert_eq!(rig.container.text(BUTTON).as_deref(), Some("Complete!"));
        assert_eq!(rig.container.style(PROGRESS, "width").as_deref(), Some("100%"));
        rig.scheduler.advance((COMPLETE_DELAY_MS - 1) as f64);
        assert!(!o.is_current_complete());
        rig.scheduler.advance(1.0);
        assert!(o.is_current_complete());
        assert!(o.completed_levels().contains(&1));
    }

    #[test]
    fn extra_clicks_after_the_tenth_are_ignored() {
        let rig = Rig::new(3);
        let o = level_one(&rig);
        for _ in 0..15 {
            rig.container.click(BUTTON);
        }
        assert_eq!(rig.container.text(COUNT).as_deref(), Some("10"));
        rig.scheduler.advance(5_000.0);
        assert_eq!(o.completed_levels().len(), 1);
    }

    #[test]
    fn hovering_makes_it_dodge_unless_you_leave() {
        let rig = Rig::new(3);
        let _o = level_one(&rig);

        rig.container.fire(BUTTON, "mouseenter");
        rig.container.fire(BUTTON, "mouseleave");
        rig.scheduler.advance(HOVER_DODGE_MS as f64);
        assert_eq!(rig.container.style(BUTTON, "transform"), None);

        rig.container.fire(BUTTON, "mouseenter");
        rig.scheduler.advance(HOVER_DODGE_MS as f64);
        assert_eq!(rig.container.style(BUTTON, "transform").as_deref(), Some("none"));
        let left = rig.container.style(BUTTON, "left").unwrap();
        let pct: i32 = left.trim_end_matches('%').parse().unwrap();
        assert!((5..=80).contains(&pct));
    }

    #[test]
    fn leaving_mid_countdown_cancels_the_win() {
        let rig = Rig::new(3);
        let o = level_one(&rig);
        for _ in 0..10 {
            rig.container.click(BUTTON);
        }
        o.load_level(2).unwrap();
        rig.scheduler.advance(5_000.0);
        assert!(o.completed_levels().is_empty());
    }
}
