//! Ambient per-level feedback: the elapsed clock and the "patience" meter.
//!
//! The tracker never influences win conditions. A session starts on every
//! level load and must be stopped before the next one starts; the orchestrator
//! owns the [`EngagementSession`] and does both.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

use crate::config::EngagementConfig;
use crate::dice::Dice;
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::platform::{Container, Hud, Scheduler};

pub const METER_MAX: u8 = 100;

/// Per-level, recreated by every `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementState {
    pub start_ms: f64,
    pub elapsed_ms: f64,
    pub meter: u8,
    pub interactions: u32,
}

impl EngagementState {
    fn fresh(now: f64) -> Self {
        Self {
            start_ms: now,
            elapsed_ms: 0.0,
            meter: 0,
            interactions: 0,
        }
    }

    pub fn elapsed_display(&self) -> String {
        format_clock(self.elapsed_ms)
    }
}

/// `mm:ss` from milliseconds, flooring partial seconds.
pub fn format_clock(elapsed_ms: f64) -> String {
    let secs = (elapsed_ms.max(0.0) / 1000.0).floor() as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

struct TrackerInner {
    config: EngagementConfig,
    scheduler: Rc<dyn Scheduler>,
    hud: Rc<dyn Hud>,
    dice: Dice,
    state: RefCell<EngagementState>,
}

/// Cloneable handle; challenges receive one to signal their own bumps.
#[derive(Clone)]
pub struct EngagementTracker {
    inner: Rc<TrackerInner>,
}

/// The running interval and click listener of one level. Dropping it (or
/// calling `stop`) cancels both.
pub struct EngagementSession {
    ticker: Disposer,
    clicks: Option<Disposer>,
}

impl EngagementSession {
    /// Stop counting clicks but keep the clock running.
    pub fn detach_clicks(&mut self) -> Option<Disposer> {
        self.clicks.take()
    }

    pub fn is_counting_clicks(&self) -> bool {
        self.clicks.is_some()
    }

    pub fn stop(self) {
        let Self { ticker, clicks } = self;
        if let Some(c) = clicks {
            c.dispose();
        }
        ticker.dispose();
    }
}

impl EngagementTracker {
    pub fn new(
        config: EngagementConfig,
        scheduler: Rc<dyn Scheduler>,
        hud: Rc<dyn Hud>,
        dice: Dice,
    ) -> Self {
        let now = scheduler.now_ms();
        Self {
            inner: Rc::new(TrackerInner {
                config,
                scheduler,
                hud,
                dice,
                state: RefCell::new(EngagementState::fresh(now)),
            }),
        }
    }

    /// Reset the meter, restart the clock, and begin ticking and counting
    /// clicks inside `container`.
    pub fn start(&self, container: &Rc<dyn Container>) -> Result<EngagementSession> {
        let now = self.inner.scheduler.now_ms();
        *self.inner.state.borrow_mut() = EngagementState::fresh(now);
        self.inner.hud.show_meter(0);
        self.inner.hud.show_elapsed(&format_clock(0.0));

        let weak = Rc::downgrade(&self.inner);
        let ticker = self.inner.scheduler.every(
            self.inner.config.tick_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    EngagementTracker { inner }.tick();
                }
            }),
        )?;

        let weak: Weak<TrackerInner> = Rc::downgrade(&self.inner);
        let clicks = container.listen(
            None,
            "click",
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    EngagementTracker { inner }.interaction();
                }
            }),
        )?;

        Ok(EngagementSession {
            ticker,
            clicks: Some(clicks),
        })
    }

    /// Refresh the elapsed clock.
    pub fn tick(&self) {
        let now = self.inner.scheduler.now_ms();
        let clock = {
            let mut st = self.inner.state.borrow_mut();
            st.elapsed_ms = now - st.start_ms;
            st.elapsed_display()
        };
        self.inner.hud.show_elapsed(&clock);
    }

    /// Add `delta` to the meter, clamped to `0..=100`.
    pub fn bump(&self, delta: i32) {
        let meter = {
            let mut st = self.inner.state.borrow_mut();
            let next = (st.meter as i32).saturating_add(delta).clamp(0, METER_MAX as i32);
            st.meter = next as u8;
            st.meter
        };
        self.inner.hud.show_meter(meter);
    }

    pub fn reset(&self) {
        {
            let mut st = self.inner.state.borrow_mut();
            st.meter = 0;
            st.interactions = 0;
        }
        self.inner.hud.show_meter(0);
    }

    /// One raw click somewhere in the challenge area.
    pub fn interaction(&self) {
        let cfg = &self.inner.config;
        let count = {
            let mut st = self.inner.state.borrow_mut();
            st.interactions += 1;
            st.interactions
        };
        self.bump(self.inner.dice.range(cfg.click_delta_min, cfg.click_delta_max));
        if count % cfg.taunt_every == 0 {
            if let Some(taunt) = self.inner.dice.pick(&cfg.taunts) {
                debug!("taunting after {count} clicks");
                self.inner.hud.popup(taunt);
            }
        }
    }

    pub fn state(&self) -> EngagementState {
        *self.inner.state.borrow()
    }

    pub fn meter(&self) -> u8 {
        self.inner.state.borrow().meter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::Rig;

    fn tracker(rig: &Rig) -> EngagementTracker {
        EngagementTracker::new(
            EngagementConfig::default(),
            rig.scheduler.clone(),
            rig.hud.clone(),
            Dice::seeded(11),
        )
    }

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(999.0), "00:00");
        assert_eq!(format_clock(61_500.0), "01:01");
        assert_eq!(format_clock(3_600_000.0), "60:00");
        assert_eq!(format_clock(-20.0), "00:00");
    }

    #[test]
    fn meter_stays_in_bounds() {
        let rig = Rig::new(1);
        let t = tracker(&rig);
        for delta in [5, 90, 40, -300, 7, i32::MAX, i32::MIN, 100, -1] {
            t.bump(delta);
            assert!(t.meter() <= METER_MAX);
            assert_eq!(rig.hud.meter(), t.meter());
        }
        assert_eq!(t.meter(), 99);
    }

    #[test]
    fn clock_ticks_every_half_second() {
        let rig = Rig::new(1);
        let t = tracker(&rig);
        let container = rig.container_handle();
        let _session = t.start(&container).unwrap();
        rig.scheduler.advance(1_499.0);
        assert_eq!(rig.hud.elapsed(), "00:01");
        rig.scheduler.advance(64_000.0);
        assert_eq!(rig.hud.elapsed(), "01:05");
    }

    #[test]
    fn every_seventh_click_taunts() {
        let rig = Rig::new(1);
        let t = tracker(&rig);
        let container = rig.container_handle();
        let _session = t.start(&container).unwrap();
        for n in 1..=20 {
            rig.container.click_container();
            let expected = n / 7;
            assert_eq!(rig.hud.popups().len(), expected as usize, "after click {n}");
        }
        let taunts = EngagementConfig::default().taunts;
        assert!(rig.hud.popups().iter().all(|p| taunts.contains(p)));
        assert_eq!(t.state().interactions, 20);
        // 20 clicks at +1..=+3 each
        assert!((20..=60).contains(&(t.meter() as u32)));
    }

    #[test]
    fn stopping_cancels_interval_and_listener() {
        let rig = Rig::new(1);
        let t = tracker(&rig);
        let container = rig.container_handle();
        let session = t.start(&container).unwrap();
        assert_eq!(rig.scheduler.pending(), 1);
        assert_eq!(rig.container.listener_count(), 1);
        session.stop();
        assert_eq!(rig.scheduler.pending(), 0);
        assert_eq!(rig.container.listener_count(), 0);
        rig.container.click_container();
        assert_eq!(t.state().interactions, 0);
    }

    #[test]
    fn detaching_clicks_keeps_the_clock() {
        let rig = Rig::new(1);
        let t = tracker(&rig);
        let container = rig.container_handle();
        let mut session = t.start(&container).unwrap();
        drop(session.detach_clicks());
        assert!(!session.is_counting_clicks());
        rig.container.click_container();
        assert_eq!(t.meter(), 0);
        rig.scheduler.advance(2_000.0);
        assert_eq!(rig.hud.elapsed(), "00:02");
    }

    #[test]
    fn reset_zeroes_meter_and_interactions() {
        let rig = Rig::new(1);
        let t = tracker(&rig);
        let container = rig.container_handle();
        let _session = t.start(&container).unwrap();
        for _ in 0..4 {
            rig.container.click_container();
        }
        t.bump(30);
        assert!(t.meter() > 0);
        t.reset();
        assert_eq!(t.meter(), 0);
        assert_eq!(t.state().interactions, 0);
        assert_eq!(rig.hud.meter(), 0);
    }

    #[test]
    fn start_resets_previous_level() {
        let rig = Rig::new(1);
        let t = tracker(&rig);
        t.bump(50);
        let container = rig.container_handle();
        let _s = t.start(&container).unwrap();
        assert_eq!(t.meter(), 0);
        assert_eq!(rig.hud.meter(), 0);
        assert_eq!(rig.hud.elapsed(), "00:00");
    }
}
