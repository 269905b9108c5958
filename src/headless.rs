//! In-memory platform: a manual clock, a container that records what was
//! rendered, and a HUD that records what was displayed.
//!
//! Used by the test suites and by native hosts that want to drive the engine
//! without a browser. Selectors are matched literally; there is no DOM tree.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::dice::Dice;
use crate::error::Result;
use crate::lifecycle::Disposer;
use crate::platform::{Container, Hud, Platform, Scheduler};

type SharedCallback = Rc<RefCell<Box<dyn FnMut()>>>;

// --- Scheduler ----------------------------------------------------------------

struct TimerEntry {
    id: u64,
    due: f64,
    period: Option<f64>,
    callback: SharedCallback,
}

#[derive(Default)]
struct SchedulerInner {
    now: Cell<f64>,
    next_id: Cell<u64>,
    timers: RefCell<Vec<TimerEntry>>,
}

/// Time only moves when `advance` is called. Timers fire in due order (ties in
/// creation order) and may schedule or cancel other timers while firing.
#[derive(Default)]
pub struct ManualScheduler {
    inner: Rc<SchedulerInner>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        let target = self.inner.now.get() + ms.max(0.0);
        loop {
            let callback = {
                let mut timers = self.inner.timers.borrow_mut();
                let next = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
                    .map(|(idx, _)| idx);
                let Some(idx) = next else { break };
                let due = timers[idx].due;
                self.inner.now.set(due);
                match timers[idx].period {
                    Some(period) => {
                        timers[idx].due = due + period;
                        timers[idx].callback.clone()
                    }
                    None => timers.swap_remove(idx).callback,
                }
            };
            let mut fire = callback.borrow_mut();
            (*fire)();
        }
        self.inner.now.set(target);
    }

    /// Timers still scheduled.
    pub fn pending(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    fn add(&self, delay_ms: u32, period: Option<f64>, callback: Box<dyn FnMut()>) -> Disposer {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.timers.borrow_mut().push(TimerEntry {
            id,
            due: self.inner.now.get() + delay_ms as f64,
            period,
            callback: Rc::new(RefCell::new(callback)),
        });
        let weak: Weak<SchedulerInner> = Rc::downgrade(&self.inner);
        Disposer::from_fn(move || {
            if let Some(inner) = weak.upgrade() {
                inner.timers.borrow_mut().retain(|t| t.id != id);
            }
        })
    }
}

impl Scheduler for ManualScheduler {
    fn now_ms(&self) -> f64 {
        self.inner.now.get()
    }

    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Result<Disposer> {
        let period = period_ms.max(1) as f64;
        Ok(self.add(period_ms.max(1), Some(period), tick))
    }

    fn after(&self, delay_ms: u32, fire: Box<dyn FnOnce()>) -> Result<Disposer> {
        let mut fire = Some(fire);
        Ok(self.add(
            delay_ms,
            None,
            Box::new(move || {
                if let Some(f) = fire.take() {
                    f();
                }
            }),
        ))
    }
}

// --- Container ----------------------------------------------------------------

/// One entry per container operation, for ordering assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Clear,
    SetHtml,
    AppendHtml,
}

struct ListenerEntry {
    id: u64,
    selector: Option<String>,
    event: String,
    callback: SharedCallback,
}

#[derive(Default)]
struct ContainerState {
    html: String,
    texts: HashMap<String, String>,
    styles: HashMap<(String, String), String>,
    values: HashMap<String, String>,
    disabled: HashMap<String, bool>,
    journal: Vec<Op>,
}

#[derive(Default)]
struct ContainerInner {
    state: RefCell<ContainerState>,
    listeners: RefCell<Vec<ListenerEntry>>,
    next_id: Cell<u64>,
}

#[derive(Default)]
pub struct RecordingContainer {
    inner: Rc<ContainerInner>,
}

impl RecordingContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` on `selector`, then let it bubble to container listeners.
    pub fn fire(&self, selector: &str, event: &str) {
        self.dispatch(Some(selector), event);
        self.dispatch(None, event);
    }

    pub fn click(&self, selector: &str) {
        self.fire(selector, "click");
    }

    /// A click on the container background (no child target).
    pub fn click_container(&self) {
        self.dispatch(None, "click");
    }

    /// Simulate the user typing into an input, firing `input`.
    pub fn input(&self, selector: &str, value: &str) {
        self.inner
            .state
            .borrow_mut()
            .values
            .insert(selector.to_string(), value.to_string());
        self.fire(selector, "input");
    }

    pub fn html(&self) -> String {
        self.inner.state.borrow().html.clone()
    }

    pub fn text(&self, selector: &str) -> Option<String> {
        self.inner.state.borrow().texts.get(selector).cloned()
    }

    pub fn style(&self, selector: &str, property: &str) -> Option<String> {
        self.inner
            .state
            .borrow()
            .styles
            .get(&(selector.to_string(), property.to_string()))
            .cloned()
    }

    pub fn is_disabled(&self, selector: &str) -> bool {
        self.inner
            .state
            .borrow()
            .disabled
            .get(selector)
            .copied()
            .unwrap_or(false)
    }

    pub fn journal(&self) -> Vec<Op> {
        self.inner.state.borrow().journal.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.journal().iter().filter(|op| **op == Op::Clear).count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn dispatch(&self, selector: Option<&str>, event: &str) {
        let matching: Vec<(u64, SharedCallback)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.event == event && l.selector.as_deref() == selector)
            .map(|l| (l.id, l.callback.clone()))
            .collect();
        for (id, callback) in matching {
            // Listeners removed by an earlier handler in this dispatch are skipped.
            let live = self.inner.listeners.borrow().iter().any(|l| l.id == id);
            if live {
                let mut handler = callback.borrow_mut();
                (*handler)();
            }
        }
    }
}

impl Container for RecordingContainer {
    fn clear(&self) {
        let mut st = self.inner.state.borrow_mut();
        st.html.clear();
        st.texts.clear();
        st.styles.clear();
        st.values.clear();
        st.disabled.clear();
        st.journal.push(Op::Clear);
    }

    fn set_html(&self, html: &str) {
        let mut st = self.inner.state.borrow_mut();
        st.html = html.to_string();
        st.journal.push(Op::SetHtml);
    }

    fn append_html(&self, html: &str) {
        let mut st = self.inner.state.borrow_mut();
        st.html.push_str(html);
        st.journal.push(Op::AppendHtml);
    }

    fn set_text(&self, selector: &str, text: &str) {
        self.inner
            .state
            .borrow_mut()
            .texts
            .insert(selector.to_string(), text.to_string());
    }

    fn set_style(&self, selector: &str, property: &str, value: &str) {
        self.inner
            .state
            .borrow_mut()
            .styles
            .insert((selector.to_string(), property.to_string()), value.to_string());
    }

    fn set_disabled(&self, selector: &str, disabled: bool) {
        self.inner
            .state
            .borrow_mut()
            .disabled
            .insert(selector.to_string(), disabled);
    }

    fn value(&self, selector: &str) -> Option<String> {
        self.inner.state.borrow().values.get(selector).cloned()
    }

    fn listen(
        &self,
        selector: Option<&str>,
        event: &str,
        handler: Box<dyn FnMut()>,
    ) -> Result<Disposer> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push(ListenerEntry {
            id,
            selector: selector.map(str::to_string),
            event: event.to_string(),
            callback: Rc::new(RefCell::new(handler)),
        });
        let weak: Weak<ContainerInner> = Rc::downgrade(&self.inner);
        Ok(Disposer::from_fn(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|l| l.id != id);
            }
        }))
    }
}

// --- HUD ----------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingHud {
    level: Cell<u32>,
    elapsed: RefCell<String>,
    meter: Cell<u8>,
    next_enabled: Cell<bool>,
    popups: RefCell<Vec<String>>,
}

impl RecordingHud {
    pub fn level(&self) -> u32 {
        self.level.get()
    }

    pub fn elapsed(&self) -> String {
        self.elapsed.borrow().clone()
    }

    pub fn meter(&self) -> u8 {
        self.meter.get()
    }

    pub fn next_enabled(&self) -> bool {
        self.next_enabled.get()
    }

    pub fn popups(&self) -> Vec<String> {
        self.popups.borrow().clone()
    }
}

impl Hud for RecordingHud {
    fn show_level(&self, level: u32) {
        self.level.set(level);
    }

    fn show_elapsed(&self, clock: &str) {
        *self.elapsed.borrow_mut() = clock.to_string();
    }

    fn show_meter(&self, percent: u8) {
        self.meter.set(percent);
    }

    fn set_next_enabled(&self, enabled: bool) {
        self.next_enabled.set(enabled);
    }

    fn popup(&self, text: &str) {
        self.popups.borrow_mut().push(text.to_string());
    }
}

// --- Rig ----------------------------------------------------------------------

/// The three headless pieces plus a seeded dice, with concrete types kept so
/// tests can poke at them.
pub struct Rig {
    pub container: Rc<RecordingContainer>,
    pub hud: Rc<RecordingHud>,
    pub scheduler: Rc<ManualScheduler>,
    pub dice: Dice,
}

impl Rig {
    pub fn new(seed: u64) -> Self {
        Self {
            container: Rc::new(RecordingContainer::new()),
            hud: Rc::new(RecordingHud::default()),
            scheduler: Rc::new(ManualScheduler::new()),
            dice: Dice::seeded(seed),
        }
    }

    pub fn container_handle(&self) -> Rc<dyn Container> {
        self.container.clone()
    }

    pub fn platform(&self) -> Platform {
        Platform::new(
            self.container.clone(),
            self.hud.clone(),
            self.scheduler.clone(),
            self.dice.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_due_order() {
        let s = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (log.clone(), log.clone());
        let _late = s.after(300, Box::new(move || a.borrow_mut().push("late"))).unwrap();
        let _early = s.after(100, Box::new(move || b.borrow_mut().push("early"))).unwrap();
        s.advance(500.0);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(s.now_ms(), 500.0);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn interval_repeats_until_dropped() {
        let s = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let guard = s.every(500, Box::new(move || h.set(h.get() + 1))).unwrap();
        s.advance(1_600.0);
        assert_eq!(hits.get(), 3);
        drop(guard);
        s.advance(5_000.0);
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn callbacks_can_cancel_themselves() {
        let s = Rc::new(ManualScheduler::new());
        let slot: Rc<RefCell<Option<Disposer>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));
        let (h, sl) = (hits.clone(), slot.clone());
        let guard = s
            .every(
                100,
                Box::new(move || {
                    h.set(h.get() + 1);
                    sl.borrow_mut().take();
                }),
            )
            .unwrap();
        *slot.borrow_mut() = Some(guard);
        s.advance(1_000.0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn child_clicks_bubble_to_container_listeners() {
        let c = RecordingContainer::new();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (hits.clone(), hits.clone());
        let _btn = c
            .listen(Some("#btn"), "click", Box::new(move || a.borrow_mut().push("btn")))
            .unwrap();
        let _bg = c
            .listen(None, "click", Box::new(move || b.borrow_mut().push("container")))
            .unwrap();
        c.click("#btn");
        c.click_container();
        assert_eq!(*hits.borrow(), vec!["btn", "container", "container"]);
    }

    #[test]
    fn clear_wipes_rendered_state_and_is_journaled() {
        let c = RecordingContainer::new();
        c.set_html("<b>hi</b>");
        c.set_text("#x", "y");
        c.clear();
        assert_eq!(c.html(), "");
        assert_eq!(c.text("#x"), None);
        assert_eq!(c.journal(), vec![Op::SetHtml, Op::Clear]);
    }
}
