//! The seams between the engine and whatever hosts it.
//!
//! The browser build implements these with `web-sys` (see `web.rs`); tests and
//! native hosts use the in-memory versions in `headless.rs`.

use std::rc::Rc;

use crate::dice::Dice;
use crate::error::Result;
use crate::lifecycle::Disposer;

/// The single mount point every challenge renders into.
///
/// Selectors are resolved inside the container only. Events fired on a child
/// bubble up to listeners registered on the container itself (`selector` of
/// `None`).
pub trait Container {
    fn clear(&self);
    fn set_html(&self, html: &str);
    fn append_html(&self, html: &str);
    fn set_text(&self, selector: &str, text: &str);
    fn set_style(&self, selector: &str, property: &str, value: &str);
    fn set_disabled(&self, selector: &str, disabled: bool);
    /// Current value of an input/textarea, if the element exists.
    fn value(&self, selector: &str) -> Option<String>;
    fn listen(
        &self,
        selector: Option<&str>,
        event: &str,
        handler: Box<dyn FnMut()>,
    ) -> Result<Disposer>;
}

/// Read-only displays the shell keeps around the challenge area.
pub trait Hud {
    fn show_level(&self, level: u32);
    fn show_elapsed(&self, clock: &str);
    fn show_meter(&self, percent: u8);
    fn set_next_enabled(&self, enabled: bool);
    fn popup(&self, text: &str);
}

/// Timer source. Dropping (or disposing) the returned guard cancels the timer.
pub trait Scheduler {
    fn now_ms(&self) -> f64;
    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Result<Disposer>;
    fn after(&self, delay_ms: u32, fire: Box<dyn FnOnce()>) -> Result<Disposer>;
}

#[derive(Clone)]
pub struct Platform {
    pub container: Rc<dyn Container>,
    pub hud: Rc<dyn Hud>,
    pub scheduler: Rc<dyn Scheduler>,
    pub dice: Dice,
}

impl Platform {
    pub fn new(
        container: Rc<dyn Container>,
        hud: Rc<dyn Hud>,
        scheduler: Rc<dyn Scheduler>,
        dice: Dice,
    ) -> Self {
        Self {
            container,
            hud,
            scheduler,
            dice,
        }
    }
}
