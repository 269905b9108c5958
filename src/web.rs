//! Browser implementations of the platform seams, the page shell around the
//! challenge area, and the functions exported to JavaScript.
//!
//! Pages may ship their own markup for the HUD and the challenge container;
//! anything missing is created as a fixed overlay on first start.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, EventTarget, HtmlElement, HtmlInputElement, HtmlTextAreaElement, Window};

use crate::challenges::default_registry;
use crate::config::GauntletConfig;
use crate::dice::Dice;
use crate::error::{GauntletError, Result};
use crate::lifecycle::Disposer;
use crate::logging;
use crate::orchestrator::Orchestrator;
use crate::platform::{Container, Hud, Platform, Scheduler};

pub const CONTAINER_ID: &str = "challenge-container";
const POPUP_MS: i32 = 3000;
const VIEWS: [&str; 3] = ["landing", "game", "leaderboard"];
const LEADERBOARD: [&str; 10] = [
    "You", "Ava", "Liam", "Noah", "Mia", "Olivia", "Ethan", "Zoe", "Kai", "Nova",
];
const RAGE_QUIT_POPUP: &str = "Snail wins again. 🐌";

fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| GauntletError::dom("no window"))
}

fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| GauntletError::dom("no document"))
}

/// Attach `handler` to `target`; the returned guard removes it again and
/// frees the closure.
fn bind(target: EventTarget, event: &str, handler: Box<dyn FnMut()>) -> Result<Disposer> {
    let closure = Closure::<dyn FnMut()>::wrap(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    let event = event.to_string();
    Ok(Disposer::from_fn(move || {
        let _ = target.remove_event_listener_with_callback(&event, closure.as_ref().unchecked_ref());
        drop(closure);
    }))
}

// --- Container ----------------------------------------------------------------

pub struct DomContainer {
    root: HtmlElement,
}

impl DomContainer {
    pub fn new(root: HtmlElement) -> Self {
        Self { root }
    }

    /// Use `#challenge-container`, creating it under `<body>` if the page has none.
    pub fn attach(doc: &Document) -> Result<Self> {
        if let Some(el) = doc.get_element_by_id(CONTAINER_ID) {
            let root = el
                .dyn_into::<HtmlElement>()
                .map_err(|_| GauntletError::dom("#challenge-container is not an HTML element"))?;
            return Ok(Self::new(root));
        }
        let body = doc.body().ok_or_else(|| GauntletError::dom("no <body>"))?;
        let div: HtmlElement = doc
            .create_element("div")?
            .dyn_into()
            .map_err(|_| GauntletError::dom("created <div> is not an HTML element"))?;
        div.set_id(CONTAINER_ID);
        div.set_attribute("style", "max-width:860px; margin:64px auto 24px; padding:16px; border-radius:16px; background:#0b1226; color:#e8eefc; font-family:'Fira Code', monospace;").ok();
        body.append_child(&div)?;
        Ok(Self::new(div))
    }

    fn element(&self, selector: &str) -> Option<Element> {
        self.root.query_selector(selector).ok().flatten()
    }

    fn html_element(&self, selector: &str) -> Option<HtmlElement> {
        self.element(selector)?.dyn_into::<HtmlElement>().ok()
    }
}

impl Container for DomContainer {
    fn clear(&self) {
        self.root.set_inner_html("");
    }

    fn set_html(&self, html: &str) {
        self.root.set_inner_html(html);
    }

    fn append_html(&self, html: &str) {
        if let Err(e) = self.root.insert_adjacent_html("beforeend", html) {
            warn!("append to challenge container failed: {e:?}");
        }
    }

    fn set_text(&self, selector: &str, text: &str) {
        if let Some(el) = self.element(selector) {
            el.set_text_content(Some(text));
        }
    }

    fn set_style(&self, selector: &str, property: &str, value: &str) {
        if let Some(el) = self.html_element(selector) {
            el.style().set_property(property, value).ok();
        }
    }

    fn set_disabled(&self, selector: &str, disabled: bool) {
        if let Some(el) = self.element(selector) {
            if disabled {
                el.set_attribute("disabled", "").ok();
            } else {
                el.remove_attribute("disabled").ok();
            }
        }
    }

    fn value(&self, selector: &str) -> Option<String> {
        let el = self.element(selector)?;
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        el.dyn_ref::<HtmlTextAreaElement>().map(|t| t.value())
    }

    fn listen(
        &self,
        selector: Option<&str>,
        event: &str,
        handler: Box<dyn FnMut()>,
    ) -> Result<Disposer> {
        let target: EventTarget = match selector {
            None => self.root.clone().into(),
            Some(sel) => self
                .element(sel)
                .ok_or_else(|| GauntletError::dom(format!("nothing matches {sel}")))?
                .into(),
        };
        bind(target, event, handler)
    }
}

// --- Scheduler ----------------------------------------------------------------

pub struct BrowserScheduler {
    window: Window,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Scheduler for BrowserScheduler {
    fn now_ms(&self) -> f64 {
        self.window.performance().map(|p| p.now()).unwrap_or(0.0)
    }

    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Result<Disposer> {
        let closure = Closure::<dyn FnMut()>::wrap(tick);
        let handle = self.window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            period_ms.min(i32::MAX as u32) as i32,
        )?;
        let window = self.window.clone();
        Ok(Disposer::from_fn(move || {
            window.clear_interval_with_handle(handle);
            drop(closure);
        }))
    }

    fn after(&self, delay_ms: u32, fire: Box<dyn FnOnce()>) -> Result<Disposer> {
        let mut fire = Some(fire);
        let closure = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            if let Some(f) = fire.take() {
                f();
            }
        }));
        let handle = self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms.min(i32::MAX as u32) as i32,
        )?;
        let window = self.window.clone();
        Ok(Disposer::from_fn(move || {
            window.clear_timeout_with_handle(handle);
            drop(closure);
        }))
    }
}

// --- HUD ----------------------------------------------------------------------

pub struct DomHud {
    document: Document,
}

impl DomHud {
    /// Bind to the page HUD, creating the pieces it lacks.
    pub fn attach(doc: &Document) -> Result<Self> {
        ensure_overlay(
            doc,
            "level-index",
            "1",
            "position:fixed; top:10px; left:12px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45;",
        )?;
        ensure_overlay(
            doc,
            "timer-value",
            "00:00",
            "position:fixed; top:10px; left:80px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45;",
        )?;
        if doc.get_element_by_id("patience-fill").is_none() {
            if let Some(body) = doc.body() {
                let track = doc.create_element("div")?;
                track.set_attribute("style", "position:fixed; top:14px; left:170px; width:160px; height:10px; background:#2a3550; border-radius:5px; overflow:hidden; z-index:45;").ok();
                track.set_inner_html("<div id='patience-fill' style='height:100%; width:0%; background:linear-gradient(90deg,#59ffa5,#ff4d4d);'></div>");
                body.append_child(&track)?;
            }
        }
        Ok(Self {
            document: doc.clone(),
        })
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }
}

fn ensure_overlay(doc: &Document, id: &str, text: &str, style: &str) -> Result<()> {
    if doc.get_element_by_id(id).is_none() {
        if let Some(body) = doc.body() {
            let div = doc.create_element("div")?;
            div.set_id(id);
            div.set_text_content(Some(text));
            div.set_attribute("style", style).ok();
            body.append_child(&div)?;
        }
    }
    Ok(())
}

impl Hud for DomHud {
    fn show_level(&self, level: u32) {
        if let Some(el) = self.by_id("level-index") {
            el.set_text_content(Some(&level.to_string()));
        }
    }

    fn show_elapsed(&self, clock: &str) {
        if let Some(el) = self.by_id("timer-value") {
            el.set_text_content(Some(clock));
        }
    }

    fn show_meter(&self, percent: u8) {
        if let Some(el) = self.by_id("patience-fill").and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
            el.style().set_property("width", &format!("{percent}%")).ok();
        }
    }

    fn set_next_enabled(&self, enabled: bool) {
        if let Some(el) = self.by_id("next-btn") {
            if enabled {
                el.remove_attribute("disabled").ok();
            } else {
                el.set_attribute("disabled", "").ok();
            }
        }
    }

    fn popup(&self, text: &str) {
        if let Err(e) = show_popup(&self.document, text) {
            warn!("popup failed: {e}");
        }
    }
}

/// A toast appended to `<body>` that removes itself after three seconds.
fn show_popup(doc: &Document, text: &str) -> Result<()> {
    let body = doc.body().ok_or_else(|| GauntletError::dom("no <body>"))?;
    let el = doc.create_element("div")?;
    el.set_class_name("popup");
    el.set_text_content(Some(text));
    body.append_child(&el)?;
    let remove = Closure::once_into_js(move || el.remove());
    window()?.set_timeout_with_callback_and_timeout_and_arguments_0(remove.unchecked_ref(), POPUP_MS)?;
    Ok(())
}

// --- Shell --------------------------------------------------------------------

/// The page around the challenge area: view switching and the top-level
/// buttons. Buttons the page does not have are skipped.
struct Shell {
    orchestrator: Orchestrator,
    verify_run: Rc<RefCell<Option<Disposer>>>,
    _listeners: Disposer,
}

thread_local! {
    static SHELL: RefCell<Option<Shell>> = const { RefCell::new(None) };
}

fn show_view(doc: &Document, id: &str) {
    for view in VIEWS {
        if let Some(el) = doc.get_element_by_id(view) {
            el.class_list().toggle_with_force("visible", view == id).ok();
        }
    }
}

fn render_leaderboard(doc: &Document) {
    if let Some(list) = doc.get_element_by_id("leaderboard-list") {
        let rows: String = LEADERBOARD
            .iter()
            .map(|name| format!("<li><span>{name}</span><span>Level 2</span></li>"))
            .collect();
        list.set_inner_html(&rows);
    }
}

fn on(doc: &Document, id: &str, event: &str, handler: Box<dyn FnMut()>) -> Result<Disposer> {
    match doc.get_element_by_id(id) {
        Some(el) => bind(el.into(), event, handler),
        None => {
            debug!("page has no #{id}; not wired");
            Ok(Disposer::noop())
        }
    }
}

/// Cancel a shell-started verification, then navigate.
fn navigate(
    verify_run: &Rc<RefCell<Option<Disposer>>>,
    orchestrator: &Orchestrator,
    go: impl FnOnce(&Orchestrator) -> Result<()>,
) -> Result<()> {
    let pending = verify_run.borrow_mut().take();
    drop(pending);
    go(orchestrator)
}

impl Shell {
    fn wire(doc: &Document, orchestrator: Orchestrator) -> Result<Self> {
        let verify_run: Rc<RefCell<Option<Disposer>>> = Rc::new(RefCell::new(None));
        let mut listeners = Disposer::noop();

        {
            let (doc2, o, run) = (doc.clone(), orchestrator.clone(), verify_run.clone());
            listeners.adopt(on(
                doc,
                "start-btn",
                "click",
                Box::new(move || {
                    show_view(&doc2, "game");
                    if let Err(e) = navigate(&run, &o, |o| o.load_level(1)) {
                        error!("could not start: {e}");
                    }
                }),
            )?);
        }
        {
            // The start button shies away from the cursor.
            let (doc2, dice) = (doc.clone(), orchestrator.platform().dice.clone());
            let mut dodge = 0u32;
            listeners.adopt(on(
                doc,
                "start-btn",
                "mousemove",
                Box::new(move || {
                    dodge = (dodge + 1) % 4;
                    let sign = if dodge % 2 == 0 { 1 } else { -1 };
                    let dx = dice.range(-7, 7) * sign;
                    let dy = dice.range(-5, 5);
                    if let Some(el) = doc2
                        .get_element_by_id("start-btn")
                        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
                    {
                        el.style()
                            .set_property("transform", &format!("translate({dx}px, {dy}px)"))
                            .ok();
                    }
                }),
            )?);
        }
        {
            let (o, run) = (orchestrator.clone(), verify_run.clone());
            listeners.adopt(on(
                doc,
                "verify-btn",
                "click",
                Box::new(move || {
                    let unlock = o.clone();
                    let container = o.platform().container.clone();
                    match o
                        .verifier()
                        .run(&container, None, Box::new(move || unlock.unlock_next()))
                    {
                        Ok(guard) => {
                            let previous = run.borrow_mut().replace(guard);
                            drop(previous);
                        }
                        Err(e) => warn!("verification did not start: {e}"),
                    }
                }),
            )?);
        }
        {
            let (o, run) = (orchestrator.clone(), verify_run.clone());
            listeners.adopt(on(
                doc,
                "next-btn",
                "click",
                Box::new(move || {
                    if let Err(e) = navigate(&run, &o, Orchestrator::next_level) {
                        warn!("next level refused: {e}");
                    }
                }),
            )?);
        }
        {
            let (doc2, o, run) = (doc.clone(), orchestrator.clone(), verify_run.clone());
            listeners.adopt(on(
                doc,
                "rage-quit",
                "click",
                Box::new(move || {
                    let pending = run.borrow_mut().take();
                    drop(pending);
                    o.teardown();
                    o.platform().hud.popup(RAGE_QUIT_POPUP);
                    show_view(&doc2, "landing");
                }),
            )?);
        }
        {
            let doc2 = doc.clone();
            listeners.adopt(on(
                doc,
                "open-leaderboard",
                "click",
                Box::new(move || {
                    render_leaderboard(&doc2);
                    show_view(&doc2, "leaderboard");
                }),
            )?);
        }
        {
            let doc2 = doc.clone();
            listeners.adopt(on(
                doc,
                "back-to-game",
                "click",
                Box::new(move || show_view(&doc2, "game")),
            )?);
        }

        Ok(Self {
            orchestrator,
            verify_run,
            _listeners: listeners,
        })
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        let pending = self.verify_run.borrow_mut().take();
        drop(pending);
        self.orchestrator.teardown();
    }
}

fn with_shell<T>(f: impl FnOnce(&Orchestrator, &Rc<RefCell<Option<Disposer>>>) -> T) -> Option<T> {
    let handles = SHELL.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|s| (s.orchestrator.clone(), s.verify_run.clone()))
    });
    handles.map(|(o, run)| f(&o, &run))
}

fn not_started() -> GauntletError {
    GauntletError::Config("start_gauntlet has not been called".into())
}

// --- Exports ------------------------------------------------------------------

/// Build the engine against the current page and wire the shell buttons.
/// `config_json` is an optional `GauntletConfig` document. Calling it again
/// replaces the previous gauntlet.
#[wasm_bindgen]
pub fn start_gauntlet(config_json: Option<String>) -> std::result::Result<(), JsValue> {
    let config = match config_json.as_deref() {
        Some(json) => GauntletConfig::from_json(json)?,
        None => GauntletConfig::default(),
    };
    logging::init(config.log_filter());

    let previous = SHELL.with(|cell| cell.borrow_mut().take());
    drop(previous);

    let doc = document()?;
    let platform = Platform::new(
        Rc::new(DomContainer::attach(&doc)?),
        Rc::new(DomHud::attach(&doc)?),
        Rc::new(BrowserScheduler::new(window()?)),
        Dice::from_seed_option(config.seed),
    );
    let orchestrator = Orchestrator::new(config, default_registry()?, platform)?;
    let shell = Shell::wire(&doc, orchestrator)?;
    SHELL.with(|cell| *cell.borrow_mut() = Some(shell));
    info!("gauntlet ready");
    Ok(())
}

#[wasm_bindgen]
pub fn load_level(level: i32) -> std::result::Result<(), JsValue> {
    with_shell(|o, run| navigate(run, o, |o| o.load_level(level as i64)))
        .unwrap_or_else(|| Err(not_started()))?;
    Ok(())
}

#[wasm_bindgen]
pub fn next_level() -> std::result::Result<(), JsValue> {
    with_shell(|o, run| navigate(run, o, Orchestrator::next_level))
        .unwrap_or_else(|| Err(not_started()))?;
    Ok(())
}

/// 0 until `start_gauntlet` has run.
#[wasm_bindgen]
pub fn current_level() -> u32 {
    with_shell(|o, _| o.current_level()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn is_level_complete() -> bool {
    with_shell(|o, _| o.is_current_complete()).unwrap_or(false)
}
