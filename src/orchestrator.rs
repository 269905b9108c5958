//! Level orchestrator: the only owner of "which challenge is live".
//!
//! Lifecycle of one level load:
//! 1. bump the activation generation (any older `Completion` goes stale),
//! 2. tear down the previous level: stop its engagement session, release its
//!    disposer,
//! 3. clamp the requested id into `1..=total_levels`,
//! 4. clear the container, start a fresh engagement session,
//! 5. mount the registered challenge (or render the filler placeholder).
//!
//! No `RefCell` borrow is held while challenge code runs, so a challenge may
//! complete and navigate synchronously from inside `mount` or any callback.
//! A mount that gets superseded that way has its disposer released on the
//! spot instead of being stored.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};

use crate::config::GauntletConfig;
use crate::engagement::{EngagementSession, EngagementTracker};
use crate::error::{GauntletError, Result};
use crate::lifecycle::Disposer;
use crate::platform::Platform;
use crate::registry::{LevelId, MountContext, Registry};
use crate::verification::Verifier;

const PLACEHOLDER_BLURB: &str = "A mysterious trial. Probably rigged.";
const MOUNT_FAILURE_BLURB: &str = "The snail tripped over this one. Ask the verifier nicely.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing mounted yet (or torn down).
    Idle,
    /// A registered challenge is mounted and has not completed.
    Active,
    /// Filler level (or a failed mount); only external verification unlocks it.
    Placeholder,
    /// The live challenge reported completion.
    Completed,
}

/// Clamp a requested level into `1..=total`.
pub fn clamp_level(requested: i64, total: u32) -> LevelId {
    requested.clamp(1, total.max(1) as i64) as LevelId
}

struct OrchestratorState {
    current_level: LevelId,
    total_levels: u32,
    completed: BTreeSet<LevelId>,
    active_cleanup: Option<Disposer>,
    engagement: Option<EngagementSession>,
    phase: Phase,
    next_unlocked: bool,
    generation: u64,
}

type CompletionHook = Rc<dyn Fn(&Orchestrator, LevelId)>;

struct Inner {
    config: GauntletConfig,
    registry: Registry,
    platform: Platform,
    engagement: EngagementTracker,
    verifier: Verifier,
    state: RefCell<OrchestratorState>,
    completion_hook: RefCell<Option<CompletionHook>>,
}

/// Cheap cloneable handle; all clones drive the same state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Rc<Inner>,
}

/// Read-only view for the shell.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub current_level: LevelId,
    pub total_levels: u32,
    pub phase: Phase,
    pub is_current_complete: bool,
    pub next_unlocked: bool,
    pub completed: Vec<LevelId>,
    pub elapsed: String,
    pub meter: u8,
}

/// Completion callback handed to one level activation.
///
/// Clones share a single "fired" flag: the first `complete()` records the
/// level, every later call (from any clone) does nothing. Calls made after the
/// level was torn down are ignored as well.
#[derive(Clone)]
pub struct Completion {
    orchestrator: Weak<Inner>,
    level: LevelId,
    generation: u64,
    fired: Rc<Cell<bool>>,
}

impl Completion {
    pub fn complete(&self) {
        if self.fired.replace(true) {
            debug!("level {} completion repeated; ignored", self.level);
            return;
        }
        if let Some(inner) = self.orchestrator.upgrade() {
            Orchestrator { inner }.record_completion(self.level, self.generation);
        }
    }

    pub fn level(&self) -> LevelId {
        self.level
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("level", &self.level)
            .field("generation", &self.generation)
            .field("fired", &self.fired.get())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(config: GauntletConfig, registry: Registry, platform: Platform) -> Result<Self> {
        config.validate()?;
        for id in registry.ids().filter(|id| *id > config.total_levels) {
            warn!("level {id} is registered but beyond total_levels {}", config.total_levels);
        }
        let engagement = EngagementTracker::new(
            config.engagement.clone(),
            platform.scheduler.clone(),
            platform.hud.clone(),
            platform.dice.clone(),
        );
        let verifier = Verifier::new(
            config.verification.clone(),
            platform.scheduler.clone(),
            platform.dice.clone(),
        );
        let state = OrchestratorState {
            current_level: 1,
            total_levels: config.total_levels,
            completed: BTreeSet::new(),
            active_cleanup: None,
            engagement: None,
            phase: Phase::Idle,
            next_unlocked: false,
            generation: 0,
        };
        Ok(Self {
            inner: Rc::new(Inner {
                config,
                registry,
                platform,
                engagement,
                verifier,
                state: RefCell::new(state),
                completion_hook: RefCell::new(None),
            }),
        })
    }

    /// Called after a level is recorded complete, outside any internal
    /// borrow. The hook may navigate, and may run again for a level it
    /// navigated to.
    pub fn set_completion_hook(&self, hook: impl Fn(&Orchestrator, LevelId) + 'static) {
        *self.inner.completion_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Tear down the current level and mount `requested` (clamped).
    ///
    /// Returns `GauntletError::Mount` if the challenge failed to mount; the
    /// level is then left in `Placeholder` with the container showing a
    /// fallback message.
    pub fn load_level(&self, requested: i64) -> Result<()> {
        let total = self.inner.config.total_levels;
        let level = clamp_level(requested, total);

        let (generation, previous_session, previous_cleanup) = {
            let mut st = self.inner.state.borrow_mut();
            st.generation += 1;
            st.current_level = level;
            st.phase = Phase::Active;
            st.next_unlocked = false;
            (st.generation, st.engagement.take(), st.active_cleanup.take())
        };
        if let Some(session) = previous_session {
            session.stop();
        }
        if let Some(cleanup) = previous_cleanup {
            cleanup.dispose();
        }
        if self.is_superseded(generation) {
            debug!("load of level {level} superseded during teardown");
            return Ok(());
        }

        info!("loading level {level} (requested {requested})");
        let platform = &self.inner.platform;
        platform.hud.show_level(level);
        platform.hud.set_next_enabled(false);
        platform.container.clear();

        let session = self.inner.engagement.start(&platform.container)?;
        self.inner.state.borrow_mut().engagement = Some(session);

        let Some(descriptor) = self.inner.registry.lookup(level) else {
            platform.container.set_html(&placeholder_markup(level, PLACEHOLDER_BLURB));
            self.inner.state.borrow_mut().phase = Phase::Placeholder;
            debug!("level {level} has no challenge; showing placeholder");
            return Ok(());
        };
        let challenge = descriptor.challenge.clone();

        let ctx = MountContext {
            level,
            container: platform.container.clone(),
            completion: Completion {
                orchestrator: Rc::downgrade(&self.inner),
                level,
                generation,
                fired: Rc::new(Cell::new(false)),
            },
            scheduler: platform.scheduler.clone(),
            dice: platform.dice.clone(),
            engagement: self.inner.engagement.clone(),
            verifier: self.inner.verifier.clone(),
        };

        match challenge.mount(ctx) {
            Ok(cleanup) => {
                let mut st = self.inner.state.borrow_mut();
                if st.generation == generation {
                    st.active_cleanup = Some(cleanup);
                } else {
                    drop(st);
                    debug!("level {level} was left during its own mount; releasing it now");
                    cleanup.dispose();
                }
                Ok(())
            }
            Err(e) => {
                error!("level {level} failed to mount: {e}");
                if !self.is_superseded(generation) {
                    platform.container.clear();
                    platform
                        .container
                        .set_html(&placeholder_markup(level, MOUNT_FAILURE_BLURB));
                    // A completion recorded before the failure stands.
                    let mut st = self.inner.state.borrow_mut();
                    if st.phase == Phase::Active {
                        st.phase = Phase::Placeholder;
                    }
                }
                Err(match e {
                    GauntletError::Mount { .. } => e,
                    other => GauntletError::Mount {
                        level,
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    /// Move to `current + 1` (clamped). Honors `gate_next_on_completion`.
    pub fn next_level(&self) -> Result<()> {
        let (current, unlocked) = {
            let st = self.inner.state.borrow();
            (st.current_level, st.next_unlocked)
        };
        if self.inner.config.gate_next_on_completion && !unlocked {
            warn!("next requested while level {current} is still locked");
            return Err(GauntletError::NavigationLocked(current));
        }
        self.load_level(current as i64 + 1)
    }

    /// Unlock forward navigation without marking the level complete (the
    /// shell's "verify" button path).
    pub fn unlock_next(&self) {
        let unlocked = {
            let mut st = self.inner.state.borrow_mut();
            if st.phase == Phase::Idle {
                false
            } else {
                st.next_unlocked = true;
                true
            }
        };
        if unlocked {
            self.inner.platform.hud.set_next_enabled(true);
        }
    }

    /// Release everything the current level holds and go back to `Idle`.
    pub fn teardown(&self) {
        let (session, cleanup) = {
            let mut st = self.inner.state.borrow_mut();
            st.generation += 1;
            st.phase = Phase::Idle;
            st.next_unlocked = false;
            (st.engagement.take(), st.active_cleanup.take())
        };
        if let Some(session) = session {
            session.stop();
        }
        if let Some(cleanup) = cleanup {
            cleanup.dispose();
        }
        self.inner.platform.container.clear();
        self.inner.platform.hud.set_next_enabled(false);
    }

    pub fn snapshot(&self) -> Snapshot {
        let engagement = self.inner.engagement.state();
        let st = self.inner.state.borrow();
        Snapshot {
            current_level: st.current_level,
            total_levels: st.total_levels,
            phase: st.phase,
            is_current_complete: st.phase == Phase::Completed,
            next_unlocked: st.next_unlocked,
            completed: st.completed.iter().copied().collect(),
            elapsed: engagement.elapsed_display(),
            meter: engagement.meter,
        }
    }

    pub fn current_level(&self) -> LevelId {
        self.inner.state.borrow().current_level
    }

    pub fn total_levels(&self) -> u32 {
        self.inner.state.borrow().total_levels
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().phase
    }

    pub fn is_current_complete(&self) -> bool {
        self.phase() == Phase::Completed
    }

    pub fn is_next_unlocked(&self) -> bool {
        self.inner.state.borrow().next_unlocked
    }

    pub fn completed_levels(&self) -> BTreeSet<LevelId> {
        self.inner.state.borrow().completed.clone()
    }

    pub fn has_active_cleanup(&self) -> bool {
        self.inner.state.borrow().active_cleanup.is_some()
    }

    pub fn engagement(&self) -> &EngagementTracker {
        &self.inner.engagement
    }

    pub fn verifier(&self) -> &Verifier {
        &self.inner.verifier
    }

    pub fn platform(&self) -> &Platform {
        &self.inner.platform
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.inner.state.borrow().generation != generation
    }

    fn record_completion(&self, level: LevelId, generation: u64) {
        let detached = {
            let mut st = self.inner.state.borrow_mut();
            if st.generation != generation {
                debug!("stale completion from level {level}; ignored");
                return;
            }
            st.completed.insert(level);
            st.phase = Phase::Completed;
            st.next_unlocked = true;
            st.engagement.as_mut().and_then(EngagementSession::detach_clicks)
        };
        drop(detached);
        info!("level {level} complete");
        self.inner.platform.hud.set_next_enabled(true);

        let hook = self.inner.completion_hook.borrow().clone();
        if let Some(hook) = hook {
            hook(self, level);
        }
    }
}

fn placeholder_markup(level: LevelId, blurb: &str) -> String {
    format!(
        r#"<h3 class="challenge-title">Level {level}</h3>
<p class="challenge-desc">{blurb}</p>"#
    )
}
