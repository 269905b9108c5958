//! Level id -> challenge lookup and the contract every challenge satisfies.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::dice::Dice;
use crate::engagement::EngagementTracker;
use crate::error::{GauntletError, Result};
use crate::lifecycle::Disposer;
use crate::orchestrator::Completion;
use crate::platform::{Container, Scheduler};
use crate::verification::Verifier;

/// Levels are numbered from 1.
pub type LevelId = u32;

/// Everything a challenge gets when it is mounted.
///
/// `container` and `completion` are the contract proper. The remaining fields
/// are services a challenge may use: timers, the shared dice, patience bumps
/// and the fake verification gate.
pub struct MountContext {
    pub level: LevelId,
    pub container: Rc<dyn Container>,
    pub completion: Completion,
    pub scheduler: Rc<dyn Scheduler>,
    pub dice: Dice,
    pub engagement: EngagementTracker,
    pub verifier: Verifier,
}

/// A self-contained interactive gag.
///
/// `mount` renders into the (already cleared) container, wires its own
/// listeners and timers, and returns a [`Disposer`] owning all of them. The
/// challenge calls `ctx.completion.complete()` when its win condition is met;
/// extra calls are ignored.
pub trait Challenge {
    fn mount(&self, ctx: MountContext) -> Result<Disposer>;
}

impl<F> Challenge for F
where
    F: Fn(MountContext) -> Result<Disposer>,
{
    fn mount(&self, ctx: MountContext) -> Result<Disposer> {
        self(ctx)
    }
}

/// Immutable once registered.
#[derive(Clone)]
pub struct LevelDescriptor {
    pub id: LevelId,
    pub title: &'static str,
    pub description: &'static str,
    pub challenge: Rc<dyn Challenge>,
}

impl LevelDescriptor {
    pub fn new(
        id: LevelId,
        title: &'static str,
        description: &'static str,
        challenge: impl Challenge + 'static,
    ) -> Self {
        Self {
            id,
            title,
            description,
            challenge: Rc::new(challenge),
        }
    }
}

impl fmt::Debug for LevelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelDescriptor")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Ids without a descriptor are "filler" levels; the orchestrator shows a
/// placeholder for them.
#[derive(Clone, Default, Debug)]
pub struct Registry {
    levels: BTreeMap<LevelId, LevelDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: LevelDescriptor) -> Result<()> {
        if descriptor.id == 0 {
            return Err(GauntletError::InvalidLevelId(descriptor.id));
        }
        if self.levels.contains_key(&descriptor.id) {
            return Err(GauntletError::DuplicateLevel(descriptor.id));
        }
        self.levels.insert(descriptor.id, descriptor);
        Ok(())
    }

    pub fn with(mut self, descriptor: LevelDescriptor) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    pub fn lookup(&self, id: LevelId) -> Option<&LevelDescriptor> {
        self.levels.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = LevelId> + '_ {
        self.levels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inert(_ctx: MountContext) -> Result<Disposer> {
        Ok(Disposer::noop())
    }

    #[test]
    fn lookup_hits_and_misses() {
        let reg = Registry::new()
            .with(LevelDescriptor::new(3, "Three", "third", inert))
            .unwrap();
        assert_eq!(reg.lookup(3).map(|d| d.title), Some("Three"));
        assert!(reg.lookup(4).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut reg = Registry::new();
        reg.register(LevelDescriptor::new(1, "A", "", inert)).unwrap();
        let err = reg
            .register(LevelDescriptor::new(1, "B", "", inert))
            .unwrap_err();
        assert!(matches!(err, GauntletError::DuplicateLevel(1)));
        assert_eq!(reg.lookup(1).map(|d| d.title), Some("A"));
    }

    #[test]
    fn level_zero_is_rejected() {
        let err = Registry::new()
            .with(LevelDescriptor::new(0, "Zero", "", inert))
            .unwrap_err();
        assert!(matches!(err, GauntletError::InvalidLevelId(0)));
    }

    #[test]
    fn ids_are_sorted() {
        let reg = Registry::new()
            .with(LevelDescriptor::new(40, "", "", inert))
            .and_then(|r| r.with(LevelDescriptor::new(1, "", "", inert)))
            .and_then(|r| r.with(LevelDescriptor::new(15, "", "", inert)))
            .unwrap();
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec![1, 15, 40]);
    }
}
