//! Scoped release of per-level resources.
//!
//! Every challenge mount hands back a [`Disposer`]; timers and listeners hand
//! back one too. Whatever a disposer owns is released exactly once, either by
//! an explicit [`Disposer::dispose`] or when the disposer is dropped. Release
//! actions run in reverse registration order, so resources created later are
//! torn down first.

use std::fmt;

type Release = Box<dyn FnOnce()>;

#[must_use = "dropping a Disposer releases its resources immediately"]
#[derive(Default)]
pub struct Disposer {
    actions: Vec<Release>,
}

impl Disposer {
    /// A disposer with nothing to release.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn from_fn(release: impl FnOnce() + 'static) -> Self {
        let mut d = Self::noop();
        d.push(release);
        d
    }

    pub fn push(&mut self, release: impl FnOnce() + 'static) {
        self.actions.push(Box::new(release));
    }

    /// Keep `value` alive until release; its own `Drop` does the cleanup.
    pub fn hold<T: 'static>(&mut self, value: T) {
        self.push(move || drop(value));
    }

    /// Take over another disposer's pending releases.
    pub fn adopt(&mut self, other: Disposer) {
        self.hold(other);
    }

    pub fn with(mut self, other: Disposer) -> Self {
        self.adopt(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn dispose(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        while let Some(release) = self.actions.pop() {
            release();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("pending", &self.actions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce()>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let make = move |name: &'static str| {
            let l = l.clone();
            Box::new(move || l.borrow_mut().push(name)) as Box<dyn FnOnce()>
        };
        (log, make)
    }

    #[test]
    fn releases_in_reverse_order_once() {
        let (log, make) = recorder();
        let mut d = Disposer::noop();
        d.push(make("timer"));
        d.push(make("listener"));
        d.dispose();
        assert_eq!(*log.borrow(), vec!["listener", "timer"]);
    }

    #[test]
    fn drop_releases_when_never_disposed() {
        let (log, make) = recorder();
        {
            let _d = Disposer::from_fn(make("style"));
        }
        assert_eq!(*log.borrow(), vec!["style"]);
    }

    #[test]
    fn adopted_disposer_runs_with_parent() {
        let (log, make) = recorder();
        let child = Disposer::from_fn(make("child"));
        let parent = Disposer::from_fn(make("parent")).with(child);
        assert!(!parent.is_empty());
        drop(parent);
        assert_eq!(*log.borrow(), vec!["child", "parent"]);
    }

    #[test]
    fn early_error_path_still_releases_partial_work() {
        let (log, make) = recorder();
        let build = |fail: bool| -> Result<Disposer, &'static str> {
            let mut d = Disposer::noop();
            d.push(make("half-built"));
            if fail {
                return Err("mount blew up");
            }
            Ok(d)
        };
        assert!(build(true).is_err());
        assert_eq!(*log.borrow(), vec!["half-built"]);
    }
}
