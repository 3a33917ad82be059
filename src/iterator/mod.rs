pub mod array;
pub mod empty;
pub mod merge;

pub use array::ArrayIterator;
pub use empty::EmptyIterator;
pub use merge::MergeIterator;

use crate::error::Error;

/// The central iteration abstraction.
///
/// Every sorted source (memtable, on-disk table, merged view, in-memory
/// array) implements this trait, so `MergeIterator` can take
/// `Vec<Box<dyn StorageIterator>>` and fan them in.
///
/// Positioning methods return whether the iterator ended up on an entry.
/// Failures are latched and stay inspectable through [`error`](Self::error).
///
/// ```text
/// Unpositioned ──first/seek/next──► Forward ──next past end──► AtEnd
///      │                              ▲  │
///      └──────last/prev──► Backward ◄─┘  └─► ...
///                             └──prev past start──► AtStart
///
/// any state ──release──► Released
/// ```
///
/// `next()` from `Unpositioned` or `AtStart` behaves like `first()`, and
/// `prev()` from `Unpositioned` or `AtEnd` behaves like `last()`. Stepping
/// further past an end is a no-op that returns `false`.
pub trait StorageIterator: Send {
    /// Moves to the first entry.
    fn first(&mut self) -> bool;

    /// Moves to the last entry.
    fn last(&mut self) -> bool;

    /// Moves to the first entry with key >= `key`.
    fn seek(&mut self, key: &[u8]) -> bool;

    /// Moves to the next entry.
    fn next(&mut self) -> bool;

    /// Moves to the previous entry.
    fn prev(&mut self) -> bool;

    /// Returns true if the iterator is positioned at an entry.
    fn is_valid(&self) -> bool;

    /// Current key, or an empty slice when not valid.
    fn key(&self) -> &[u8];

    /// Current value, or an empty slice when not valid.
    fn value(&self) -> &[u8];

    /// The latched error, if any.
    fn error(&self) -> Option<&Error>;

    /// Releases the iterator's resources. Idempotent.
    fn release(&mut self);

    fn is_released(&self) -> bool;
}

impl<I: StorageIterator + ?Sized> StorageIterator for Box<I> {
    fn first(&mut self) -> bool {
        (**self).first()
    }

    fn last(&mut self) -> bool {
        (**self).last()
    }

    fn seek(&mut self, key: &[u8]) -> bool {
        (**self).seek(key)
    }

    fn next(&mut self) -> bool {
        (**self).next()
    }

    fn prev(&mut self) -> bool {
        (**self).prev()
    }

    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn key(&self) -> &[u8] {
        (**self).key()
    }

    fn value(&self) -> &[u8] {
        (**self).value()
    }

    fn error(&self) -> Option<&Error> {
        (**self).error()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn is_released(&self) -> bool {
        (**self).is_released()
    }
}

/// Where an iterator currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    Unpositioned,
    Forward,
    Backward,
    /// Stepped past the last entry.
    AtEnd,
    /// Stepped before the first entry.
    AtStart,
    Released,
}

impl IterState {
    pub fn is_positioned(self) -> bool {
        matches!(self, IterState::Forward | IterState::Backward)
    }
}

/// Idempotent release flag with an optional hook that runs exactly once,
/// on the first release.
///
/// Iterators use the hook to drop whatever keeps their sources alive, for
/// example a reference to the `Version` their tables came from.
#[derive(Default)]
pub struct Releaser<'a> {
    released: bool,
    hook: Option<Box<dyn FnOnce() + Send + 'a>>,
}

impl<'a> Releaser<'a> {
    pub fn new() -> Self {
        Releaser {
            released: false,
            hook: None,
        }
    }

    /// Installs `hook`, replacing any previous one. If already released
    /// the hook runs immediately.
    pub fn set_hook(&mut self, hook: impl FnOnce() + Send + 'a) {
        if self.released {
            hook();
        } else {
            self.hook = Some(Box::new(hook));
        }
    }

    /// Marks released. Returns true only for the call that did the release.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        if let Some(hook) = self.hook.take() {
            hook();
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
