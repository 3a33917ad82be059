use crate::error::Error;
use crate::iterator::{Releaser, StorageIterator};

/// An iterator with no entries.
///
/// Lets empty or failed sources take part in a merge without special cases.
/// It may carry an error, e.g. from a table that could not be opened.
#[derive(Default)]
pub struct EmptyIterator {
    err: Option<Error>,
    releaser: Releaser<'static>,
}

impl EmptyIterator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(err: Error) -> Self {
        EmptyIterator {
            err: Some(err),
            releaser: Releaser::new(),
        }
    }

    fn position(&mut self) -> bool {
        if self.releaser.is_released() {
            self.err = Some(Error::IteratorReleased);
        }
        false
    }
}

impl StorageIterator for EmptyIterator {
    fn first(&mut self) -> bool {
        self.position()
    }

    fn last(&mut self) -> bool {
        self.position()
    }

    fn seek(&mut self, _key: &[u8]) -> bool {
        self.position()
    }

    fn next(&mut self) -> bool {
        self.position()
    }

    fn prev(&mut self) -> bool {
        self.position()
    }

    fn is_valid(&self) -> bool {
        false
    }

    fn key(&self) -> &[u8] {
        &[]
    }

    fn value(&self) -> &[u8] {
        &[]
    }

    fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    fn release(&mut self) {
        self.releaser.release();
    }

    fn is_released(&self) -> bool {
        self.releaser.is_released()
    }
}
