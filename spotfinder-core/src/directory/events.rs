//! Change notifications published by [`SpotDirectory`](super::SpotDirectory).

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use log::trace;

use crate::{SpotId, Taxonomy, ViewMode};

/// A single write to directory state.
///
/// One event is published per write, even when the written value equals the
/// previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// The loading flag was written.
    LoadingChanged(bool),
    /// The stored error message was written.
    ErrorChanged(Option<String>),
    /// The canonical dataset was replaced.
    DatasetReplaced {
        /// Number of spots now held.
        count: usize,
    },
    /// One taxonomy list was replaced.
    TaxonomyReplaced(Taxonomy),
    /// A filter criterion was edited or all criteria were reset.
    FiltersChanged,
    /// The filtered view was recomputed or replaced.
    FilteredChanged {
        /// Number of spots now visible.
        count: usize,
    },
    /// The view mode was written.
    ViewModeChanged(ViewMode),
    /// The selection was written; carries the selected spot's id.
    SelectionChanged(Option<SpotId>),
}

/// Handle returned by [`SpotDirectory::subscribe`](super::SpotDirectory::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Rc<dyn Fn(&DirectoryEvent)>;

#[derive(Default)]
pub(crate) struct Observers {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(SubscriptionId, Callback)>>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.entries.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Observers {
    pub(crate) fn subscribe(&self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, callback));
        trace!("observer {} subscribed", id.0);
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        trace!("observer {} unsubscribed: {removed}", id.0);
        removed
    }

    /// Deliver `event` to every observer registered when the call starts.
    ///
    /// Callbacks may subscribe or unsubscribe re-entrantly.
    pub(crate) fn notify(&self, event: &DirectoryEvent) {
        let snapshot: Vec<Callback> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }
}
