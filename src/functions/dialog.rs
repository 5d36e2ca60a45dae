//! # Function Dialogs
//!
//! A function dialog is an interactive picker (an address lookup, say) whose
//! last selection feeds autofill functions. The engine never opens a dialog.
//! The host opens it through the library and, once the user selects, reports
//! the completion to the engine as a fresh top-level event.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Callback fired when a dialog selection completes
pub type OnSelect = Box<dyn FnOnce()>;

/// Source of function dialogs
pub trait DialogLibrary {
    /// Whether a dialog with this name exists
    fn contains(&self, dialog: &str) -> bool;

    /// Open the dialog. `on_select` fires once the user selects a result.
    /// Returns false if no such dialog exists.
    fn show(&self, dialog: &str, on_select: OnSelect) -> bool;

    /// A value from the dialog's last selection
    fn value(&self, dialog: &str, data: &str) -> Option<String>;
}

#[derive(Default)]
struct DialogState {
    selection: Option<HashMap<String, String>>,
    pending: Vec<OnSelect>,
}

/// In-memory dialog library.
///
/// `show` only records the callback; `select` plays the user's part by
/// storing a result and firing every pending callback.
#[derive(Default)]
pub struct MapDialogLibrary {
    dialogs: RefCell<HashMap<String, DialogState>>,
}

impl MapDialogLibrary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dialogs = names
            .into_iter()
            .map(|n| (n.into(), DialogState::default()))
            .collect();
        Self {
            dialogs: RefCell::new(dialogs),
        }
    }

    /// Store a selection and fire the pending callbacks.
    ///
    /// Returns the number of callbacks fired, or `None` for an unknown dialog.
    pub fn select<I, K, V>(&self, dialog: &str, values: I) -> Option<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let callbacks = {
            let mut dialogs = self.dialogs.borrow_mut();
            let state = dialogs.get_mut(dialog)?;
            state.selection = Some(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            );
            std::mem::take(&mut state.pending)
        };

        // Callbacks read the selection back, so the borrow must be released first.
        let fired = callbacks.len();
        for callback in callbacks {
            callback();
        }
        Some(fired)
    }

    /// Number of callbacks waiting on a dialog
    pub fn pending(&self, dialog: &str) -> usize {
        self.dialogs
            .borrow()
            .get(dialog)
            .map_or(0, |s| s.pending.len())
    }
}

impl DialogLibrary for MapDialogLibrary {
    fn contains(&self, dialog: &str) -> bool {
        self.dialogs.borrow().contains_key(dialog)
    }

    fn show(&self, dialog: &str, on_select: OnSelect) -> bool {
        match self.dialogs.borrow_mut().get_mut(dialog) {
            Some(state) => {
                state.pending.push(on_select);
                true
            }
            None => false,
        }
    }

    fn value(&self, dialog: &str, data: &str) -> Option<String> {
        self.dialogs
            .borrow()
            .get(dialog)?
            .selection
            .as_ref()?
            .get(data)
            .cloned()
    }
}

impl fmt::Debug for MapDialogLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dialogs = self.dialogs.borrow();
        let mut names: Vec<&String> = dialogs.keys().collect();
        names.sort();
        f.debug_struct("MapDialogLibrary")
            .field("dialogs", &names)
            .finish()
    }
}
