//! Widget projection
//!
//! The engine never touches widgets. A host that renders fields as widgets
//! registers them with a `WidgetSink`, which applies value and visibility
//! notifications to them and remembers which fields are currently invalid.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::sink::ChangeSink;
use crate::functions::is_true;

/// Capabilities the projection needs from a rendered widget
pub trait Widget {
    fn get_string(&self) -> String;

    /// Write a value. Static widgets (labels, separators) may ignore it.
    fn set_string(&mut self, value: &str);

    fn get_boolean(&self) -> bool {
        is_true(&self.get_string())
    }

    /// Whether the widget displays fixed content only
    fn is_static(&self) -> bool {
        false
    }

    fn set_visible(&mut self, visible: bool);
}

/// A plain text widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWidget {
    value: String,
    visible: bool,
    fixed: bool,
}

impl TextWidget {
    /// An editable text widget
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            visible: true,
            fixed: false,
        }
    }

    /// A static label
    pub fn label(text: impl Into<String>) -> Self {
        Self {
            fixed: true,
            ..Self::new(text)
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Widget for TextWidget {
    fn get_string(&self) -> String {
        self.value.clone()
    }

    fn set_string(&mut self, value: &str) {
        if !self.fixed {
            self.value = value.to_string();
        }
    }

    fn is_static(&self) -> bool {
        self.fixed
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Change sink projecting notifications onto widgets
#[derive(Default)]
pub struct WidgetSink {
    widgets: HashMap<String, Box<dyn Widget>>,
    invalid: BTreeSet<String>,
}

impl WidgetSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the widget rendering field `id`. Replaces an earlier one.
    pub fn register(&mut self, id: impl Into<String>, widget: Box<dyn Widget>) {
        self.widgets.insert(id.into(), widget);
    }

    pub fn widget(&self, id: &str) -> Option<&dyn Widget> {
        self.widgets.get(id).map(|w| w.as_ref())
    }

    /// Whether the field was last reported as not okay
    pub fn is_marked_invalid(&self, id: &str) -> bool {
        self.invalid.contains(id)
    }

    /// Fields currently reported as not okay, sorted
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.invalid.iter().map(String::as_str).collect()
    }
}

impl ChangeSink for WidgetSink {
    fn on_value_changed(&mut self, id: &str, value: &str) {
        if let Some(widget) = self.widgets.get_mut(id) {
            if !widget.is_static() {
                widget.set_string(value);
            }
        }
    }

    fn on_visibility_changed(&mut self, id: &str, visible: bool) {
        // Group ids have no widget
        if let Some(widget) = self.widgets.get_mut(id) {
            widget.set_visible(visible);
        }
    }

    fn on_validity_changed(&mut self, id: &str, okay: bool) {
        if okay {
            self.invalid.remove(id);
        } else {
            self.invalid.insert(id.to_string());
        }
    }
}

impl fmt::Debug for WidgetSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.widgets.keys().collect();
        ids.sort();
        f.debug_struct("WidgetSink")
            .field("widgets", &ids)
            .field("invalid", &self.invalid)
            .finish()
    }
}
