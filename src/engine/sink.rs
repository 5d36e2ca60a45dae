//! Change Sink
//!
//! The engine reports every state change through a `ChangeSink`:
//! - value changes of fields
//! - visibility changes of fields and groups
//! - validity changes of fields
//!
//! Notifications are delivered synchronously, in the order the engine makes
//! the changes. A sink must not expect calls back into the engine to take
//! effect while a notification is being delivered; such calls are dropped.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// Receiver of engine state changes
pub trait ChangeSink {
    /// A field now holds `value`
    fn on_value_changed(&mut self, id: &str, value: &str);

    /// A field or group became visible or hidden
    fn on_visibility_changed(&mut self, id: &str, visible: bool);

    /// A field became okay or not okay
    fn on_validity_changed(&mut self, id: &str, okay: bool);
}

/// Shared sinks, so a host can keep a handle to inspect the sink it handed
/// to the engine.
impl<S: ChangeSink + ?Sized> ChangeSink for Rc<RefCell<S>> {
    fn on_value_changed(&mut self, id: &str, value: &str) {
        self.borrow_mut().on_value_changed(id, value);
    }

    fn on_visibility_changed(&mut self, id: &str, visible: bool) {
        self.borrow_mut().on_visibility_changed(id, visible);
    }

    fn on_validity_changed(&mut self, id: &str, okay: bool) {
        self.borrow_mut().on_validity_changed(id, okay);
    }
}

/// One notification, as recorded or streamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Value { id: String, value: String },
    Visibility { id: String, visible: bool },
    Validity { id: String, okay: bool },
}

impl ChangeEvent {
    /// Id of the field or group the event is about
    pub fn id(&self) -> &str {
        match self {
            ChangeEvent::Value { id, .. }
            | ChangeEvent::Visibility { id, .. }
            | ChangeEvent::Validity { id, .. } => id,
        }
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn on_value_changed(&mut self, _id: &str, _value: &str) {}
    fn on_visibility_changed(&mut self, _id: &str, _visible: bool) {}
    fn on_validity_changed(&mut self, _id: &str, _okay: bool) {}
}

/// Sink that records every notification in order
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Vec<ChangeEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recording sink behind a shared handle
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// All recorded events, oldest first
    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    /// Remove and return all recorded events
    pub fn take(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Recorded events about one field or group
    pub fn events_for(&self, id: &str) -> Vec<&ChangeEvent> {
        self.events.iter().filter(|e| e.id() == id).collect()
    }

    /// Values announced for one field, oldest first
    pub fn values_for(&self, id: &str) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChangeEvent::Value { id: eid, value } if eid == id => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ChangeSink for RecordingSink {
    fn on_value_changed(&mut self, id: &str, value: &str) {
        self.events.push(ChangeEvent::Value {
            id: id.to_string(),
            value: value.to_string(),
        });
    }

    fn on_visibility_changed(&mut self, id: &str, visible: bool) {
        self.events.push(ChangeEvent::Visibility {
            id: id.to_string(),
            visible,
        });
    }

    fn on_validity_changed(&mut self, id: &str, okay: bool) {
        self.events.push(ChangeEvent::Validity {
            id: id.to_string(),
            okay,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.on_value_changed("Name", "Meier");
        sink.on_validity_changed("Name", true);
        sink.on_visibility_changed("Zusatz", false);

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.values_for("Name"), ["Meier"]);
        assert_eq!(sink.events_for("Zusatz").len(), 1);

        let taken = sink.take();
        assert_eq!(taken.len(), 3);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_shared_sink_forwards() {
        let shared = RecordingSink::shared();
        let mut handle = shared.clone();
        handle.on_value_changed("Ort", "München");
        assert_eq!(shared.borrow().values_for("Ort"), ["München"]);
    }

    #[test]
    fn test_event_serialization() {
        let event = ChangeEvent::Visibility {
            id: "Zusatz".into(),
            visible: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"kind": "visibility", "id": "Zusatz", "visible": true})
        );
    }
}
