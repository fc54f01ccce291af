//! Tracking of value changes
//!
//! Every register keeps exactly two values: the current one and the one before it. Whether a
//! register or field "changed" is always computed from those two, never stored.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::{
    model::{Field, Register, RegisterValue},
    view::RegisterKey,
};

/// Notification sent to observers of a [`crate::RegisterModel`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelEvent {
    /// The set of active registers was rebuilt from scratch
    Rebuilt,
    /// A register, and with it its fields, should be redisplayed
    Updated { key: RegisterKey, changed: bool },
}

impl Register {
    /// Shifts the current value into the previous one and makes `value` current
    pub(crate) fn record(&mut self, value: RegisterValue) {
        self.previous_value = self.current_value;
        self.current_value = value;
    }

    /// Whether the most recent update changed the register value
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.current_value != self.previous_value
    }

    /// Whether the most recent update changed the bits of `field`
    #[must_use]
    pub fn is_field_changed(&self, field: &Field) -> bool {
        field.value(self.current_value) != field.value(self.previous_value)
    }
}

/// Fans out [`ModelEvent`]s to every subscriber
///
/// Subscribers that hung up are forgotten on the next notification.
#[derive(Default)]
pub(crate) struct ChangeTracker {
    subscribers: Vec<Sender<ModelEvent>>,
}

impl ChangeTracker {
    pub(crate) fn subscribe(&mut self) -> Receiver<ModelEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn notify(&mut self, event: ModelEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
