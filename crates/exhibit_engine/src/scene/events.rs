//! Engine events and host callbacks
//!
//! Events are collected during a tick and delivered once the tick's state
//! updates are done, so a callback never observes a half-updated scene.
//! Hosts either register callbacks on [`EngineCallbacks`] or poll
//! `SceneManager::drain_events`.

use crate::foundation::collections::NodeId;
use crate::interaction::InteractionEvent;
use crate::navigation::NavigationEvent;
use crate::scene::node::NodeTag;

/// Everything the engine reports to its host
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Pointer, popup and shortcut events
    Interaction(InteractionEvent),
    /// Navigation mode and position events
    Navigation(NavigationEvent),
    /// A hall switch began
    TransitionStarted {
        /// Outgoing hall
        from: Option<String>,
        /// Incoming hall
        to: String,
    },
    /// The incoming hall is built and its intro or fade-in has finished
    HallReady(String),
    /// Building the incoming hall failed; the switch was rolled back
    TransitionFailed {
        /// Hall that failed to build
        hall: String,
        /// Error text
        reason: String,
    },
}

impl From<InteractionEvent> for EngineEvent {
    fn from(event: InteractionEvent) -> Self {
        Self::Interaction(event)
    }
}

impl From<NavigationEvent> for EngineEvent {
    fn from(event: NavigationEvent) -> Self {
        Self::Navigation(event)
    }
}

type NodeCallback = Box<dyn FnMut(NodeId, &NodeTag)>;

/// Callbacks settable by the host
#[derive(Default)]
pub struct EngineCallbacks {
    hover: Option<NodeCallback>,
    leave: Option<Box<dyn FnMut(NodeId)>>,
    click: Option<NodeCallback>,
    double_click: Option<NodeCallback>,
    popup_closed: Option<Box<dyn FnMut()>>,
    hall_switch_requested: Option<Box<dyn FnMut(&str)>>,
    listeners: Vec<Box<dyn FnMut(&EngineEvent)>>,
}

impl EngineCallbacks {
    /// Create an empty callback set
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer entered an interactable node
    pub fn on_hover(&mut self, callback: impl FnMut(NodeId, &NodeTag) + 'static) -> &mut Self {
        self.hover = Some(Box::new(callback));
        self
    }

    /// Pointer left an interactable node
    pub fn on_leave(&mut self, callback: impl FnMut(NodeId) + 'static) -> &mut Self {
        self.leave = Some(Box::new(callback));
        self
    }

    /// Interactable node clicked
    pub fn on_click(&mut self, callback: impl FnMut(NodeId, &NodeTag) + 'static) -> &mut Self {
        self.click = Some(Box::new(callback));
        self
    }

    /// Interactable node double-clicked
    pub fn on_double_click(&mut self, callback: impl FnMut(NodeId, &NodeTag) + 'static) -> &mut Self {
        self.double_click = Some(Box::new(callback));
        self
    }

    /// Info popup closed
    pub fn on_popup_closed(&mut self, callback: impl FnMut() + 'static) -> &mut Self {
        self.popup_closed = Some(Box::new(callback));
        self
    }

    /// Entrance marker or number key asked for a hall
    pub fn on_hall_switch_requested(&mut self, callback: impl FnMut(&str) + 'static) -> &mut Self {
        self.hall_switch_requested = Some(Box::new(callback));
        self
    }

    /// Receive every event
    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Deliver one event to the matching callback and every listener
    pub fn dispatch(&mut self, event: &EngineEvent) {
        if let EngineEvent::Interaction(interaction) = event {
            match interaction {
                InteractionEvent::Hover { node, tag } => {
                    if let Some(callback) = self.hover.as_mut() {
                        callback(*node, tag);
                    }
                }
                InteractionEvent::Leave { node } => {
                    if let Some(callback) = self.leave.as_mut() {
                        callback(*node);
                    }
                }
                InteractionEvent::Click { node, tag, .. } => {
                    if let Some(callback) = self.click.as_mut() {
                        callback(*node, tag);
                    }
                }
                InteractionEvent::DoubleClick { node, tag } => {
                    if let Some(callback) = self.double_click.as_mut() {
                        callback(*node, tag);
                    }
                }
                InteractionEvent::PopupClosed => {
                    if let Some(callback) = self.popup_closed.as_mut() {
                        callback();
                    }
                }
                InteractionEvent::HallSwitchRequested(hall) => {
                    if let Some(callback) = self.hall_switch_requested.as_mut() {
                        callback(hall);
                    }
                }
                _ => {}
            }
        }
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EngineCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCallbacks")
            .field("hover", &self.hover.is_some())
            .field("leave", &self.leave.is_some())
            .field("click", &self.click.is_some())
            .field("double_click", &self.double_click.is_some())
            .field("popup_closed", &self.popup_closed.is_some())
            .field("hall_switch_requested", &self.hall_switch_requested.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_reaches_typed_callback_and_listeners() {
        let requested = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::new(RefCell::new(0));

        let mut callbacks = EngineCallbacks::new();
        let sink = Rc::clone(&requested);
        callbacks.on_hall_switch_requested(move |hall| sink.borrow_mut().push(hall.to_string()));
        let counter = Rc::clone(&seen);
        callbacks.subscribe(move |_| *counter.borrow_mut() += 1);

        callbacks.dispatch(&InteractionEvent::HallSwitchRequested("late".into()).into());
        callbacks.dispatch(&EngineEvent::HallReady("late".into()));

        assert_eq!(*requested.borrow(), vec!["late".to_string()]);
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn test_popup_closed_callback() {
        let closed = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&closed);
        let mut callbacks = EngineCallbacks::new();
        callbacks.on_popup_closed(move || *flag.borrow_mut() = true);
        callbacks.dispatch(&EngineEvent::Interaction(InteractionEvent::PopupClosed));
        assert!(*closed.borrow());
    }
}
