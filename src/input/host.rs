//! # Host Capabilities
//!
//! Traits for what the poller consumes from its environment, so it can run
//! against real devices or be driven entirely from tests:
//!
//! - [`GamepadHost`]: enumeration of game controllers as a fixed, possibly
//!   sparse list of slots
//! - [`HostEventSource`]: subscription to key and device notifications
//! - [`FrameScheduler`]: "run again next display frame"
//!
//! [`HostEvents`] is the channel-backed [`HostEventSource`] used by the binary.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::binding::{KeyEdge, KeyEvent};
use super::sample::GamepadSample;
use crate::error::Result;

/// Source of gamepad samples.
#[cfg_attr(test, mockall::automock)]
pub trait GamepadHost: Send {
    /// Checks that the host can enumerate controllers at all.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentUnsupported` if enumeration is unavailable.
    fn check_support(&self) -> Result<()>;

    /// Samples every slot. Disconnected slots are `None`.
    fn gamepads(&mut self) -> Vec<Option<GamepadSample>>;
}

/// Identity of a controller in connect/disconnect notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Enumeration slot.
    pub slot: usize,
    /// Identifying string.
    pub id: String,
    /// Backend-specific location (e.g. `/dev/input/event5`).
    pub path: String,
}

/// Categories of host events a component can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEventKind {
    KeyDown,
    KeyUp,
    GamepadConnected,
    GamepadDisconnected,
}

impl HostEventKind {
    /// Every kind, in subscription order.
    pub const ALL: [HostEventKind; 4] = [
        HostEventKind::KeyDown,
        HostEventKind::KeyUp,
        HostEventKind::GamepadConnected,
        HostEventKind::GamepadDisconnected,
    ];
}

/// Notification delivered by the host outside of frame sampling.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Key(KeyEvent),
    GamepadConnected(DeviceInfo),
    GamepadDisconnected(DeviceInfo),
}

impl HostEvent {
    /// Subscription kind this event belongs to.
    #[must_use]
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::Key(event) => match event.edge {
                KeyEdge::Down => HostEventKind::KeyDown,
                KeyEdge::Up => HostEventKind::KeyUp,
            },
            HostEvent::GamepadConnected(_) => HostEventKind::GamepadConnected,
            HostEvent::GamepadDisconnected(_) => HostEventKind::GamepadDisconnected,
        }
    }
}

/// Subscription interface for host events.
#[cfg_attr(test, mockall::automock)]
pub trait HostEventSource: Send {
    /// Starts delivery of events of `kind`.
    fn subscribe(&mut self, kind: HostEventKind);

    /// Stops delivery of events of `kind`.
    fn unsubscribe(&mut self, kind: HostEventKind);
}

/// Display-frame scheduling.
#[cfg_attr(test, mockall::automock)]
pub trait FrameScheduler: Send {
    /// Requests one call of the frame callback on the next display frame.
    fn request_frame(&mut self);
}

/// Channel-backed event source with subscription filtering.
///
/// Clones share the subscription set and the channel, so backends can emit
/// from their own tasks while the poller controls what gets through.
///
/// # Examples
///
/// ```
/// use teleop_input::input::binding::KeyEvent;
/// use teleop_input::input::host::{HostEvent, HostEventKind, HostEventSource, HostEvents};
///
/// let (mut events, mut rx) = HostEvents::channel();
///
/// // Not subscribed yet: dropped
/// assert!(!events.emit(HostEvent::Key(KeyEvent::down("Space"))));
///
/// events.subscribe(HostEventKind::KeyDown);
/// assert!(events.emit(HostEvent::Key(KeyEvent::down("Space"))));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HostEvents {
    sender: mpsc::UnboundedSender<HostEvent>,
    subscribed: Arc<Mutex<HashSet<HostEventKind>>>,
}

impl HostEvents {
    /// Creates an emitter and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let events = Self {
            sender,
            subscribed: Arc::new(Mutex::new(HashSet::new())),
        };
        (events, receiver)
    }

    /// Returns true if events of `kind` are currently delivered.
    #[must_use]
    pub fn is_subscribed(&self, kind: HostEventKind) -> bool {
        match self.subscribed.lock() {
            Ok(set) => set.contains(&kind),
            Err(_) => {
                warn!("Host event subscriptions poisoned, treating {:?} as unsubscribed", kind);
                false
            }
        }
    }

    /// Sends `event` if its kind is subscribed. Returns true if it was sent.
    pub fn emit(&self, event: HostEvent) -> bool {
        if !self.is_subscribed(event.kind()) {
            debug!("Dropping unsubscribed host event: {:?}", event);
            return false;
        }

        match self.sender.send(event) {
            Ok(()) => true,
            Err(e) => {
                debug!("Host event receiver closed: {}", e);
                false
            }
        }
    }
}

impl HostEventSource for HostEvents {
    fn subscribe(&mut self, kind: HostEventKind) {
        match self.subscribed.lock() {
            Ok(mut set) => {
                set.insert(kind);
            }
            Err(_) => warn!("Host event subscriptions poisoned, cannot subscribe to {:?}", kind),
        }
    }

    fn unsubscribe(&mut self, kind: HostEventKind) {
        match self.subscribed.lock() {
            Ok(mut set) => {
                set.remove(&kind);
            }
            Err(_) => warn!("Host event subscriptions poisoned, cannot unsubscribe from {:?}", kind),
        }
    }
}
