//! # Input Poller
//!
//! Per-frame polling of game controllers and synchronous dispatch of
//! keyboard events to registered [`Action`]s.
//!
//! ## Lifecycle
//!
//! ```text
//!            start()               stop()
//! Stopped ───────────► Running ───────────► Stopped
//!
//! Unsupported   (host cannot enumerate controllers; terminal)
//! ```
//!
//! `start` requests the first frame; every frame requests the next one only
//! while the poller is still running, so `stop` ends the loop within one
//! frame.
//!
//! ## Frame Processing
//!
//! For each connected slot that is not a placeholder (no axes and no
//! buttons, or an ignored id), every binding of every action is evaluated
//! against the current sample and the sample recorded on the previous
//! frame. The current sample then replaces the recorded one.
//!
//! ## Usage
//!
//! ```no_run
//! use teleop_input::input::action::Action;
//! use teleop_input::input::binding::Binding;
//! use teleop_input::input::frame_clock::{frame_interval, FrameClock};
//! use teleop_input::input::host::HostEvents;
//! use teleop_input::input::poller::{InputPoller, PollerSettings};
//! use teleop_input::devices::evdev_host::EvdevGamepads;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (events, mut rx) = HostEvents::channel();
//! let clock = FrameClock::new();
//! let actions = vec![Action::new("estop", vec![Binding::key_down("Space")], |_| {})?];
//!
//! let mut poller = InputPoller::new(
//!     actions,
//!     PollerSettings::default(),
//!     Box::new(EvdevGamepads::new("/dev/input", events.clone())),
//!     Box::new(events),
//!     Box::new(clock.clone()),
//! );
//! poller.start();
//!
//! let mut ticker = frame_interval(60);
//! loop {
//!     tokio::select! {
//!         _ = ticker.tick() => if clock.take_request() { poller.on_frame(); },
//!         Some(event) = rx.recv() => poller.handle_host_event(event),
//!     }
//! }
//! # }
//! ```

use tracing::{debug, info, trace, warn};

use super::action::Action;
use super::binding::{FrameContext, KeyEvent};
use super::context::Context;
use super::history::DeviceHistory;
use super::host::{FrameScheduler, GamepadHost, HostEvent, HostEventKind, HostEventSource};
use super::sample::{GamepadSample, DEFAULT_BUTTON_THRESHOLD};

/// Default substrings identifying a SpaceMouse.
pub const DEFAULT_SPACEMOUSE_MARKERS: &[&str] = &["SpaceMouse", "SpaceNavigator"];

/// Default substrings identifying placeholder devices.
pub const DEFAULT_IGNORED_MARKERS: &[&str] = &["Unknown"];

/// Device classification and press threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerSettings {
    /// Analog value above which a button counts as pressed.
    pub button_threshold: f32,
    /// A device whose id contains any of these is a SpaceMouse.
    pub spacemouse_markers: Vec<String>,
    /// A device whose id contains any of these is never evaluated.
    pub ignored_markers: Vec<String>,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            button_threshold: DEFAULT_BUTTON_THRESHOLD,
            spacemouse_markers: DEFAULT_SPACEMOUSE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            ignored_markers: DEFAULT_IGNORED_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl PollerSettings {
    /// Returns true if `id` names a SpaceMouse.
    #[must_use]
    pub fn is_spacemouse(&self, id: &str) -> bool {
        self.spacemouse_markers
            .iter()
            .any(|marker| id.contains(marker.as_str()))
    }

    /// Returns true if `id` names a placeholder device.
    #[must_use]
    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored_markers
            .iter()
            .any(|marker| id.contains(marker.as_str()))
    }

    /// Returns true if `sample` should take part in binding evaluation.
    #[must_use]
    pub fn accepts(&self, sample: &GamepadSample) -> bool {
        !sample.is_empty() && !self.is_ignored(&sample.id)
    }
}

/// Lifecycle state of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Not sampling; `start` begins the frame loop.
    Stopped,
    /// Sampling every frame.
    Running,
    /// The host cannot enumerate controllers; `start` is a no-op forever.
    Unsupported,
}

/// Frame-polled action dispatcher.
pub struct InputPoller {
    actions: Vec<Action>,
    settings: PollerSettings,
    history: DeviceHistory,
    state: PollerState,
    host: Box<dyn GamepadHost>,
    events: Box<dyn HostEventSource>,
    scheduler: Box<dyn FrameScheduler>,
    subscribed: Vec<HostEventKind>,
}

impl std::fmt::Debug for InputPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPoller")
            .field("state", &self.state)
            .field("actions", &self.action_names())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl InputPoller {
    /// Creates a poller in the `Stopped` state.
    ///
    /// Checks host support first. If controllers cannot be enumerated the poller
    /// is permanently `Unsupported`, logs a warning and subscribes to
    /// nothing. Otherwise it subscribes to key-down, key-up,
    /// gamepad-connected and gamepad-disconnected events.
    #[must_use]
    pub fn new(
        actions: Vec<Action>,
        settings: PollerSettings,
        host: Box<dyn GamepadHost>,
        mut events: Box<dyn HostEventSource>,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Self {
        let mut subscribed = Vec::new();

        let state = match host.check_support() {
            Ok(()) => {
                for kind in HostEventKind::ALL {
                    events.subscribe(kind);
                    subscribed.push(kind);
                }
                debug!("Input poller subscribed to {} host event kinds", subscribed.len());
                PollerState::Stopped
            }
            Err(e) => {
                warn!("Input polling disabled: {}", e);
                PollerState::Unsupported
            }
        };

        Self {
            actions,
            settings,
            history: DeviceHistory::new(),
            state,
            host,
            events,
            scheduler,
            subscribed,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Returns true while the frame loop is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == PollerState::Running
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }

    /// Per-slot samples recorded on the last processed frame.
    #[must_use]
    pub fn history(&self) -> &DeviceHistory {
        &self.history
    }

    /// Names of the registered actions, in registration order.
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(Action::name).collect()
    }

    /// Starts the frame loop.
    ///
    /// No-op when already running or unsupported.
    pub fn start(&mut self) {
        match self.state {
            PollerState::Running => {
                debug!("Input poller already running");
            }
            PollerState::Unsupported => {
                debug!("Input poller unsupported on this host, not starting");
            }
            PollerState::Stopped => {
                info!("Starting input poller with {} action(s)", self.actions.len());
                self.state = PollerState::Running;
                self.scheduler.request_frame();
            }
        }
    }

    /// Stops the frame loop. The frame already requested will not reschedule.
    pub fn stop(&mut self) {
        if self.state == PollerState::Running {
            info!("Stopping input poller");
            self.state = PollerState::Stopped;
        }
    }

    /// Replaces every registered action.
    ///
    /// Takes effect on the next frame or key event.
    pub fn set_action_map(&mut self, actions: Vec<Action>) {
        info!("Action map replaced ({} action(s))", actions.len());
        self.actions = actions;
    }

    /// Performs the action named `name` with [`Context::None`].
    ///
    /// Returns false if no such action is registered.
    pub fn trigger(&mut self, name: &str) -> bool {
        match self.actions.iter_mut().find(|action| action.name() == name) {
            Some(action) => {
                debug!("Triggering action '{}' directly", name);
                action.perform(&Context::None);
                true
            }
            None => {
                warn!("Cannot trigger unknown action '{}'", name);
                false
            }
        }
    }

    /// Frame callback: samples every controller, dispatches matching
    /// bindings and requests the next frame while running.
    ///
    /// Returns the number of dispatches performed.
    pub fn on_frame(&mut self) -> usize {
        if self.state != PollerState::Running {
            trace!("Frame skipped, poller is {:?}", self.state);
            return 0;
        }

        let slots = self.host.gamepads();
        let mut dispatched = 0;

        for (slot, entry) in slots.into_iter().enumerate() {
            let Some(sample) = entry else {
                if self.history.forget(slot) {
                    debug!("Slot {} emptied, history cleared", slot);
                }
                continue;
            };

            if !self.settings.accepts(&sample) {
                trace!("Skipping placeholder device '{}' in slot {}", sample.id, slot);
                continue;
            }

            dispatched += self.dispatch_slot(slot, &sample);
            self.history.record(slot, sample);
        }

        if self.state == PollerState::Running {
            self.scheduler.request_frame();
        }

        dispatched
    }

    /// Evaluates every action against one slot's sample.
    fn dispatch_slot(&mut self, slot: usize, sample: &GamepadSample) -> usize {
        let frame = FrameContext {
            slot,
            current: sample,
            previous: self.history.previous_for(slot, &sample.id),
            specialized: self.settings.is_spacemouse(&sample.id),
            button_threshold: self.settings.button_threshold,
        };

        self.actions
            .iter_mut()
            .map(|action| action.dispatch_frame(&frame))
            .sum()
    }

    /// Handles a key event synchronously. Returns the number of dispatches.
    pub fn handle_key(&mut self, event: &KeyEvent) -> usize {
        if self.state == PollerState::Unsupported {
            return 0;
        }

        self.actions
            .iter_mut()
            .map(|action| action.dispatch_key(event))
            .sum()
    }

    /// Handles any host notification.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Key(key) => {
                let dispatched = self.handle_key(&key);
                trace!("Key {:?} dispatched {} time(s)", key, dispatched);
            }
            HostEvent::GamepadConnected(device) => {
                info!(
                    "Gamepad connected in slot {}: {} ({})",
                    device.slot, device.id, device.path
                );
            }
            HostEvent::GamepadDisconnected(device) => {
                info!(
                    "Gamepad disconnected from slot {}: {} ({})",
                    device.slot, device.id, device.path
                );
                // The slot may already hold a newer device
                if !self.history.forget_device(device.slot, &device.id) {
                    debug!("No history of {} in slot {}", device.id, device.slot);
                }
            }
        }
    }
}

impl Drop for InputPoller {
    fn drop(&mut self) {
        for kind in self.subscribed.drain(..) {
            self.events.unsubscribe(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TeleopInputError;
    use crate::input::binding::Binding;
    use crate::input::host::mocks::{CountingScheduler, RecordingEvents, ScriptedGamepads};
    use crate::input::host::{DeviceInfo, MockFrameScheduler, MockGamepadHost};
    use crate::input::sample::ButtonSample;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Seen = Arc<Mutex<Vec<Context>>>;

    fn recording_action(name: &str, bindings: Vec<Binding>) -> (Action, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let action = Action::new(name, bindings, move |ctx: &Context| {
            sink.lock().unwrap().push(ctx.clone());
        })
        .unwrap();
        (action, seen)
    }

    fn pad(id: &str, axes: Vec<f32>, buttons: Vec<ButtonSample>) -> GamepadSample {
        GamepadSample::new(id, axes, buttons, Duration::ZERO)
    }

    struct Harness {
        poller: InputPoller,
        gamepads: ScriptedGamepads,
        events: RecordingEvents,
        scheduler: CountingScheduler,
    }

    fn harness(actions: Vec<Action>) -> Harness {
        let gamepads = ScriptedGamepads::new();
        let events = RecordingEvents::new();
        let scheduler = CountingScheduler::new();
        let poller = InputPoller::new(
            actions,
            PollerSettings::default(),
            Box::new(gamepads.clone()),
            Box::new(events.clone()),
            Box::new(scheduler.clone()),
        );
        Harness {
            poller,
            gamepads,
            events,
            scheduler,
        }
    }

    fn unsupported_host() -> MockGamepadHost {
        let mut host = MockGamepadHost::new();
        host.expect_check_support().returning(|| {
            Err(TeleopInputError::EnvironmentUnsupported(
                "no input directory".to_string(),
            ))
        });
        host.expect_gamepads().never();
        host
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_subscribes_to_all_host_events() {
        let h = harness(vec![]);
        assert_eq!(h.poller.state(), PollerState::Stopped);
        assert_eq!(h.events.subscriptions(), HostEventKind::ALL.to_vec());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let h = harness(vec![]);
        let events = h.events.clone();
        drop(h);
        assert_eq!(events.unsubscriptions(), HostEventKind::ALL.to_vec());
    }

    #[test]
    fn test_unsupported_host_subscribes_nothing() {
        let events = RecordingEvents::new();
        let poller = InputPoller::new(
            vec![],
            PollerSettings::default(),
            Box::new(unsupported_host()),
            Box::new(events.clone()),
            Box::new(CountingScheduler::new()),
        );

        assert_eq!(poller.state(), PollerState::Unsupported);
        assert!(events.subscriptions().is_empty());
        drop(poller);
        assert!(events.unsubscriptions().is_empty());
    }

    // ==================== Lifecycle Tests ====================

    #[test]
    fn test_start_is_idempotent() {
        let mut scheduler = MockFrameScheduler::new();
        scheduler.expect_request_frame().times(1).return_const(());

        let mut poller = InputPoller::new(
            vec![],
            PollerSettings::default(),
            Box::new(ScriptedGamepads::new()),
            Box::new(RecordingEvents::new()),
            Box::new(scheduler),
        );

        poller.start();
        poller.start();
        assert!(poller.is_running());
    }

    #[test]
    fn test_unsupported_start_never_schedules() {
        let mut scheduler = MockFrameScheduler::new();
        scheduler.expect_request_frame().never();

        let mut poller = InputPoller::new(
            vec![],
            PollerSettings::default(),
            Box::new(unsupported_host()),
            Box::new(RecordingEvents::new()),
            Box::new(scheduler),
        );

        poller.start();
        poller.start();
        assert_eq!(poller.on_frame(), 0);
        assert_eq!(poller.state(), PollerState::Unsupported);
    }

    #[test]
    fn test_frame_reschedules_while_running() {
        let mut h = harness(vec![]);
        h.poller.start();
        assert_eq!(h.scheduler.requests(), 1);

        h.poller.on_frame();
        h.poller.on_frame();
        assert_eq!(h.scheduler.requests(), 3);
        assert_eq!(h.gamepads.poll_count(), 2);
    }

    #[test]
    fn test_stop_ends_loop_within_one_frame() {
        let mut h = harness(vec![]);
        h.poller.start();
        h.poller.stop();

        // The frame requested by start still fires, but neither samples nor reschedules
        assert_eq!(h.poller.on_frame(), 0);
        assert_eq!(h.scheduler.requests(), 1);
        assert_eq!(h.gamepads.poll_count(), 0);
        assert_eq!(h.poller.state(), PollerState::Stopped);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut h = harness(vec![]);
        h.poller.start();
        h.poller.stop();
        h.poller.start();

        assert!(h.poller.is_running());
        assert_eq!(h.scheduler.requests(), 2);
    }

    #[test]
    fn test_frame_before_start_is_ignored() {
        let mut h = harness(vec![]);
        assert_eq!(h.poller.on_frame(), 0);
        assert_eq!(h.gamepads.poll_count(), 0);
        assert_eq!(h.scheduler.requests(), 0);
    }

    // ==================== Button Dispatch Tests ====================

    #[test]
    fn test_button_rising_edge_only() {
        let (action, seen) = recording_action("grip", vec![Binding::GamepadButton { index: 0 }]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Pad", vec![], vec![ButtonSample::released()])));
        assert_eq!(h.poller.on_frame(), 0);

        h.gamepads.set_slot(0, Some(pad("Pad", vec![], vec![ButtonSample::pressed()])));
        assert_eq!(h.poller.on_frame(), 1);

        h.gamepads.set_slot(0, Some(pad("Pad", vec![], vec![ButtonSample::pressed()])));
        assert_eq!(h.poller.on_frame(), 0);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Context::GamepadButton {
                slot: 0,
                id: "Pad".to_string(),
                index: 0,
            }]
        );
    }

    #[test]
    fn test_release_and_press_again_dispatches_again() {
        let (action, seen) = recording_action("grip", vec![Binding::GamepadButton { index: 0 }]);
        let mut h = harness(vec![action]);
        h.poller.start();

        for pressed in [true, false, true] {
            let button = if pressed {
                ButtonSample::pressed()
            } else {
                ButtonSample::released()
            };
            h.gamepads.set_slot(0, Some(pad("Pad", vec![], vec![button])));
            h.poller.on_frame();
        }

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    // ==================== Axis Dispatch Tests ====================

    #[test]
    fn test_axis_change_dispatch() {
        let (action, seen) = recording_action("steer", vec![Binding::GamepadAxis { index: 0 }]);
        let mut h = harness(vec![action]);
        h.poller.start();

        let mut dispatches = Vec::new();
        for value in [0.2, 0.2, 0.5] {
            h.gamepads.set_slot(0, Some(pad("Pad", vec![value], vec![])));
            dispatches.push(h.poller.on_frame());
        }

        // Frame 1 only seeds history
        assert_eq!(dispatches, vec![0, 0, 1]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        match seen.last() {
            Some(Context::GamepadAxis { index, value, .. }) => {
                assert_eq!(*index, 0);
                assert_eq!(*value, 0.5);
            }
            other => panic!("Expected GamepadAxis context, got: {:?}", other),
        };
    }

    #[test]
    fn test_axis_nonzero_on_first_sight_is_not_a_change() {
        let (action, seen) = recording_action("steer", vec![Binding::GamepadAxis { index: 0 }]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Pad", vec![0.9], vec![])));
        assert_eq!(h.poller.on_frame(), 0);

        let mut dispatches = Vec::new();
        for value in [0.9, 0.9, 0.5] {
            h.gamepads.set_slot(0, Some(pad("Pad", vec![value], vec![])));
            dispatches.push(h.poller.on_frame());
        }

        assert_eq!(dispatches, vec![0, 0, 1]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    // ==================== Device Filtering Tests ====================

    #[test]
    fn test_empty_device_never_evaluated() {
        let (action, seen) = recording_action(
            "everything",
            vec![
                Binding::Gamepad,
                Binding::Spacemouse,
                Binding::GamepadButton { index: 0 },
                Binding::GamepadAxis { index: 0 },
            ],
        );
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Phantom", vec![], vec![])));
        h.gamepads.set_slot(1, Some(pad("SpaceMouse Phantom", vec![], vec![])));
        for _ in 0..3 {
            assert_eq!(h.poller.on_frame(), 0);
        }

        assert!(seen.lock().unwrap().is_empty());
        assert!(h.poller.history().is_empty());
    }

    #[test]
    fn test_ignored_device_skipped() {
        let (action, seen) = recording_action("any", vec![Binding::Gamepad]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Unknown Gamepad", vec![0.0], vec![])));
        assert_eq!(h.poller.on_frame(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sparse_slots() {
        let (action, seen) = recording_action("any", vec![Binding::Gamepad]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slots(vec![None, None, Some(pad("Pad", vec![0.0], vec![]))]);
        assert_eq!(h.poller.on_frame(), 1);
        assert_eq!(seen.lock().unwrap()[0].slot(), Some(2));
    }

    // ==================== Specialized Device Tests ====================

    #[test]
    fn test_spacemouse_exclusivity() {
        let (gamepad_action, gamepad_seen) = recording_action("drive", vec![Binding::Gamepad]);
        let (mouse_action, mouse_seen) = recording_action("arm", vec![Binding::Spacemouse]);
        let mut h = harness(vec![gamepad_action, mouse_action]);
        h.poller.start();

        h.gamepads.set_slots(vec![
            Some(pad("Xbox Wireless Controller", vec![0.0, 0.0], vec![])),
            Some(pad("3Dconnexion SpaceMouse Compact", vec![0.0; 6], vec![])),
        ]);

        for _ in 0..3 {
            h.poller.on_frame();
        }

        let gamepad_seen = gamepad_seen.lock().unwrap();
        let mouse_seen = mouse_seen.lock().unwrap();
        assert_eq!(gamepad_seen.len(), 3);
        assert_eq!(mouse_seen.len(), 3);
        assert!(gamepad_seen.iter().all(|ctx| ctx.slot() == Some(0)));
        assert!(mouse_seen.iter().all(|ctx| ctx.slot() == Some(1)));
    }

    #[test]
    fn test_spacemouse_context_is_a_snapshot() {
        let (action, seen) = recording_action("arm", vec![Binding::Spacemouse]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(
            0,
            Some(pad(
                "SpaceMouse Wireless",
                vec![0.1, 0.2, 0.3],
                vec![ButtonSample::pressed()],
            )),
        );
        h.poller.on_frame();

        // Mutate the live device after dispatch
        {
            let mut slots = h.gamepads.slots.lock().unwrap();
            let live = slots[0].as_mut().unwrap();
            live.axes[0] = 0.9;
            live.buttons[0] = ButtonSample::released();
        }

        assert_eq!(
            seen.lock().unwrap()[0],
            Context::Spacemouse {
                slot: 0,
                id: "SpaceMouse Wireless".to_string(),
                axes: vec![0.1, 0.2, 0.3],
                buttons: vec![ButtonSample::pressed()],
            }
        );
    }

    // ==================== History Tests ====================

    #[test]
    fn test_history_tracks_last_frame() {
        let mut h = harness(vec![]);
        h.poller.start();

        h.gamepads.set_slot(
            0,
            Some(GamepadSample::new("Pad", vec![0.1], vec![], Duration::from_millis(16))),
        );
        h.poller.on_frame();
        h.gamepads.set_slot(
            0,
            Some(GamepadSample::new("Pad", vec![0.4], vec![], Duration::from_millis(33))),
        );
        h.poller.on_frame();

        assert_eq!(h.poller.history().timestamp(0), Some(Duration::from_millis(33)));
        assert_eq!(h.poller.history().previous(0).unwrap().axes, vec![0.4]);
    }

    #[test]
    fn test_disconnect_clears_history() {
        let (action, seen) = recording_action("grip", vec![Binding::GamepadButton { index: 0 }]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Pad", vec![], vec![ButtonSample::pressed()])));
        h.poller.on_frame();

        h.poller.handle_host_event(HostEvent::GamepadDisconnected(DeviceInfo {
            slot: 0,
            id: "Pad".to_string(),
            path: "/dev/input/event3".to_string(),
        }));
        assert!(h.poller.history().previous(0).is_none());

        // Held through reconnect counts as a fresh press
        h.poller.on_frame();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_reused_slot_starts_fresh() {
        let (action, seen) = recording_action("grip", vec![Binding::GamepadButton { index: 0 }]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Pad A", vec![], vec![ButtonSample::pressed()])));
        assert_eq!(h.poller.on_frame(), 1);

        // Pad B takes over slot 0 before Pad A's disconnect is handled
        h.gamepads.set_slot(0, Some(pad("Pad B", vec![], vec![ButtonSample::pressed()])));
        assert_eq!(h.poller.on_frame(), 1);

        h.poller.handle_host_event(HostEvent::GamepadDisconnected(DeviceInfo {
            slot: 0,
            id: "Pad A".to_string(),
            path: "/dev/input/event3".to_string(),
        }));
        assert_eq!(h.poller.history().previous(0).unwrap().id, "Pad B");

        // Still held, so no second press
        assert_eq!(h.poller.on_frame(), 0);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_reused_slot_axis_does_not_compare_across_devices() {
        let (action, seen) = recording_action("steer", vec![Binding::GamepadAxis { index: 0 }]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Pad A", vec![0.0], vec![])));
        h.poller.on_frame();
        h.gamepads.set_slot(0, Some(pad("Pad B", vec![0.7], vec![])));
        assert_eq!(h.poller.on_frame(), 0);

        h.gamepads.set_slot(0, Some(pad("Pad B", vec![0.6], vec![])));
        assert_eq!(h.poller.on_frame(), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_slot_clears_history() {
        let mut h = harness(vec![]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Pad", vec![0.0], vec![])));
        h.poller.on_frame();
        assert_eq!(h.poller.history().len(), 1);

        h.gamepads.set_slot(0, None);
        h.poller.on_frame();
        assert!(h.poller.history().is_empty());
    }

    #[test]
    fn test_connect_event_changes_nothing() {
        let mut h = harness(vec![]);
        h.poller.handle_host_event(HostEvent::GamepadConnected(DeviceInfo {
            slot: 1,
            id: "Pad".to_string(),
            path: "/dev/input/event7".to_string(),
        }));
        assert!(h.poller.history().is_empty());
        assert_eq!(h.poller.state(), PollerState::Stopped);
    }

    // ==================== Keyboard Tests ====================

    #[test]
    fn test_keyboard_edge_routing() {
        let (down_action, down_seen) = recording_action("forward", vec![Binding::key_down("Space")]);
        let (up_action, up_seen) = recording_action("release", vec![Binding::key_up("Space")]);
        let (other_action, other_seen) = recording_action("other", vec![Binding::key_down("KeyW")]);
        let mut h = harness(vec![down_action, up_action, other_action]);

        h.poller.handle_host_event(HostEvent::Key(KeyEvent::down("Space")));
        assert_eq!(*down_seen.lock().unwrap(), vec![Context::Keyboard]);
        assert!(up_seen.lock().unwrap().is_empty());

        h.poller.handle_host_event(HostEvent::Key(KeyEvent::up("Space")));
        assert_eq!(down_seen.lock().unwrap().len(), 1);
        assert_eq!(*up_seen.lock().unwrap(), vec![Context::Keyboard]);

        assert!(other_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_keyboard_works_while_stopped() {
        let (action, seen) = recording_action("estop", vec![Binding::key_down("Escape")]);
        let mut h = harness(vec![action]);

        assert_eq!(h.poller.handle_key(&KeyEvent::down("Escape")), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_keyboard_ignored_when_unsupported() {
        let (action, seen) = recording_action("estop", vec![Binding::key_down("Escape")]);
        let mut poller = InputPoller::new(
            vec![action],
            PollerSettings::default(),
            Box::new(unsupported_host()),
            Box::new(RecordingEvents::new()),
            Box::new(CountingScheduler::new()),
        );

        assert_eq!(poller.handle_key(&KeyEvent::down("Escape")), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_keyboard_bindings_never_fire_from_frames() {
        let (action, seen) = recording_action("estop", vec![Binding::key_down("Space")]);
        let mut h = harness(vec![action]);
        h.poller.start();

        h.gamepads.set_slot(0, Some(pad("Pad", vec![1.0], vec![ButtonSample::pressed()])));
        assert_eq!(h.poller.on_frame(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    // ==================== Action Map Tests ====================

    #[test]
    fn test_set_action_map_replaces_everything() {
        let (old_action, old_seen) = recording_action("old", vec![Binding::Gamepad]);
        let (new_action, new_seen) = recording_action("new", vec![Binding::Gamepad]);
        let mut h = harness(vec![old_action]);
        h.poller.start();
        h.gamepads.set_slot(0, Some(pad("Pad", vec![0.0], vec![])));

        h.poller.on_frame();
        h.poller.set_action_map(vec![new_action]);
        h.poller.on_frame();

        assert_eq!(h.poller.action_names(), vec!["new"]);
        assert_eq!(old_seen.lock().unwrap().len(), 1);
        assert_eq!(new_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_trigger_by_name() {
        let (action, seen) = recording_action("snapshot", vec![Binding::key_down("KeyP")]);
        let mut h = harness(vec![action]);

        assert!(h.poller.trigger("snapshot"));
        assert!(!h.poller.trigger("missing"));
        assert_eq!(*seen.lock().unwrap(), vec![Context::None]);
    }

    // ==================== Settings Tests ====================

    #[test]
    fn test_default_settings() {
        let settings = PollerSettings::default();
        assert_eq!(settings.button_threshold, DEFAULT_BUTTON_THRESHOLD);
        assert!(settings.is_spacemouse("3Dconnexion SpaceMouse Pro"));
        assert!(settings.is_spacemouse("3Dconnexion SpaceNavigator"));
        assert!(!settings.is_spacemouse("Sony DualSense"));
        assert!(settings.is_ignored("Unknown Gamepad"));
        assert!(!settings.is_ignored("Sony DualSense"));
    }

    #[test]
    fn test_settings_accepts() {
        let settings = PollerSettings::default();
        assert!(settings.accepts(&pad("Pad", vec![0.0], vec![])));
        assert!(!settings.accepts(&pad("Pad", vec![], vec![])));
        assert!(!settings.accepts(&pad("Unknown", vec![0.0], vec![])));
    }
}
