//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "mocks"))]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::hda::{self, DecodedVerb};
use crate::*;

/// Something the mock codec saw, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    /// A command word, codec address included. Recorded whether or not it failed.
    Command(u32),
    /// [`CommandPort::reset_codec`] was called.
    Reset,
    /// [`CommandPort::apply_timing_compensation`] was called.
    TimingCompensation,
}

#[derive(Debug)]
struct FailureRule {
    verb: u16,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MockCodecState {
    layout_id: Option<u32>,
    pincaps: BTreeMap<u8, u32>,
    failures: Vec<FailureRule>,
    events: Vec<MockEvent>,
    initialized: bool,
}

/// Mock codec port. Records every command for assertion in tests.
#[derive(Debug)]
pub struct MockCodec {
    vendor_id: u32,
    subsystem_id: u32,
    address: u8,
    function_group_type: u8,
    starting_node: u8,
    total_nodes: u8,
    initialize_ok: bool,
    state: Mutex<MockCodecState>,
}

impl MockCodec {
    /// Create a mock codec with no widgets, address 0, layout id 3.
    pub fn new(vendor_id: u32) -> Self {
        Self {
            vendor_id,
            subsystem_id: 0,
            address: 0,
            function_group_type: 0x01,
            starting_node: 0x02,
            total_nodes: 0,
            initialize_ok: true,
            state: Mutex::new(MockCodecState {
                layout_id: Some(3),
                ..MockCodecState::default()
            }),
        }
    }

    /// Set the HDA subsystem id.
    #[must_use]
    pub fn with_subsystem_id(mut self, subsystem_id: u32) -> Self {
        self.subsystem_id = subsystem_id;
        self
    }

    /// Set the codec address.
    #[must_use]
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Set the widget range the codec enumerates.
    #[must_use]
    pub fn with_nodes(mut self, starting_node: u8, total_nodes: u8) -> Self {
        self.starting_node = starting_node;
        self.total_nodes = total_nodes;
        self
    }

    /// Give each of `nodes` a Pin Capabilities response with the EAPD bit set.
    #[must_use]
    pub fn with_eapd_nodes(self, nodes: &[u8]) -> Self {
        {
            let mut state = self.state.lock();
            for &node in nodes {
                state.pincaps.insert(node, 0x0001_0014);
            }
        }
        self
    }

    /// Set the Pin Capabilities response of one node.
    #[must_use]
    pub fn with_pincap(self, node: u8, pincap: u32) -> Self {
        self.state.lock().pincaps.insert(node, pincap);
        self
    }

    /// Set the layout id reported by the platform.
    #[must_use]
    pub fn with_layout_id(self, layout_id: Option<u32>) -> Self {
        self.set_layout_id(layout_id);
        self
    }

    /// Make [`CommandPort::initialize`] report that no codec answered.
    #[must_use]
    pub fn failing_initialize(mut self) -> Self {
        self.initialize_ok = false;
        self
    }

    /// Change the layout id after construction.
    pub fn set_layout_id(&self, layout_id: Option<u32>) {
        self.state.lock().layout_id = layout_id;
    }

    /// Fail commands carrying `verb`: the next `times` of them, or all of them for `None`.
    pub fn fail_verb(&self, verb: u16, times: Option<usize>) {
        self.state.lock().failures.push(FailureRule {
            verb,
            remaining: times,
        });
    }

    /// Stop failing any verb.
    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Everything seen so far, in order.
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().events.clone()
    }

    /// Forget recorded events.
    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    /// Every command word sent, codec address included.
    pub fn commands(&self) -> Vec<u32> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Command(command) => Some(*command),
                _ => None,
            })
            .collect()
    }

    /// Decoded commands carrying `verb`, in send order.
    pub fn verbs(&self, verb: u16) -> Vec<DecodedVerb> {
        self.commands()
            .into_iter()
            .map(DecodedVerb::decode)
            .filter(|decoded| decoded.verb == verb)
            .collect()
    }

    /// Number of codec resets.
    pub fn reset_count(&self) -> usize {
        self.count(MockEvent::Reset)
    }

    /// Number of timing-compensation fixups.
    pub fn timing_compensation_count(&self) -> usize {
        self.count(MockEvent::TimingCompensation)
    }

    /// Whether [`CommandPort::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    fn count(&self, wanted: MockEvent) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|event| **event == wanted)
            .count()
    }
}

impl CommandPort for MockCodec {
    fn initialize(&self) -> bool {
        self.state.lock().initialized = self.initialize_ok;
        self.initialize_ok
    }

    fn send_command(&self, command: u32) -> Result<u32, TransportError> {
        let full = hda::with_codec_address(self.address, command);
        let decoded = DecodedVerb::decode(full);
        let mut state = self.state.lock();
        state.events.push(MockEvent::Command(full));

        let failed = state
            .failures
            .iter_mut()
            .filter(|rule| rule.verb == decoded.verb)
            .any(|rule| match &mut rule.remaining {
                None => true,
                Some(0) => false,
                Some(remaining) => {
                    *remaining -= 1;
                    true
                }
            });
        if failed {
            return Err(TransportError::NoResponse { command: full });
        }

        if decoded.verb == hda::VERB_GET_PARAM && decoded.payload == hda::PARAM_PIN_CAPABILITIES {
            return Ok(state.pincaps.get(&decoded.node).copied().unwrap_or(0));
        }
        Ok(0)
    }

    fn vendor_id(&self) -> u32 {
        self.vendor_id
    }

    fn subsystem_id(&self) -> u32 {
        self.subsystem_id
    }

    fn codec_address(&self) -> u8 {
        self.address
    }

    fn function_group_type(&self) -> u8 {
        self.function_group_type
    }

    fn layout_id(&self) -> Option<u32> {
        self.state.lock().layout_id
    }

    fn starting_node(&self) -> u8 {
        self.starting_node
    }

    fn total_nodes(&self) -> u8 {
        self.total_nodes
    }

    fn apply_timing_compensation(&self) {
        self.state.lock().events.push(MockEvent::TimingCompensation);
    }

    fn reset_codec(&self) {
        self.state.lock().events.push(MockEvent::Reset);
    }
}

/// Mock peer audio device with a settable power state.
#[derive(Debug)]
pub struct MockAudioDevice {
    state: Mutex<PowerObservation>,
}

impl MockAudioDevice {
    /// Create a device reporting `state`.
    pub fn new(state: PowerObservation) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Change the reported state.
    pub fn set_power_state(&self, state: PowerObservation) {
        *self.state.lock() = state;
    }
}

impl AudioDevicePower for MockAudioDevice {
    fn power_state(&self) -> PowerObservation {
        *self.state.lock()
    }
}

/// Records every ordinal forwarded to it.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    received: Mutex<Vec<PowerOrdinal>>,
}

impl RecordingTarget {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordinals received so far.
    pub fn received(&self) -> Vec<PowerOrdinal> {
        self.received.lock().clone()
    }
}

impl ExternalPowerTarget for RecordingTarget {
    fn set_power_state_external(&self, ordinal: PowerOrdinal) {
        self.received.lock().push(ordinal);
    }
}

/// Locator returning fixed peers.
#[derive(Default, Clone)]
pub struct MockLocator {
    audio_device: Option<Arc<dyn AudioDevicePower>>,
    engine: Option<Arc<dyn ExternalPowerTarget>>,
    lookups: Arc<AtomicUsize>,
}

impl MockLocator {
    /// Locator that finds nothing until peers are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find `device` as the peer audio device.
    #[must_use]
    pub fn with_audio_device(mut self, device: Arc<dyn AudioDevicePower>) -> Self {
        self.audio_device = Some(device);
        self
    }

    /// Find `engine` as the sibling engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn ExternalPowerTarget>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Number of audio-device lookups performed.
    pub fn audio_device_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl PeerLocator for MockLocator {
    fn audio_device(&self) -> Option<Arc<dyn AudioDevicePower>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.audio_device.clone()
    }

    fn engine(&self) -> Option<Arc<dyn ExternalPowerTarget>> {
        self.engine.clone()
    }
}

type SharedAction = Arc<dyn Fn() + Send + Sync + 'static>;

/// Poll timer fired by hand.
#[derive(Default)]
pub struct ManualTimer {
    arms: Mutex<Vec<Duration>>,
    pending: Mutex<Option<Duration>>,
    cancels: AtomicUsize,
    action: Mutex<Option<SharedAction>>,
}

impl ManualTimer {
    /// Every duration passed to [`PollTimer::set_timeout`], in order.
    pub fn arms(&self) -> Vec<Duration> {
        self.arms.lock().clone()
    }

    /// The pending deadline, if armed.
    pub fn pending(&self) -> Option<Duration> {
        *self.pending.lock()
    }

    /// Number of [`PollTimer::cancel`] calls.
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Fire the timer if it is armed. Returns `true` if the action ran.
    pub fn fire(&self) -> bool {
        if self.pending.lock().take().is_none() {
            return false;
        }
        let action = self.action.lock().clone();
        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }
}

impl PollTimer for ManualTimer {
    fn set_timeout(&self, after: Duration) {
        self.arms.lock().push(after);
        *self.pending.lock() = Some(after);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        *self.pending.lock() = None;
    }
}

/// Factory handing out one shared [`ManualTimer`].
#[derive(Default, Clone)]
pub struct ManualTimerFactory {
    timer: Arc<ManualTimer>,
    created: Arc<AtomicUsize>,
}

impl ManualTimerFactory {
    /// Create a factory with an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The timer this factory hands out.
    pub fn timer(&self) -> &ManualTimer {
        &self.timer
    }

    /// Number of timers created.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl TimerFactory for ManualTimerFactory {
    fn create(&self, action: TimerAction) -> Result<Arc<dyn PollTimer>, TimerError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.timer.action.lock() = Some(Arc::from(action));
        Ok(Arc::clone(&self.timer) as Arc<dyn PollTimer>)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_codec_injects_address() {
        let codec = MockCodec::new(0x10EC_0269).with_address(2);
        codec.send_verb(0x14, hda::VERB_SET_EAPD_BTL, hda::EAPD_HIGH).unwrap();
        assert_eq!(codec.commands(), vec![0x2147_0C02]);
    }

    #[test]
    fn test_mock_codec_reports_pincaps() {
        let codec = MockCodec::new(0x10EC_0269).with_eapd_nodes(&[0x14]);
        let pincap = codec
            .send_verb(0x14, hda::VERB_GET_PARAM, hda::PARAM_PIN_CAPABILITIES)
            .unwrap();
        assert!(hda::pincap_is_eapd_capable(pincap));
        let pincap = codec
            .send_verb(0x15, hda::VERB_GET_PARAM, hda::PARAM_PIN_CAPABILITIES)
            .unwrap();
        assert!(!hda::pincap_is_eapd_capable(pincap));
    }

    #[test]
    fn test_mock_codec_counted_failures() {
        let codec = MockCodec::new(0x10EC_0269);
        codec.fail_verb(hda::VERB_SET_EAPD_BTL, Some(2));
        assert!(codec.send_verb(0x14, hda::VERB_SET_EAPD_BTL, 0).is_err());
        assert!(codec.send_verb(0x15, hda::VERB_SET_EAPD_BTL, 0).is_err());
        assert!(codec.send_verb(0x14, hda::VERB_SET_EAPD_BTL, 0).is_ok());
        // Failed attempts are still recorded
        assert_eq!(codec.verbs(hda::VERB_SET_EAPD_BTL).len(), 3);
    }

    #[test]
    fn test_mock_codec_permanent_failure() {
        let codec = MockCodec::new(0x10EC_0269);
        codec.fail_verb(hda::VERB_SET_EAPD_BTL, None);
        for _ in 0..5 {
            assert!(codec.send_verb(0x14, hda::VERB_SET_EAPD_BTL, 0).is_err());
        }
        assert!(codec.send_verb(0x14, hda::VERB_GET_PARAM, 0).is_ok());
    }

    #[test]
    fn test_manual_timer_fires_only_when_armed() {
        let factory = ManualTimerFactory::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = factory
            .create(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(!factory.timer().fire());
        timer.set_timeout(Duration::from_millis(100));
        assert!(factory.timer().fire());
        assert!(!factory.timer().fire());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(factory.timer().arms(), vec![Duration::from_millis(100)]);
    }
}
