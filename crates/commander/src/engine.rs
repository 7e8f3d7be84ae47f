//! Power transition engine.
//!
//! One engine per attached codec. Three trigger paths feed one transition
//! handler:
//!
//! ```text
//!   apply_power_ordinal ─────────┐
//!   apply_power_ordinal_external ├──► handle_state_change(Sleep | Active)
//!   on_timer_action (polling) ───┘          │
//!                                           ├── EAPD clear/set (+ reset, retry once)
//!                                           ├── custom command groups
//!                                           └── cold_boot / eapd_powered_down
//! ```
//!
//! Every path runs under the shared [`CodecLock`], so transitions of one
//! engine never interleave with each other or with any other codec's
//! hardware sequence. [`EngineState`] sits behind its own short-lived mutex
//! and is never held across a port call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use platform::{
    hda, AudioDevicePower, CodecLock, CommandPort, ExternalPowerTarget, PeerLocator, PollTimer,
    PowerObservation, PowerOrdinal, PowerRole, TimerError, TimerFactory,
};
use profile::{ResolvedConfiguration, Trigger};

use crate::eapd::EapdNodes;

/// First poll after a cold boot. The peer audio engine needs this long to
/// finish initialising.
pub const COLD_BOOT_POLL_DELAY: Duration = Duration::from_millis(20_000);

/// First poll after a wake.
pub const WAKE_POLL_DELAY: Duration = Duration::from_millis(100);

/// Mutable per-engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    /// No sleep has been seen since attach.
    pub cold_boot: bool,
    /// EAPD is believed to be cleared (or lost to a reset).
    pub eapd_powered_down: bool,
    /// Peer device state at the last poll.
    pub previous_observed: PowerObservation,
}

impl Default for EngineState {
    // Assume no power until proven otherwise.
    fn default() -> Self {
        Self {
            cold_boot: true,
            eapd_powered_down: true,
            previous_observed: PowerObservation::Sleep,
        }
    }
}

/// The state machine driving one codec.
pub struct PowerTransitionEngine {
    port: Arc<dyn CommandPort>,
    lock: CodecLock,
    config: ResolvedConfiguration,
    nodes: EapdNodes,
    locator: Arc<dyn PeerLocator>,
    state: Mutex<EngineState>,
    audio_device: Mutex<Option<Arc<dyn AudioDevicePower>>>,
    timer: Mutex<Option<Arc<dyn PollTimer>>>,
    detached: AtomicBool,
}

impl PowerTransitionEngine {
    /// Build an engine in the cold-boot state. Polling is not started.
    pub fn new(
        port: Arc<dyn CommandPort>,
        lock: CodecLock,
        config: ResolvedConfiguration,
        nodes: EapdNodes,
        locator: Arc<dyn PeerLocator>,
    ) -> Arc<Self> {
        Arc::new(Self {
            port,
            lock,
            config,
            nodes,
            locator,
            state: Mutex::new(EngineState::default()),
            audio_device: Mutex::new(None),
            timer: Mutex::new(None),
            detached: AtomicBool::new(false),
        })
    }

    /// Create the poll timer if the configuration asks for polling.
    ///
    /// The timer stays idle until the first wake ordinal arms it. It holds
    /// only a weak reference to the engine.
    pub fn start_polling(self: &Arc<Self>, timers: &dyn TimerFactory) -> Result<(), TimerError> {
        if !self.config.check_infinitely() {
            return Ok(());
        }
        tracing::debug!("polling requested, creating timer");
        let engine: Weak<Self> = Arc::downgrade(self);
        let timer = timers.create(Box::new(move || {
            if let Some(engine) = engine.upgrade() {
                engine.on_timer_action();
            }
        }))?;
        *self.timer.lock() = Some(timer);
        Ok(())
    }

    /// Detach the engine: cancel the poll timer and release it and the peer
    /// device handle.
    ///
    /// Every later ordinal or poll tick is ignored, whoever still holds a
    /// handle. A poll already running finishes. Must not be called with the
    /// codec lock held: dropping a thread-backed timer joins its thread,
    /// which may be waiting for that lock.
    pub fn shutdown(&self) {
        {
            // Under the codec lock, so no transition is half way through.
            let _guard = self.lock.lock();
            self.detached.store(true, Ordering::SeqCst);
        }
        let timer = self.timer.lock().take();
        if let Some(timer) = timer {
            timer.cancel();
            drop(timer);
            tracing::debug!("poll timer stopped");
        }
        self.audio_device.lock().take();
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &ResolvedConfiguration {
        &self.config
    }

    /// The EAPD-capable nodes found at attach.
    pub fn nodes(&self) -> &EapdNodes {
        &self.nodes
    }

    /// Returns `true` once [`Self::shutdown`] has run.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Snapshot of the mutable state.
    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    /// Handle an ordinal from the engine's own power-tree parent.
    pub fn apply_power_ordinal(&self, ordinal: PowerOrdinal) {
        tracing::debug!(?ordinal, "set power state");
        let _guard = self.lock.lock();
        if self.is_detached() {
            tracing::debug!("engine detached, ignoring power state");
            return;
        }
        match ordinal {
            PowerOrdinal::Sleep => self.enter_sleep(),
            PowerOrdinal::Doze | PowerOrdinal::Normal => {
                if self.config.perform_reset() {
                    self.perform_codec_reset();
                }

                // With "Perform Reset" off and "Perform Reset on External Wake"
                // on, wake is left entirely to the external path.
                let handles_wake =
                    self.config.perform_reset() || !self.config.perform_reset_on_external_wake();
                if handles_wake && self.state.lock().eapd_powered_down {
                    self.handle_state_change(PowerObservation::Active);
                }

                if self.config.check_infinitely() {
                    let delay = if self.state.lock().cold_boot {
                        COLD_BOOT_POLL_DELAY
                    } else {
                        WAKE_POLL_DELAY
                    };
                    self.arm_timer(delay);
                    tracing::debug!(?delay, "poll timer armed");
                }
            }
        }
    }

    /// Handle an ordinal forwarded by the peer power observer.
    pub fn apply_power_ordinal_external(&self, ordinal: PowerOrdinal) {
        tracing::debug!(?ordinal, "set power state (external)");
        let _guard = self.lock.lock();
        if self.is_detached() {
            tracing::debug!("engine detached, ignoring external power state");
            return;
        }
        match ordinal {
            PowerOrdinal::Sleep => self.enter_sleep(),
            PowerOrdinal::Doze | PowerOrdinal::Normal => {
                if self.state.lock().eapd_powered_down
                    && self.config.perform_reset_on_external_wake()
                {
                    self.perform_codec_reset();
                }
                if self.state.lock().eapd_powered_down {
                    self.handle_state_change(PowerObservation::Active);
                }
            }
        }
    }

    /// One poll: re-arm, sample the peer device, act on a change.
    pub fn on_timer_action(&self) {
        if self.is_detached() {
            return;
        }
        self.arm_timer(self.config.check_interval());

        let Some(device) = self.audio_device() else {
            return;
        };
        let observed = device.power_state();

        let _guard = self.lock.lock();
        if self.is_detached() {
            return;
        }
        let previous = {
            let mut state = self.state.lock();
            let previous = state.previous_observed;
            if observed == previous {
                return;
            }
            state.previous_observed = observed;
            previous
        };
        tracing::debug!(from = %previous, to = %observed, "power state transition recorded");

        if observed.is_powered() {
            tracing::debug!("codec power restored");
            self.handle_state_change(PowerObservation::Active);
        } else {
            tracing::debug!("codec lost power");
            self.handle_state_change(PowerObservation::Sleep);
        }
    }

    /// The transition handler. `Idle` is treated as `Active`.
    pub fn handle_state_change(&self, target: PowerObservation) {
        let _guard = self.lock.lock();
        match target {
            PowerObservation::Sleep => {
                self.state.lock().cold_boot = false;
                if self.config.sleep_nodes() {
                    self.write_eapd(hda::EAPD_LOW);
                }
                self.run_command_groups(Trigger::Sleep);
                self.state.lock().eapd_powered_down = true;
            }
            PowerObservation::Idle | PowerObservation::Active => {
                self.port.apply_timing_compensation();
                if self.config.update_nodes() {
                    self.write_eapd(hda::EAPD_HIGH);
                }
                if !self.state.lock().cold_boot {
                    self.run_command_groups(Trigger::Wake);
                }
                self.state.lock().eapd_powered_down = false;
            }
        }
    }

    /// Send every command group bound to `trigger` that matches the codec's
    /// live layout id. Failed verbs are logged and skipped.
    pub fn run_command_groups(&self, trigger: Trigger) {
        let _guard = self.lock.lock();
        let layout = self.port.layout_id();
        for group in self.config.commands_for(trigger, layout) {
            for &verb in &group.verbs {
                tracing::trace!(
                    trigger = trigger.name(),
                    verb = format_args!("{verb:#010x}"),
                    "custom command"
                );
                if let Err(err) = self.port.send_command(verb) {
                    tracing::warn!(trigger = trigger.name(), "custom command failed: {err}");
                }
            }
        }
    }

    /// Reset the codec. Does nothing before the first sleep.
    fn perform_codec_reset(&self) {
        let _guard = self.lock.lock();
        if self.state.lock().cold_boot {
            return;
        }
        tracing::info!("resetting codec");
        self.port.reset_codec();
        self.state.lock().eapd_powered_down = true;
    }

    fn enter_sleep(&self) {
        if !self.state.lock().eapd_powered_down {
            self.handle_state_change(PowerObservation::Sleep);
        }
    }

    // Delay, write every node, and on failure reset and retry exactly once.
    fn write_eapd(&self, level: u8) {
        if self.set_eapd(level) || !self.config.perform_reset_on_eapd_fail() {
            return;
        }
        tracing::warn!(level, "EAPD write failed, attempting fix with codec reset");
        self.perform_codec_reset();
        self.set_eapd(level);
    }

    fn set_eapd(&self, level: u8) -> bool {
        // Some codecs pop if EAPD changes before they finish initialising.
        std::thread::sleep(self.config.send_delay());
        let _guard = self.lock.lock();
        self.nodes.write(self.port.as_ref(), level)
    }

    fn audio_device(&self) -> Option<Arc<dyn AudioDevicePower>> {
        let mut cached = self.audio_device.lock();
        if cached.is_none() {
            *cached = self.locator.audio_device();
            if cached.is_none() {
                tracing::debug!("peer audio device not found");
            }
        }
        cached.clone()
    }

    fn arm_timer(&self, after: Duration) {
        if let Some(timer) = self.timer.lock().as_ref() {
            timer.set_timeout(after);
        }
    }
}

impl PowerRole for PowerTransitionEngine {
    fn set_power_state(&self, ordinal: PowerOrdinal) {
        self.apply_power_ordinal(ordinal);
    }
}

impl ExternalPowerTarget for PowerTransitionEngine {
    fn set_power_state_external(&self, ordinal: PowerOrdinal) {
        self.apply_power_ordinal_external(ordinal);
    }
}

impl core::fmt::Debug for PowerTransitionEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerTransitionEngine")
            .field("nodes", &self.nodes)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{ManualTimerFactory, MockCodec, MockEvent};
    use platform::NoPeers;
    use profile::{ProfileSet, Role};
    use serde_json::{json, Value};

    fn engine_with(profile: Value, codec: &Arc<MockCodec>) -> Arc<PowerTransitionEngine> {
        let profiles = ProfileSet::from_value(json!({ "Default": profile })).unwrap();
        let config =
            ResolvedConfiguration::from_profiles(&profiles, 0x10EC_0269, 0, Role::Engine, None)
                .unwrap();
        let nodes = EapdNodes::discover(codec.as_ref());
        codec.clear_events();
        PowerTransitionEngine::new(
            Arc::clone(codec) as Arc<dyn CommandPort>,
            CodecLock::new(),
            config,
            nodes,
            Arc::new(NoPeers),
        )
    }

    fn codec() -> Arc<MockCodec> {
        Arc::new(
            MockCodec::new(0x10EC_0269)
                .with_nodes(0x14, 2)
                .with_eapd_nodes(&[0x14, 0x15]),
        )
    }

    #[test]
    fn test_initial_state_is_pessimistic() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        assert_eq!(engine.state(), EngineState::default());
        assert!(engine.state().cold_boot);
        assert!(engine.state().eapd_powered_down);
    }

    #[test]
    fn test_cold_boot_wake_sets_eapd_without_reset() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.apply_power_ordinal(PowerOrdinal::Normal);

        assert_eq!(codec.reset_count(), 0);
        assert_eq!(codec.timing_compensation_count(), 1);
        let writes = codec.verbs(hda::VERB_SET_EAPD_BTL);
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|w| w.payload == hda::EAPD_HIGH));
        assert!(!engine.state().eapd_powered_down);
        assert!(engine.state().cold_boot);
    }

    #[test]
    fn test_sleep_clears_eapd_and_ends_cold_boot() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.apply_power_ordinal(PowerOrdinal::Normal);
        codec.clear_events();

        engine.apply_power_ordinal(PowerOrdinal::Sleep);
        let writes = codec.verbs(hda::VERB_SET_EAPD_BTL);
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|w| w.payload == hda::EAPD_LOW));
        assert!(!engine.state().cold_boot);
        assert!(engine.state().eapd_powered_down);
    }

    #[test]
    fn test_sleep_ignored_while_powered_down() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.apply_power_ordinal(PowerOrdinal::Sleep);
        assert!(codec.events().is_empty());
        assert!(engine.state().cold_boot);
    }

    #[test]
    fn test_warm_wake_resets_before_eapd() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.apply_power_ordinal(PowerOrdinal::Normal);
        engine.apply_power_ordinal(PowerOrdinal::Sleep);
        codec.clear_events();

        engine.apply_power_ordinal(PowerOrdinal::Normal);
        let events = codec.events();
        assert_eq!(events[0], MockEvent::Reset);
        assert_eq!(events[1], MockEvent::TimingCompensation);
        assert_eq!(codec.verbs(hda::VERB_SET_EAPD_BTL).len(), 2);
    }

    #[test]
    fn test_internal_path_defers_to_external_wake() {
        let codec = codec();
        let engine = engine_with(
            json!({
                "Send Delay": 0,
                "Perform Reset": false,
                "Perform Reset on External Wake": true,
            }),
            &codec,
        );
        engine.apply_power_ordinal(PowerOrdinal::Normal);
        assert!(codec.events().is_empty());
        assert!(engine.state().eapd_powered_down);

        engine.apply_power_ordinal_external(PowerOrdinal::Normal);
        assert_eq!(codec.verbs(hda::VERB_SET_EAPD_BTL).len(), 2);
        assert!(!engine.state().eapd_powered_down);
    }

    #[test]
    fn test_external_wake_skipped_when_already_powered() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.apply_power_ordinal(PowerOrdinal::Normal);
        codec.clear_events();

        engine.apply_power_ordinal_external(PowerOrdinal::Normal);
        assert!(codec.events().is_empty());
    }

    #[test]
    fn test_idle_is_handled_like_active() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.handle_state_change(PowerObservation::Idle);
        assert_eq!(codec.timing_compensation_count(), 1);
        assert!(!engine.state().eapd_powered_down);
    }

    #[test]
    fn test_polling_timer_armed_only_when_enabled() {
        let codec = codec();
        let timers = ManualTimerFactory::new();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.start_polling(&timers).unwrap();
        engine.apply_power_ordinal(PowerOrdinal::Normal);
        assert_eq!(timers.created(), 0);
        assert!(timers.timer().arms().is_empty());
    }

    #[test]
    fn test_shutdown_cancels_timer() {
        let codec = codec();
        let timers = ManualTimerFactory::new();
        let engine = engine_with(json!({ "Send Delay": 0, "Check Infinitely": true }), &codec);
        engine.start_polling(&timers).unwrap();
        engine.apply_power_ordinal(PowerOrdinal::Normal);
        assert_eq!(timers.timer().pending(), Some(COLD_BOOT_POLL_DELAY));

        engine.shutdown();
        assert_eq!(timers.timer().cancel_count(), 1);
        assert!(!timers.timer().fire());
        engine.apply_power_ordinal(PowerOrdinal::Normal);
        assert_eq!(timers.timer().arms().len(), 1);
    }

    #[test]
    fn test_detached_engine_ignores_every_entry_point() {
        let codec = codec();
        let engine = engine_with(json!({ "Send Delay": 0 }), &codec);
        engine.shutdown();
        assert!(engine.is_detached());

        engine.apply_power_ordinal(PowerOrdinal::Normal);
        engine.apply_power_ordinal_external(PowerOrdinal::Normal);
        engine.on_timer_action();
        assert!(codec.events().is_empty());
        assert_eq!(engine.state(), EngineState::default());
    }
}
