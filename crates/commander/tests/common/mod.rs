//! Shared rig for commander integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::sync::Arc;

use commander::{EngineRole, Residency};
use platform::mocks::{ManualTimerFactory, MockAudioDevice, MockCodec, MockLocator};
use platform::{hda, BootArgs, CommandPort, PeerLocator, PowerObservation};
use profile::ProfileSet;
use serde_json::{json, Value};

/// Realtek ALC269, the codec every fixture profiles.
pub const ALC269: u32 = 0x10EC_0269;

/// Profile document with `fields` under the ALC269 vendor key.
pub fn profiles(fields: Value) -> ProfileSet {
    ProfileSet::from_value(json!({ "10ec_0269": fields })).unwrap()
}

/// ALC269 with widgets 0x14..0x1C, of which `eapd` are EAPD-capable.
pub fn codec(eapd: &[u8]) -> MockCodec {
    MockCodec::new(ALC269)
        .with_nodes(0x14, 8)
        .with_eapd_nodes(eapd)
}

/// Everything an attached engine role talks to.
pub struct Rig {
    pub residency: Residency,
    pub codec: Arc<MockCodec>,
    pub device: Arc<MockAudioDevice>,
    pub locator: MockLocator,
    pub timers: ManualTimerFactory,
}

impl Rig {
    pub fn new(codec: MockCodec) -> Self {
        let device = Arc::new(MockAudioDevice::new(PowerObservation::Active));
        Self {
            residency: Residency::load(BootArgs::default()),
            codec: Arc::new(codec),
            locator: MockLocator::new().with_audio_device(Arc::clone(&device) as _),
            device,
            timers: ManualTimerFactory::new(),
        }
    }

    /// Attach the engine role and forget the attach-time traffic.
    pub fn attach(&self, profiles: &ProfileSet) -> EngineRole {
        let role = self.try_attach(profiles).expect("engine role attaches");
        self.codec.clear_events();
        role
    }

    pub fn try_attach(&self, profiles: &ProfileSet) -> Result<EngineRole, commander::AttachError> {
        EngineRole::attach(
            &self.residency,
            Arc::clone(&self.codec) as Arc<dyn CommandPort>,
            profiles,
            Arc::new(self.locator.clone()) as Arc<dyn PeerLocator>,
            &self.timers,
        )
    }

    /// Payloads of every EAPD write since the last clear.
    pub fn eapd_writes(&self) -> Vec<(u8, u8)> {
        self.codec
            .verbs(hda::VERB_SET_EAPD_BTL)
            .into_iter()
            .map(|w| (w.node, w.payload))
            .collect()
    }

    /// Commands carrying `verb`, as sent (codec address included).
    pub fn sent(&self, verb: u16) -> usize {
        self.codec.verbs(verb).len()
    }
}

impl Rig {
    /// Times `command` was sent since the last clear (codec address 0).
    pub fn count(&self, command: u32) -> usize {
        self.codec.commands().iter().filter(|&&sent| sent == command).count()
    }
}
