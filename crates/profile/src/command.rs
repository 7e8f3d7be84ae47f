//! Compiled custom-command and pin-config groups.
//!
//! Profile entries are decoded once, at resolution, into strongly typed
//! records. An entry that does not decode is reported as an [`EntryError`]
//! and skipped by the caller; the rest of the profile still applies.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror_no_std::Error;

use crate::layout::LayoutFilter;
use crate::value;

/// Profile key of a command entry's verb list.
pub const KEY_COMMAND: &str = "Command";
/// Profile key: run the command group at attach.
pub const KEY_ON_INIT: &str = "On Init";
/// Profile key: run the command group on sleep.
pub const KEY_ON_SLEEP: &str = "On Sleep";
/// Profile key: run the command group on wake.
pub const KEY_ON_WAKE: &str = "On Wake";
/// Profile key of an entry's layout filter.
pub const KEY_LAYOUT_ID: &str = "LayoutID";
/// Profile key of a pin-config entry's `node, config` list.
pub const KEY_PIN_CONFIGS: &str = "PinConfigs";

/// Why a profile entry was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    /// The entry is not a JSON object.
    #[error("entry is not an object")]
    NotAnObject,
    /// A required key is absent.
    #[error("entry has no \"{0}\" key")]
    Missing(&'static str),
    /// A verb is not a 32-bit number.
    #[error("verb {index} is not a 32-bit number")]
    InvalidVerb {
        /// Position in the verb list.
        index: usize,
    },
    /// The verb list is empty.
    #[error("entry has an empty verb list")]
    NoVerbs,
    /// `LayoutID` is neither -1 nor a 32-bit id.
    #[error("layout id is neither -1 nor a 32-bit id")]
    InvalidLayout,
    /// A boolean trigger flag has a non-boolean value.
    #[error("\"{0}\" is not a boolean")]
    InvalidFlag(&'static str),
    /// The pin list has an odd number of values.
    #[error("pin list has odd length {0}")]
    OddPinList(usize),
    /// A pin list value is not a 32-bit number.
    #[error("pin value {index} is not a 32-bit number")]
    InvalidPinValue {
        /// Position in the pin list.
        index: usize,
    },
    /// A node id does not fit in 8 bits.
    #[error("node id {0:#x} is out of range")]
    InvalidNode(u32),
}

/// The event a command group can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Engine attach.
    Init,
    /// Transition to sleep.
    Sleep,
    /// Transition to wake.
    Wake,
}

impl Trigger {
    /// Name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Sleep => "sleep",
            Self::Wake => "wake",
        }
    }
}

/// A sequence of verbs sent together when a trigger fires.
///
/// Verbs carry no codec address; the port injects it at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandGroup {
    /// Run at engine attach.
    pub on_init: bool,
    /// Run on sleep.
    pub on_sleep: bool,
    /// Run on wake (never on the first activation after cold boot).
    pub on_wake: bool,
    /// Layouts this group applies to.
    pub layout: LayoutFilter,
    /// Verbs, in send order.
    pub verbs: Vec<u32>,
}

impl CommandGroup {
    /// Returns `true` if this group is bound to `trigger`.
    pub fn fires_on(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::Init => self.on_init,
            Trigger::Sleep => self.on_sleep,
            Trigger::Wake => self.on_wake,
        }
    }

    /// Returns `true` if this group is bound to `trigger` and applies to `layout`.
    pub fn selected(&self, trigger: Trigger, layout: Option<u32>) -> bool {
        self.fires_on(trigger) && self.layout.matches(layout)
    }

    /// Decode one `Custom Commands` entry.
    ///
    /// `Command` may be a single number, a numeric string, or an array of
    /// either. Trigger flags default to `false`, `LayoutID` to the wildcard.
    pub fn decode(entry: &Value) -> Result<Self, EntryError> {
        let entry = entry.as_object().ok_or(EntryError::NotAnObject)?;
        let command = entry.get(KEY_COMMAND).ok_or(EntryError::Missing(KEY_COMMAND))?;

        let verbs = match command {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| value::unsigned32(item).ok_or(EntryError::InvalidVerb { index }))
                .collect::<Result<Vec<_>, _>>()?,
            scalar => vec![value::unsigned32(scalar).ok_or(EntryError::InvalidVerb { index: 0 })?],
        };
        if verbs.is_empty() {
            return Err(EntryError::NoVerbs);
        }

        Ok(Self {
            on_init: flag(entry, KEY_ON_INIT)?,
            on_sleep: flag(entry, KEY_ON_SLEEP)?,
            on_wake: flag(entry, KEY_ON_WAKE)?,
            layout: layout(entry)?,
            verbs,
        })
    }
}

/// Default pin configurations applied at probe time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinConfigGroup {
    /// Layouts this group applies to.
    pub layout: LayoutFilter,
    /// `(node, config default)` pairs, in send order.
    pub pairs: Vec<(u8, u32)>,
}

impl PinConfigGroup {
    /// Decode one `PinConfigDefault` entry.
    ///
    /// `PinConfigs` is a flat `[node, config, node, config, ...]` list. An odd
    /// length makes the whole entry invalid; a pair whose node or config does
    /// not decode is skipped on its own and the other pairs still apply.
    pub fn decode(entry: &Value) -> Result<Self, EntryError> {
        let entry = entry.as_object().ok_or(EntryError::NotAnObject)?;
        let pins = entry
            .get(KEY_PIN_CONFIGS)
            .and_then(Value::as_array)
            .ok_or(EntryError::Missing(KEY_PIN_CONFIGS))?;
        if pins.len() % 2 != 0 {
            return Err(EntryError::OddPinList(pins.len()));
        }
        let layout = layout(entry)?;

        let pairs = pins
            .chunks_exact(2)
            .enumerate()
            .filter_map(|(pair_index, pair)| match decode_pin_pair(pair_index * 2, pair) {
                Ok(pair) => Some(pair),
                Err(err) => {
                    tracing::warn!(pair = pair_index, "skipping pin config: {err}");
                    None
                }
            })
            .collect();

        Ok(Self { layout, pairs })
    }
}

/// Decode one `node, config` pair starting at list position `index`.
pub fn decode_pin_pair(index: usize, pair: &[Value]) -> Result<(u8, u32), EntryError> {
    let node = value::unsigned32(&pair[0]).ok_or(EntryError::InvalidPinValue { index })?;
    let config =
        value::unsigned32(&pair[1]).ok_or(EntryError::InvalidPinValue { index: index + 1 })?;
    let node = u8::try_from(node).map_err(|_| EntryError::InvalidNode(node))?;
    Ok((node, config))
}

fn flag(entry: &Map<String, Value>, key: &'static str) -> Result<bool, EntryError> {
    match entry.get(key) {
        None => Ok(false),
        Some(raw) => value::boolean(raw).ok_or(EntryError::InvalidFlag(key)),
    }
}

fn layout(entry: &Map<String, Value>) -> Result<LayoutFilter, EntryError> {
    match entry.get(KEY_LAYOUT_ID) {
        None => Ok(LayoutFilter::Any),
        Some(raw) => value::integer(raw)
            .and_then(LayoutFilter::from_raw)
            .ok_or(EntryError::InvalidLayout),
    }
}

/// Decode every entry of a list, skipping (and logging) the ones that fail.
pub(crate) fn decode_list<T>(
    list: &[Value],
    what: &str,
    decode: impl Fn(&Value) -> Result<T, EntryError>,
) -> Vec<T> {
    list.iter()
        .enumerate()
        .filter_map(|(index, entry)| match decode(entry) {
            Ok(group) => Some(group),
            Err(err) => {
                tracing::warn!(index, "skipping {what} entry: {err}");
                None
            }
        })
        .collect()
}
