//! Boot-time disable switches.
//!
//! Two independent flags on the boot argument line switch roles off entirely.
//! Absence of a flag means normal operation.

/// Disables the engine role and the peer power observer role.
pub const DISABLE_ENGINE_FLAG: &str = "-ccoff";

/// Disables the probe-time initializer role.
pub const DISABLE_PROBE_INIT_FLAG: &str = "-ccpioff";

/// Parsed boot argument line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootArgs {
    args: Vec<String>,
}

impl BootArgs {
    /// Split a boot argument line on whitespace.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        Self {
            args: line.split_whitespace().map(str::to_owned).collect(),
        }
    }

    /// Returns `true` if `flag` appears as a whole argument, or as the key of a
    /// `flag=value` argument.
    #[must_use]
    pub fn contains(&self, flag: &str) -> bool {
        self.args
            .iter()
            .any(|arg| arg == flag || arg.split_once('=').is_some_and(|(key, _)| key == flag))
    }

    /// The engine role (and the observer that forwards to it) must not attach.
    #[must_use]
    pub fn engine_disabled(&self) -> bool {
        self.contains(DISABLE_ENGINE_FLAG)
    }

    /// The probe-time initializer must not run.
    #[must_use]
    pub fn probe_init_disabled(&self) -> bool {
        self.contains(DISABLE_PROBE_INIT_FLAG)
    }
}
