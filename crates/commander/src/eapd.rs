//! EAPD-capable node discovery and EAPD/BTL writes.

use platform::{hda, CommandPort};

/// The pin complexes whose EAPD bit the engine drives.
///
/// Discovered once at attach and read-only afterwards. An empty set is
/// legal; every write is then a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EapdNodes {
    nodes: Vec<u8>,
}

impl EapdNodes {
    /// A set with no nodes.
    pub fn none() -> Self {
        Self::default()
    }

    /// Query Pin Capabilities on every node of the codec's widget range and
    /// keep the EAPD-capable ones.
    ///
    /// Nodes that do not answer are skipped.
    pub fn discover<P: CommandPort + ?Sized>(port: &P) -> Self {
        tracing::debug!("getting EAPD supported node list");
        let mut nodes = Vec::new();
        for node in node_range(port.starting_node(), port.total_nodes()) {
            match port.send_verb(node, hda::VERB_GET_PARAM, hda::PARAM_PIN_CAPABILITIES) {
                Ok(pincap) if hda::pincap_is_eapd_capable(pincap) => {
                    tracing::info!(
                        node = format_args!("{node:#04x}"),
                        "node supports EAPD, will update state after sleep"
                    );
                    nodes.push(node);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(
                        node = format_args!("{node:#04x}"),
                        "failed to retrieve pin capabilities: {err}"
                    );
                }
            }
        }
        Self { nodes }
    }

    /// Node ids, in discovery order.
    pub fn as_slice(&self) -> &[u8] {
        &self.nodes
    }

    /// Number of capable nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node is EAPD-capable.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Send Set EAPD/BTL with `level` to every node.
    ///
    /// Every node is written even after a failure. Returns `false` if any
    /// write failed.
    pub fn write<P: CommandPort + ?Sized>(&self, port: &P, level: u8) -> bool {
        let mut all_ok = true;
        for &node in &self.nodes {
            if let Err(err) = port.send_verb(node, hda::VERB_SET_EAPD_BTL, level) {
                tracing::warn!(node = format_args!("{node:#04x}"), level, "EAPD write failed: {err}");
                all_ok = false;
            }
        }
        all_ok
    }
}

impl From<Vec<u8>> for EapdNodes {
    fn from(nodes: Vec<u8>) -> Self {
        Self { nodes }
    }
}

// Node ids are 8 bits wide; a range running past 0xFF is cut short.
fn node_range(start: u8, total: u8) -> impl Iterator<Item = u8> {
    let end = u16::from(start) + u16::from(total);
    (u16::from(start)..end).map_while(|node| u8::try_from(node).ok())
}
