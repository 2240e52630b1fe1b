//! The operator's current pairing candidate and destination choice.

use meshpair_domain::node::AvailableNode;
use meshpair_domain::relay::RelayTarget;

/// Zero or one candidate node plus a destination (default: the hub).
///
/// Selecting a new node replaces the prior selection and resets the
/// destination; clearing restores the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    candidate: Option<AvailableNode>,
    destination: RelayTarget,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            candidate: None,
            destination: RelayTarget::Hub,
        }
    }
}

impl SelectionState {
    /// The currently selected node, if any.
    #[must_use]
    pub fn candidate(&self) -> Option<&AvailableNode> {
        self.candidate.as_ref()
    }

    /// The chosen destination.
    #[must_use]
    pub fn destination(&self) -> &RelayTarget {
        &self.destination
    }

    /// Whether no node is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidate.is_none()
    }

    /// Select `node` as the pairing candidate, resetting the destination
    /// to the hub.
    pub fn select(&mut self, node: AvailableNode) {
        self.candidate = Some(node);
        self.destination = RelayTarget::Hub;
    }

    /// Change the destination for the current candidate.
    pub fn set_destination(&mut self, relay: RelayTarget) {
        self.destination = relay;
    }

    /// Drop the candidate and restore the default destination.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
