//! Wire payloads for the hub's command endpoints.
//!
//! The read endpoints deserialize directly into the domain node types
//! (their serde renames match the JSON contract); only the pair command
//! needs its own request shape.

use serde::Serialize;

use meshpair_domain::node::AvailableNode;
use meshpair_domain::relay::RelayTarget;

/// Body of `POST /api/commands/pair`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRequest<'a> {
    pub node_to_pair: &'a AvailableNode,
    /// `"hub"` or a coordinator MAC.
    pub destination: &'a RelayTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshpair_domain::node::NodeKind;

    #[test]
    fn should_serialize_pair_request_to_wire_shape() {
        let node = AvailableNode {
            mac: "AA:BB:CC:DD:EE:01".parse().unwrap(),
            kind: NodeKind::Sensor,
        };
        let relay: RelayTarget = "BB:BB:CC:DD:EE:10".parse().unwrap();
        let request = PairRequest {
            node_to_pair: &node,
            destination: &relay,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "nodeToPair": {"mac": "AA:BB:CC:DD:EE:01", "type": "sensor"},
                "destination": "BB:BB:CC:DD:EE:10",
            })
        );
    }

    #[test]
    fn should_serialize_hub_destination_as_sentinel() {
        let node = AvailableNode {
            mac: "AA:BB:CC:DD:EE:02".parse().unwrap(),
            kind: NodeKind::Coordinator,
        };
        let request = PairRequest {
            node_to_pair: &node,
            destination: &RelayTarget::Hub,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["destination"], "hub");
    }
}
