//! Control-state and metrics-request bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Start,
    Stop,
}

/// `POST /control/state` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum ControlState {
    Protocol { protocol: ProtocolControl },
    Traffic { traffic: TrafficControl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolControl {
    pub choice: String,
    pub all: StateBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficControl {
    pub choice: String,
    pub flow_transmit: FlowTransmitBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBody {
    pub state: State,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTransmitBody {
    pub state: State,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_names: Vec<String>,
}

impl ControlState {
    pub fn protocols(state: State) -> Self {
        ControlState::Protocol {
            protocol: ProtocolControl {
                choice: "all".to_string(),
                all: StateBody { state },
            },
        }
    }

    /// Transmit state for all flows.
    pub fn traffic(state: State) -> Self {
        ControlState::Traffic {
            traffic: TrafficControl {
                choice: "flow_transmit".to_string(),
                flow_transmit: FlowTransmitBody {
                    state,
                    flow_names: Vec::new(),
                },
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ControlState::Protocol { protocol } => format!("protocols {:?}", protocol.all.state),
            ControlState::Traffic { traffic } => {
                format!("traffic {:?}", traffic.flow_transmit.state)
            }
        }
    }
}

/// Metric families `otgen run` knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Port,
    Flow,
    Bgpv4,
}

/// `POST /monitor/metrics` body: `{"choice": "port", "port": {}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRequest {
    pub kind: MetricKind,
}

impl MetricsRequest {
    pub fn new(kind: MetricKind) -> Self {
        MetricsRequest { kind }
    }
}

impl Serialize for MetricsRequest {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let key = match self.kind {
            MetricKind::Port => "port",
            MetricKind::Flow => "flow",
            MetricKind::Bgpv4 => "bgpv4",
        };
        let mut map = s.serialize_map(Some(2))?;
        map.serialize_entry("choice", key)?;
        map.serialize_entry(key, &serde_json::Map::new())?;
        map.end()
    }
}
