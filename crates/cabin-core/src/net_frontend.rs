use fundsp::net::{Net, NodeId};
use fundsp::prelude::AudioUnit;
use fundsp::realnet::NetBackend;

/// One end of an audio connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Global input of the graph (the decoded stream channel).
    Input(usize),
    /// Port of a node inside the graph.
    Node(NodeId, usize),
    /// Global output of the graph (the sink channel).
    Output(usize),
}

impl Endpoint {
    fn touches(&self, node: NodeId) -> bool {
        matches!(self, Endpoint::Node(id, _) if *id == node)
    }
}

/// Audio connection between two endpoints in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
}

/// Control-side view of the processing graph.
///
/// Wraps a fundsp [`Net`] and keeps a ledger of every audio connection so that
/// rewiring can be made idempotent and inspected. An input port has at most one
/// source; connecting a new source to an occupied port replaces the old entry.
pub struct CabinNet {
    net: Net,

    /// Audio connections (source → dest)
    connections: Vec<Connection>,
}

impl CabinNet {
    pub fn with_io(inputs: usize, outputs: usize) -> (Self, NetBackend) {
        let mut net = Net::new(inputs, outputs);
        let backend = net.backend();
        (
            Self {
                net,
                connections: Vec::new(),
            },
            backend,
        )
    }

    pub fn add(&mut self, unit: Box<dyn AudioUnit>) -> NodeId {
        self.net.push(unit)
    }

    /// Connect `from_port` of `from` to `to_port` of `to`.
    ///
    /// Returns `false` when the exact connection already exists.
    pub fn connect_ports(
        &mut self,
        from: NodeId,
        from_port: usize,
        to: NodeId,
        to_port: usize,
    ) -> bool {
        let connection = Connection {
            from: Endpoint::Node(from, from_port),
            to: Endpoint::Node(to, to_port),
        };
        if !self.record(connection) {
            return false;
        }
        self.net.connect(from, from_port, to, to_port);
        true
    }

    /// Feed a global input channel into a node port.
    pub fn connect_input(&mut self, input: usize, to: NodeId, to_port: usize) -> bool {
        let connection = Connection {
            from: Endpoint::Input(input),
            to: Endpoint::Node(to, to_port),
        };
        if !self.record(connection) {
            return false;
        }
        self.net.connect_input(input, to, to_port);
        true
    }

    /// Route a node port to a global output channel.
    pub fn connect_output(&mut self, from: NodeId, from_port: usize, output: usize) -> bool {
        let connection = Connection {
            from: Endpoint::Node(from, from_port),
            to: Endpoint::Output(output),
        };
        if !self.record(connection) {
            return false;
        }
        self.net.connect_output(from, from_port, output);
        true
    }

    /// Remove a node. Every connection touching it is dropped.
    pub fn remove(&mut self, node: NodeId) -> Box<dyn AudioUnit> {
        self.connections
            .retain(|c| !c.from.touches(node) && !c.to.touches(node));
        self.net.remove(node)
    }

    pub fn commit(&mut self) {
        if self.net.has_backend() {
            self.net.commit();
        }
    }

    pub fn has_backend(&self) -> bool {
        self.net.has_backend()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections leaving `node`, in insertion order.
    pub fn connections_from(&self, node: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from.touches(node))
    }

    /// Connections entering `node`, in insertion order.
    pub fn connections_into(&self, node: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.to.touches(node))
    }

    pub fn inputs(&self) -> usize {
        self.net.inputs()
    }

    pub fn outputs(&self) -> usize {
        self.net.outputs()
    }

    pub fn size(&self) -> usize {
        self.net.size()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.net.contains(node)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.net.set_sample_rate(sample_rate);
    }

    /// Whether fundsp flagged the last edit as invalid (e.g. a cycle).
    pub fn has_error(&mut self) -> bool {
        self.net.error().is_some()
    }

    fn record(&mut self, connection: Connection) -> bool {
        if self.connections.contains(&connection) {
            return false;
        }
        self.connections.retain(|c| c.to != connection.to);
        self.connections.push(connection);
        true
    }
}
