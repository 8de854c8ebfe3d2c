//! Node/port model and interaction layer that drives connector routing.
//!
//! The scene owns every node and connector. Node moves, resizes and
//! attachment changes update the affected connector geometry synchronously,
//! so bounding regions are current as soon as a call returns.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::connector::{
    BendPoints, ConnectorGeometry, DEFAULT_LINE_WIDTH, DEFAULT_TURN_PADDING, PortClearance,
};
use crate::geometry::{Point, PortType, Rect};
use crate::measure::TextMetrics;
use crate::planner::SiblingLayoutPlanner;

/// How connectors are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// Axis-aligned segments through the bend points
    Orthogonal,
    /// Cubic curve through the smooth control points
    Smooth,
}

impl PathStyle {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "orthogonal" => Some(Self::Orthogonal),
            "smooth" => Some(Self::Smooth),
            _ => None,
        }
    }
}

/// Routing and connector drawing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStyle {
    pub turn_padding: f64,
    /// Connector point size, used to inflate bounding regions
    pub point_diameter: f64,
    pub line_width: f64,
    pub path: PathStyle,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            turn_padding: DEFAULT_TURN_PADDING,
            point_diameter: 10.0,
            line_width: DEFAULT_LINE_WIDTH,
            path: PathStyle::Orthogonal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectorId(pub u32);

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),
    #[error("Duplicate node: {0}")]
    DuplicateNode(String),
    #[error("Unknown {side:?} port '{port}' on node {node}")]
    UnknownPort {
        node: String,
        side: PortType,
        port: String,
    },
    #[error("Unknown connector: {0}")]
    UnknownConnector(ConnectorId),
    #[error("Connector {0} has no free end")]
    NotPending(ConnectorId),
    #[error("Connector {0} still has a free end")]
    Pending(ConnectorId),
}

/// A port on a node, by position in the scene's node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRef {
    pub node: usize,
    pub index: usize,
}

/// Connectors attached to each port of a node, in attachment order.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    pub inputs: Vec<Vec<ConnectorId>>,
    pub outputs: Vec<Vec<ConnectorId>>,
}

impl Attachments {
    fn ports_mut(&mut self, side: PortType) -> &mut Vec<Vec<ConnectorId>> {
        match side {
            PortType::In => &mut self.inputs,
            PortType::Out => &mut self.outputs,
        }
    }

    fn all(&self) -> impl Iterator<Item = ConnectorId> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).flatten().copied()
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    attachments: Attachments,
}

impl Node {
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.x, self.y, self.width, self.height)
    }

    pub fn ports(&self, side: PortType) -> &[String] {
        match side {
            PortType::In => &self.inputs,
            PortType::Out => &self.outputs,
        }
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn connections(&self, side: PortType, index: usize) -> &[ConnectorId] {
        let ports = match side {
            PortType::In => &self.attachments.inputs,
            PortType::Out => &self.attachments.outputs,
        };
        ports.get(index).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Clone)]
pub struct Connector {
    pub id: ConnectorId,
    out_port: Option<PortRef>,
    in_port: Option<PortRef>,
    pub geometry: ConnectorGeometry,
}

impl Connector {
    pub fn port(&self, side: PortType) -> Option<PortRef> {
        match side {
            PortType::Out => self.out_port,
            PortType::In => self.in_port,
        }
    }

    fn set_port(&mut self, side: PortType, port: Option<PortRef>) {
        match side {
            PortType::Out => self.out_port = port,
            PortType::In => self.in_port = port,
        }
    }

    /// The side still waiting for a port while the free end is dragged.
    pub fn required_port(&self) -> Option<PortType> {
        match (self.out_port, self.in_port) {
            (None, Some(_)) => Some(PortType::Out),
            (Some(_), None) => Some(PortType::In),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Scene {
    style: RouteStyle,
    metrics: TextMetrics,
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    connectors: BTreeMap<ConnectorId, Connector>,
    next_id: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(RouteStyle::default())
    }
}

impl Scene {
    pub fn new(style: RouteStyle) -> Self {
        Self {
            style,
            metrics: TextMetrics::default(),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            connectors: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn style(&self) -> &RouteStyle {
        &self.style
    }

    /// Switch how connectors are drawn. Routes are unaffected.
    pub fn set_path_style(&mut self, path: PathStyle) {
        self.style.path = path;
    }

    pub fn metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    fn planner(&self) -> SiblingLayoutPlanner {
        SiblingLayoutPlanner::new(self.style.turn_padding)
    }

    fn node_idx(&self, id: &str) -> Result<usize, SceneError> {
        self.node_index
            .get(id)
            .copied()
            .ok_or_else(|| SceneError::UnknownNode(id.to_string()))
    }

    fn port_ref(&self, node: &str, side: PortType, port: &str) -> Result<PortRef, SceneError> {
        let idx = self.node_idx(node)?;
        self.nodes[idx]
            .ports(side)
            .iter()
            .position(|name| name == port)
            .map(|index| PortRef { node: idx, index })
            .ok_or_else(|| SceneError::UnknownPort {
                node: node.to_string(),
                side,
                port: port.to_string(),
            })
    }

    fn connector_mut(&mut self, id: ConnectorId) -> Result<&mut Connector, SceneError> {
        self.connectors
            .get_mut(&id)
            .ok_or(SceneError::UnknownConnector(id))
    }

    /// Add a node sized to fit its label and port names.
    pub fn add_node(
        &mut self,
        id: &str,
        label: &str,
        at: Point,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Result<(), SceneError> {
        if self.node_index.contains_key(id) {
            return Err(SceneError::DuplicateNode(id.to_string()));
        }

        let (width, height) = self.metrics.node_size(label, &inputs, &outputs);
        let attachments = Attachments {
            inputs: vec![Vec::new(); inputs.len()],
            outputs: vec![Vec::new(); outputs.len()],
        };

        self.node_index.insert(id.to_string(), self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            label: label.to_string(),
            x: at.x,
            y: at.y,
            width,
            height,
            inputs,
            outputs,
            attachments,
        });
        Ok(())
    }

    /// Scene position of a port: inputs on the left edge, outputs on the right.
    fn port_position(&self, port: PortRef, side: PortType) -> Point {
        let node = &self.nodes[port.node];
        let y = node.y + self.metrics.port_offset_y(port.index);
        match side {
            PortType::In => Point::new(node.x, y),
            PortType::Out => Point::new(node.x + node.width, y),
        }
    }

    /// Distance from a port to the top and bottom edges of its node.
    fn port_clearance(&self, port: PortRef, side: PortType) -> PortClearance {
        let node = &self.nodes[port.node];
        let pos = self.port_position(port, side);
        PortClearance {
            above: pos.y - node.y,
            below: node.y + node.height - pos.y,
        }
    }

    fn new_connector(&mut self) -> Connector {
        let id = ConnectorId(self.next_id);
        self.next_id += 1;
        Connector {
            id,
            out_port: None,
            in_port: None,
            geometry: ConnectorGeometry::new(self.style.turn_padding)
                .with_line_width(self.style.line_width),
        }
    }

    fn attach(&mut self, connector: &mut Connector, side: PortType, port: PortRef) {
        self.nodes[port.node].attachments.ports_mut(side)[port.index].push(connector.id);
        connector.set_port(side, Some(port));
        let pos = self.port_position(port, side);
        connector.geometry.set_endpoint(side, pos);
    }

    fn detach(&mut self, connector: &Connector) {
        for side in [PortType::In, PortType::Out] {
            if let Some(port) = connector.port(side) {
                self.nodes[port.node].attachments.ports_mut(side)[port.index]
                    .retain(|id| *id != connector.id);
            }
        }
    }

    /// Re-plan every connector attached to `node`: slots on the busier side,
    /// default routing on the other, then reroute them all.
    fn relayout(&mut self, node: usize) {
        let attachments = &self.nodes[node].attachments;
        let mut targets: Vec<ConnectorId> = attachments.all().collect();
        targets.sort();
        targets.dedup();

        let planner = self.planner();
        let plan = planner.plan(&attachments.inputs, &attachments.outputs, &targets);
        for (id, slot) in plan {
            if let Some(connector) = self.connectors.get_mut(&id) {
                if connector.required_port().is_some() {
                    continue;
                }
                planner.apply(&mut connector.geometry, slot);
                connector.geometry.route();
            }
        }
    }

    /// Move both endpoints of every connector attached to `node` to the
    /// current port positions and reroute them.
    fn refresh_attached(&mut self, node: usize) -> Vec<ConnectorId> {
        let mut ids: Vec<ConnectorId> = self.nodes[node].attachments.all().collect();
        ids.sort();
        ids.dedup();

        for id in &ids {
            let Some(mut connector) = self.connectors.remove(id) else {
                continue;
            };
            for side in [PortType::In, PortType::Out] {
                if let Some(port) = connector.port(side) {
                    let pos = self.port_position(port, side);
                    connector.geometry.set_endpoint(side, pos);
                }
            }
            connector.geometry.route();
            self.connectors.insert(*id, connector);
        }
        ids
    }

    /// Connect an output port to an input port.
    pub fn connect(
        &mut self,
        out_node: &str,
        out_port: &str,
        in_node: &str,
        in_port: &str,
    ) -> Result<ConnectorId, SceneError> {
        let out_ref = self.port_ref(out_node, PortType::Out, out_port)?;
        let in_ref = self.port_ref(in_node, PortType::In, in_port)?;

        let mut connector = self.new_connector();
        let id = connector.id;
        self.attach(&mut connector, PortType::Out, out_ref);
        self.attach(&mut connector, PortType::In, in_ref);
        self.connectors.insert(id, connector);

        debug!(%id, out_node, out_port, in_node, in_port, "connected");
        self.relayout(in_ref.node);
        Ok(id)
    }

    pub fn disconnect(&mut self, id: ConnectorId) -> Result<(), SceneError> {
        let connector = self
            .connectors
            .remove(&id)
            .ok_or(SceneError::UnknownConnector(id))?;
        self.detach(&connector);

        debug!(%id, "disconnected");
        if let Some(port) = connector.port(PortType::In) {
            self.relayout(port.node);
        }
        Ok(())
    }

    /// Translate a node and reroute its connectors. Returns the connectors
    /// whose geometry changed.
    pub fn move_node(&mut self, id: &str, offset: Point) -> Result<Vec<ConnectorId>, SceneError> {
        let idx = self.node_idx(id)?;
        let node = &mut self.nodes[idx];
        node.x += offset.x;
        node.y += offset.y;

        let moved = self.refresh_attached(idx);
        debug!(node = id, connectors = moved.len(), "node moved");
        Ok(moved)
    }

    /// Resize a node, keeping it at least as large as the metrics' minimum.
    pub fn resize_node(
        &mut self,
        id: &str,
        width: f64,
        height: f64,
    ) -> Result<Vec<ConnectorId>, SceneError> {
        let idx = self.node_idx(id)?;
        let node = &mut self.nodes[idx];
        node.width = width.max(self.metrics.min_node_width);
        node.height = height.max(self.metrics.min_node_height);

        let moved = self.refresh_attached(idx);
        self.relayout(idx);
        Ok(moved)
    }

    pub fn set_hovered(&mut self, id: ConnectorId, hovered: bool) -> Result<(), SceneError> {
        self.connector_mut(id)?.geometry.set_hovered(hovered);
        Ok(())
    }

    /// Pick a connector; only the selected route updates it until release.
    pub fn press_connector(&mut self, id: ConnectorId) -> Result<(), SceneError> {
        self.connector_mut(id)?.geometry.set_selected(true);
        Ok(())
    }

    /// Drag the middle of a selected connector to `cursor`.
    pub fn drag_connector(
        &mut self,
        id: ConnectorId,
        cursor: Point,
    ) -> Result<BendPoints, SceneError> {
        let connector = self
            .connectors
            .get(&id)
            .ok_or(SceneError::UnknownConnector(id))?;
        let (Some(out_port), Some(in_port)) =
            (connector.port(PortType::Out), connector.port(PortType::In))
        else {
            return Err(SceneError::Pending(id));
        };

        let in_clearance = self.port_clearance(in_port, PortType::In);
        let out_clearance = self.port_clearance(out_port, PortType::Out);
        let connector = self.connector_mut(id)?;
        Ok(connector
            .geometry
            .route_selected(cursor, in_clearance, out_clearance))
    }

    pub fn release_connector(&mut self, id: ConnectorId) -> Result<(), SceneError> {
        self.connector_mut(id)?.geometry.set_selected(false);
        Ok(())
    }

    /// Start a connector from a port; its other end follows the pointer.
    pub fn begin_wire(
        &mut self,
        node: &str,
        side: PortType,
        port: &str,
    ) -> Result<ConnectorId, SceneError> {
        let port_ref = self.port_ref(node, side, port)?;

        let mut connector = self.new_connector();
        let id = connector.id;
        self.attach(&mut connector, side, port_ref);
        let start = connector.geometry.endpoint(side);
        connector.geometry.set_endpoint(side.opposite(), start);
        self.connectors.insert(id, connector);

        debug!(%id, node, port, "wire started");
        Ok(id)
    }

    /// Move the free end of a pending connector by `offset`.
    pub fn drag_wire(&mut self, id: ConnectorId, offset: Point) -> Result<(), SceneError> {
        let connector = self.connector_mut(id)?;
        let side = connector.required_port().ok_or(SceneError::NotPending(id))?;
        connector.geometry.move_endpoint(side, offset);
        connector.geometry.route();
        Ok(())
    }

    /// Attach the free end of a pending connector to `node`'s `port`.
    pub fn drop_wire(&mut self, id: ConnectorId, node: &str, port: &str) -> Result<(), SceneError> {
        let side = self
            .connectors
            .get(&id)
            .ok_or(SceneError::UnknownConnector(id))?
            .required_port()
            .ok_or(SceneError::NotPending(id))?;
        let port_ref = self.port_ref(node, side, port)?;

        let Some(mut connector) = self.connectors.remove(&id) else {
            return Err(SceneError::UnknownConnector(id));
        };
        self.attach(&mut connector, side, port_ref);
        let in_node = connector.port(PortType::In).map(|p| p.node);
        self.connectors.insert(id, connector);

        debug!(%id, node, port, "wire dropped");
        if let Some(in_node) = in_node {
            self.relayout(in_node);
        }
        Ok(())
    }

    /// Discard a pending connector.
    pub fn cancel_wire(&mut self, id: ConnectorId) -> Result<(), SceneError> {
        let connector = self
            .connectors
            .get(&id)
            .ok_or(SceneError::UnknownConnector(id))?;
        if connector.required_port().is_none() {
            return Err(SceneError::NotPending(id));
        }
        if let Some(connector) = self.connectors.remove(&id) {
            self.detach(&connector);
        }
        Ok(())
    }

    /// Topmost connector whose bounding region contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<ConnectorId> {
        self.connectors
            .values()
            .rev()
            .find(|c| c.geometry.bounding_region(self.style.point_diameter).contains(point))
            .map(|c| c.id)
    }

    /// Union of all node rectangles and connector bounding regions.
    pub fn bounds(&self) -> Option<Rect> {
        let nodes = self.nodes.iter().map(Node::bounds);
        let connectors = self
            .connectors
            .values()
            .map(|c| c.geometry.bounding_region(self.style.point_diameter));
        nodes.chain(connectors).reduce(|acc, r| acc.united(&r))
    }
}
