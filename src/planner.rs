//! Fan-out planning for connectors that share a node side.

use tracing::debug;

use crate::connector::{BendPoints, ConnectorGeometry, SiblingSlot};
use crate::geometry::{Point, PortType};

/// The side whose connectors are spread apart: the one with more attachments,
/// the output side on a tie.
pub fn busier_side(in_count: usize, out_count: usize) -> PortType {
    if out_count >= in_count {
        PortType::Out
    } else {
        PortType::In
    }
}

/// Collect, in port order then attachment order, the connectors on the busier
/// side of a node. `inputs`/`outputs` hold one list per port.
pub fn collect_siblings<Id: Copy>(
    inputs: &[Vec<Id>],
    outputs: &[Vec<Id>],
) -> (PortType, Vec<Id>) {
    let in_count: usize = inputs.iter().map(Vec::len).sum();
    let out_count: usize = outputs.iter().map(Vec::len).sum();

    let side = busier_side(in_count, out_count);
    let ports = match side {
        PortType::In => inputs,
        PortType::Out => outputs,
    };
    (side, ports.iter().flatten().copied().collect())
}

/// 1-based position of `id` among `siblings`, or 0 when it is not there.
pub fn ordinal_of<Id: PartialEq>(siblings: &[Id], id: &Id) -> usize {
    siblings
        .iter()
        .position(|sibling| sibling == id)
        .map_or(0, |pos| pos + 1)
}

/// Assigns sibling slots and their target routes.
#[derive(Debug, Clone, Copy)]
pub struct SiblingLayoutPlanner {
    pub turn_padding: f64,
}

impl SiblingLayoutPlanner {
    pub fn new(turn_padding: f64) -> Self {
        Self { turn_padding }
    }

    /// Slot of every connector in `targets`, relative to the busier side of
    /// the node. Connectors on the other side get `None`.
    pub fn plan<Id: Copy + PartialEq>(
        &self,
        inputs: &[Vec<Id>],
        outputs: &[Vec<Id>],
        targets: &[Id],
    ) -> Vec<(Id, Option<SiblingSlot>)> {
        let (side, siblings) = collect_siblings(inputs, outputs);
        let count = siblings.len();
        debug!(?side, count, "planning sibling fan-out");

        targets
            .iter()
            .map(|id| match ordinal_of(&siblings, id) {
                0 => (*id, None),
                ordinal => (*id, Some(SiblingSlot::new(ordinal, count))),
            })
            .collect()
    }

    /// Route for `slot`: the gap between the ports is cut into `count + 2`
    /// lanes and the connector takes lane `ordinal + 1`, leaving an empty lane
    /// at each extreme.
    pub fn target_bend_points(&self, source: Point, sink: Point, slot: SiblingSlot) -> BendPoints {
        let tp = self.turn_padding;
        let offset = tp + slot.lane_width(source, sink, tp) * (slot.ordinal + 1) as f64;

        if source.x <= sink.x {
            let x = source.x + offset;
            [
                Point::new(x, source.y),
                Point::new(x, sink.y),
                Point::ORIGIN,
                Point::ORIGIN,
            ]
        } else {
            let mid_y = source.y + (sink.y - source.y) / 2.0;
            let out_x = source.x + offset;
            let in_x = sink.x - offset;
            [
                Point::new(out_x, source.y),
                Point::new(out_x, mid_y),
                Point::new(in_x, mid_y),
                Point::new(in_x, sink.y),
            ]
        }
    }

    /// Write `slot` and its target route into `geometry`. Without a slot the
    /// connector falls back to default routing and keeps its cache, as does a
    /// selected connector.
    pub fn apply(&self, geometry: &mut ConnectorGeometry, slot: Option<SiblingSlot>) {
        geometry.set_layout(slot);
        if let Some(slot) = slot.filter(|_| !geometry.selected()) {
            let points = self.target_bend_points(geometry.source(), geometry.sink(), slot);
            geometry.set_bend_points(points);
        }
    }
}
