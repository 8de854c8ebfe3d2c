//! Per-connector geometry: endpoints, cached bend points and path construction.

use tracing::trace;

use crate::geometry::{Point, PortType, Rect};

pub const DEFAULT_TURN_PADDING: f64 = 20.0;
pub const DEFAULT_LINE_WIDTH: f64 = 3.0;
/// Ordinal used when a connector has no sibling layout.
pub const DEFAULT_ORDINAL: usize = 1;

/// Upper bound on the smooth-curve handle length.
const MAX_CONTROL_OFFSET: f64 = 99999.0;

/// Corner points of an orthogonal route. A 2-corner route leaves the last two
/// slots at the origin.
pub type BendPoints = [Point; 4];

pub const UNUSED_BEND_POINTS: BendPoints = [Point::ORIGIN; 4];

/// Vertical clearance between a port and the top/bottom edges of its node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortClearance {
    pub above: f64,
    pub below: f64,
}

/// A connector's rank among the connectors sharing the busier side of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingSlot {
    /// 1-based rank
    pub ordinal: usize,
    /// Number of siblings (never zero)
    pub count: usize,
}

impl SiblingSlot {
    pub fn new(ordinal: usize, count: usize) -> Self {
        Self {
            ordinal,
            count: count.max(1),
        }
    }

    /// Width of one lane when the gap between the ports is divided into
    /// `count + 2` lanes.
    pub fn lane_width(&self, source: Point, sink: Point, turn_padding: f64) -> f64 {
        let horizontal_space = ((sink.x - turn_padding) - (source.x + turn_padding)).abs();
        horizontal_space / (self.count.max(1) + 2) as f64
    }

    /// X of this connector's vertical run, counted from the output side.
    pub fn lane_x(&self, source: Point, sink: Point, turn_padding: f64) -> f64 {
        let lane = self.lane_width(source, sink, turn_padding);
        source.x + turn_padding + lane * (self.ordinal + 1) as f64
    }

    /// Lane positions of the previous and next sibling.
    pub fn lane_bounds(&self, source: Point, sink: Point, turn_padding: f64) -> (f64, f64) {
        let lane = self.lane_width(source, sink, turn_padding);
        let start = source.x + turn_padding;
        (
            start + lane * self.ordinal as f64,
            start + lane * (self.ordinal + 2) as f64,
        )
    }

    /// `turn_padding` per rank, compressed so the last sibling stops at the
    /// middle of `gap`.
    pub fn split_space(&self, turn_padding: f64, gap: f64) -> f64 {
        let step = turn_padding.min(gap.abs() / 2.0 / self.count.max(1) as f64);
        step * self.ordinal as f64
    }
}

/// Unselected orthogonal route.
///
/// `previous` is the cached route, if any. In the 2-corner case the vertical
/// run sticks to its previous X unless that X falls outside
/// `[source.x + split_space, sink.x - split_space]`, in which case it snaps to
/// the violated anchor. `lane` further confines the run to the corridor between
/// the neighboring siblings.
pub fn idle_route(
    previous: Option<&BendPoints>,
    source: Point,
    sink: Point,
    split_space: f64,
    lane: Option<(f64, f64)>,
) -> BendPoints {
    if source.x <= sink.x {
        let toward_sink = sink.x - split_space;
        let toward_source = source.x + split_space;

        let mut x = match previous {
            None => toward_sink,
            Some(prev) if toward_sink <= prev[0].x => toward_sink,
            // anchors cross when split_space exceeds half the gap; the input
            // side wins
            Some(prev) if toward_source >= prev[0].x => toward_source.min(toward_sink),
            Some(prev) => prev[0].x,
        };
        if let Some((low, high)) = lane {
            x = x.max(low).min(high);
        }

        [
            Point::new(x, source.y),
            Point::new(x, sink.y),
            Point::ORIGIN,
            Point::ORIGIN,
        ]
    } else {
        let dy = sink.y - source.y;
        let out_x = source.x + split_space;
        let in_x = sink.x - split_space;

        [
            Point::new(out_x, source.y),
            Point::new(out_x, source.y + dy / 2.0),
            Point::new(in_x, sink.y - dy / 2.0),
            Point::new(in_x, sink.y),
        ]
    }
}

/// Geometry of a single connector between an output port (`source`) and an
/// input port (`sink`).
#[derive(Debug, Clone)]
pub struct ConnectorGeometry {
    source: Point,
    sink: Point,
    bend_points: BendPoints,
    routed: bool,
    /// Mode of the cached route, fixed when the cache is written
    four_corner: bool,
    turn_padding: f64,
    line_width: f64,
    hovered: bool,
    selected: bool,
    layout: Option<SiblingSlot>,
}

impl Default for ConnectorGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_PADDING)
    }
}

impl ConnectorGeometry {
    pub fn new(turn_padding: f64) -> Self {
        Self {
            source: Point::ORIGIN,
            sink: Point::ORIGIN,
            bend_points: UNUSED_BEND_POINTS,
            routed: false,
            four_corner: false,
            turn_padding,
            line_width: DEFAULT_LINE_WIDTH,
            hovered: false,
            selected: false,
            layout: None,
        }
    }

    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn endpoint(&self, side: PortType) -> Point {
        match side {
            PortType::Out => self.source,
            PortType::In => self.sink,
        }
    }

    pub fn set_endpoint(&mut self, side: PortType, point: Point) {
        match side {
            PortType::Out => self.source = point,
            PortType::In => self.sink = point,
        }
    }

    pub fn move_endpoint(&mut self, side: PortType, offset: Point) {
        match side {
            PortType::Out => self.source += offset,
            PortType::In => self.sink += offset,
        }
    }

    pub fn source(&self) -> Point {
        self.source
    }

    pub fn sink(&self) -> Point {
        self.sink
    }

    pub fn turn_padding(&self) -> f64 {
        self.turn_padding
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    /// Selection only switches which algorithm may write the cache; the cached
    /// route is left as is in both directions.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn layout(&self) -> Option<SiblingSlot> {
        self.layout
    }

    pub fn set_layout(&mut self, layout: Option<SiblingSlot>) {
        self.layout = layout;
    }

    pub fn bend_points(&self) -> BendPoints {
        self.bend_points
    }

    /// Replace the cache. The route mode follows the endpoints at this moment:
    /// 4-corner when the output sits strictly right of the input.
    pub fn set_bend_points(&mut self, points: BendPoints) {
        self.bend_points = points;
        self.routed = true;
        self.four_corner = self.source.x > self.sink.x;
    }

    /// Whether the cached route uses all four bend points.
    pub fn is_four_corner(&self) -> bool {
        self.routed && self.four_corner
    }

    /// Whether any route has been computed or assigned yet.
    pub fn is_routed(&self) -> bool {
        self.routed
    }

    /// The bend points belonging to the current route, in path order.
    pub fn used_bend_points(&self) -> &[Point] {
        if !self.routed {
            &[]
        } else if self.four_corner {
            &self.bend_points
        } else {
            &self.bend_points[..2]
        }
    }

    /// Handles for the smooth fallback curve from `source` to `sink`.
    pub fn smooth_control_points(&self) -> (Point, Point) {
        let x_distance = self.sink.x - self.source.x;

        let mut horizontal = MAX_CONTROL_OFFSET.min(x_distance.abs());
        let mut vertical = 0.0;
        let mut ratio = 0.5;

        if x_distance <= 0.0 {
            let y_distance = self.sink.y - self.source.y + self.turn_padding;
            let direction = if y_distance < 0.0 { -1.0 } else { 1.0 };
            vertical = MAX_CONTROL_OFFSET.min(y_distance.abs()) * direction;
            ratio = 1.0;
        }
        horizontal *= ratio;

        let mut c1 = Point::new(self.source.x + horizontal, self.source.y + vertical);
        let mut c2 = Point::new(self.sink.x - horizontal, self.sink.y - vertical);

        // Keep the handles outside the orthogonal corridor.
        if self.routed {
            c1.x = c1.x.max(self.bend_points[0].x + self.turn_padding);
            if self.four_corner {
                c2.x = c2.x.min(self.bend_points[3].x - self.turn_padding);
            }
        }

        (c1, c2)
    }

    /// Region that must be repainted or hit-tested for this connector.
    pub fn bounding_region(&self, point_diameter: f64) -> Rect {
        let (c1, c2) = self.smooth_control_points();

        let mut rect = Rect::spanning(self.source, self.sink).united(&Rect::spanning(c1, c2));
        for point in self.used_bend_points() {
            rect.include(*point);
        }

        rect.left -= point_diameter;
        rect.top -= point_diameter;
        rect.right += 2.0 * point_diameter;
        rect.bottom += 2.0 * point_diameter;
        rect
    }

    fn split_space(&self, ordinal: usize) -> f64 {
        let gap = (self.sink.x - self.source.x).abs();
        let split = match self.layout {
            Some(slot) => SiblingSlot { ordinal, ..slot }.split_space(self.turn_padding, gap),
            None => self.turn_padding * ordinal as f64,
        };
        split.min(gap)
    }

    /// Route using the planner-assigned ordinal, or the default one.
    pub fn route(&mut self) -> BendPoints {
        let ordinal = self.layout.map_or(DEFAULT_ORDINAL, |slot| slot.ordinal);
        self.route_idle(ordinal)
    }

    /// Recompute the unselected route. A selected connector keeps its cache.
    pub fn route_idle(&mut self, ordinal: usize) -> BendPoints {
        if self.selected {
            return self.bend_points;
        }

        let split_space = self.split_space(ordinal);
        let tp = self.turn_padding;
        let lane = self
            .layout
            .filter(|_| self.sink.x - self.source.x > 2.0 * tp)
            .map(|slot| SiblingSlot { ordinal, ..slot }.lane_bounds(self.source, self.sink, tp));
        let previous = self.routed.then_some(&self.bend_points);

        let points = idle_route(previous, self.source, self.sink, split_space, lane);
        trace!(
            ordinal,
            split_space,
            four_corner = self.source.x > self.sink.x,
            "idle route"
        );

        self.set_bend_points(points);
        self.bend_points
    }

    /// Recompute the route of a selected connector through `cursor`.
    ///
    /// In the 2-corner case the vertical run follows the cursor X, kept
    /// `turn_padding` away from both ports. In the 4-corner case the
    /// horizontal middle run follows the cursor Y, kept clear of both node
    /// bodies. An unselected connector keeps its cache.
    pub fn route_selected(
        &mut self,
        cursor: Point,
        in_clearance: PortClearance,
        out_clearance: PortClearance,
    ) -> BendPoints {
        if !self.selected {
            return self.bend_points;
        }

        let tp = self.turn_padding;
        let (source, sink) = (self.source, self.sink);

        let points = if source.x <= sink.x {
            let x = (source.x + tp).max(cursor.x.min(sink.x - tp));
            [
                Point::new(x, source.y),
                Point::new(x, sink.y),
                Point::ORIGIN,
                Point::ORIGIN,
            ]
        } else {
            let (low, high) = if source.y >= sink.y {
                (
                    sink.y + in_clearance.below + tp,
                    source.y - out_clearance.above - tp,
                )
            } else {
                (
                    source.y + out_clearance.below + tp,
                    sink.y - in_clearance.above - tp,
                )
            };
            let y = if cursor.y <= low {
                low
            } else if cursor.y >= high {
                high
            } else {
                cursor.y
            };

            let out_x = source.x + tp;
            let in_x = sink.x - tp;
            [
                Point::new(out_x, source.y),
                Point::new(out_x, y),
                Point::new(in_x, y),
                Point::new(in_x, sink.y),
            ]
        };
        trace!(x = cursor.x, y = cursor.y, "selected route");

        self.set_bend_points(points);
        self.bend_points
    }
}
