//! Property-based tests for connector routing using proptest.
//!
//! These tests verify that:
//! 1. The route shape follows the relative X of the two ports
//! 2. A dragged 4-corner route stays clear of both node bodies
//! 3. Idle routing is idempotent
//! 4. The bounding region covers everything that is drawn
//! 5. Siblings get distinct vertical runs

use proptest::prelude::*;

use crate::connector::{
    idle_route, BendPoints, ConnectorGeometry, PortClearance, SiblingSlot, DEFAULT_TURN_PADDING,
};
use crate::geometry::{Point, PortType};

const EPSILON: f64 = 1e-9;

fn coord() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1000i32..1000).prop_map(|x| x as f64),
        (-4000i32..4000).prop_map(|x| x as f64 / 4.0),
    ]
}

fn point() -> impl Strategy<Value = Point> {
    (coord(), coord()).prop_map(|(x, y)| Point::new(x, y))
}

fn clearance() -> impl Strategy<Value = PortClearance> {
    (0i32..200, 0i32..200).prop_map(|(above, below)| PortClearance {
        above: above as f64,
        below: below as f64,
    })
}

fn slot() -> impl Strategy<Value = Option<SiblingSlot>> {
    prop_oneof![
        Just(None),
        (1usize..8)
            .prop_flat_map(|count| (1..=count, Just(count)))
            .prop_map(|(ordinal, count)| Some(SiblingSlot::new(ordinal, count))),
    ]
}

fn two_corner(x: f64, source: Point, sink: Point) -> BendPoints {
    [
        Point::new(x, source.y),
        Point::new(x, sink.y),
        Point::ORIGIN,
        Point::ORIGIN,
    ]
}

fn geometry(source: Point, sink: Point) -> ConnectorGeometry {
    let mut g = ConnectorGeometry::default();
    g.set_endpoint(PortType::Out, source);
    g.set_endpoint(PortType::In, sink);
    g
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn route_shape_follows_port_order(source in point(), sink in point(), ordinal in 1usize..6) {
        let split = (DEFAULT_TURN_PADDING * ordinal as f64).min((sink.x - source.x).abs());
        let points = idle_route(None, source, sink, split, None);

        if source.x <= sink.x {
            prop_assert_eq!(points[2], Point::ORIGIN);
            prop_assert_eq!(points[3], Point::ORIGIN);
            prop_assert_eq!(points[0].x, points[1].x);
            prop_assert_eq!(points[0].y, source.y);
            prop_assert_eq!(points[1].y, sink.y);
            prop_assert!(points[0].x >= source.x - EPSILON);
            prop_assert!(points[0].x <= sink.x + EPSILON);
        } else {
            prop_assert_eq!(points[0], Point::new(source.x + split, source.y));
            prop_assert_eq!(points[3], Point::new(sink.x - split, sink.y));
            prop_assert_eq!(points[1].x, points[0].x);
            prop_assert_eq!(points[2].x, points[3].x);
            prop_assert_eq!(points[1].y, points[2].y);
        }
    }

    #[test]
    fn dragged_four_corner_route_clears_nodes(
        source in point(),
        sink in point(),
        cursor in point(),
        in_clearance in clearance(),
        out_clearance in clearance(),
    ) {
        prop_assume!(source.x > sink.x);
        let mut g = geometry(source, sink);
        g.set_selected(true);
        let points = g.route_selected(cursor, in_clearance, out_clearance);

        let tp = g.turn_padding();
        let (low, high) = if source.y >= sink.y {
            (sink.y + in_clearance.below + tp, source.y - out_clearance.above - tp)
        } else {
            (source.y + out_clearance.below + tp, sink.y - in_clearance.above - tp)
        };
        prop_assume!(low <= high);

        prop_assert!(points[1].y >= low && points[1].y <= high);
        prop_assert_eq!(points[1].y, points[2].y);
        prop_assert_eq!(points[0], Point::new(source.x + tp, source.y));
        prop_assert_eq!(points[3], Point::new(sink.x - tp, sink.y));
    }

    #[test]
    fn idle_route_is_idempotent(
        source in point(),
        sink in point(),
        previous_x in coord(),
        ordinal in 1usize..6,
        layout in slot(),
    ) {
        let mut g = geometry(source, sink);
        g.set_layout(layout);
        g.set_bend_points(two_corner(previous_x, source, sink));

        let first = g.route_idle(ordinal);
        let second = g.route_idle(ordinal);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn bounding_region_covers_route(
        source in point(),
        sink in point(),
        diameter in 0i32..20,
        routed in any::<bool>(),
    ) {
        let diameter = diameter as f64;
        let mut g = geometry(source, sink);
        if routed {
            g.route();
        }

        let rect = g.bounding_region(diameter);
        let (c1, c2) = g.smooth_control_points();
        for p in [source, sink, c1, c2] {
            prop_assert!(rect.contains(Point::new(p.x - diameter, p.y - diameter)));
            prop_assert!(rect.contains(Point::new(p.x + diameter, p.y + diameter)));
        }
        for p in g.used_bend_points() {
            prop_assert!(rect.contains(*p));
        }
    }

    #[test]
    fn siblings_get_distinct_runs(
        gap in 1i32..40,
        count in 2usize..7,
        source in point(),
    ) {
        // gap at most twice the padding: no lane clamp, split spacing alone
        // separates the runs
        let sink = Point::new(source.x + gap as f64, source.y + 100.0);
        let xs: Vec<f64> = (1..=count)
            .map(|ordinal| {
                let mut g = geometry(source, sink);
                g.set_layout(Some(SiblingSlot::new(ordinal, count)));
                g.route()[0].x
            })
            .collect();

        for pair in xs.windows(2) {
            prop_assert!(pair[0] > pair[1], "{:?}", xs);
        }
        for x in &xs {
            prop_assert!(*x >= source.x - EPSILON && *x <= sink.x + EPSILON);
        }
    }

    #[test]
    fn sibling_split_stays_within_half_gap(gap in 1i32..2000, count in 1usize..10) {
        let gap = gap as f64;
        let splits: Vec<f64> = (1..=count)
            .map(|ordinal| SiblingSlot::new(ordinal, count).split_space(DEFAULT_TURN_PADDING, gap))
            .collect();
        for pair in splits.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        prop_assert!(splits[count - 1] <= gap / 2.0 + EPSILON);
    }
}
