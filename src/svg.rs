use crate::connector::ConnectorGeometry;
use crate::geometry::Rect;
use crate::measure::TextMetrics;
use crate::scene::{Node, PathStyle, Scene};
use std::fmt::Write;

/// Margin around the scene bounds.
const CANVAS_MARGIN: f64 = 20.0;

pub struct SvgRenderer {
    metrics: TextMetrics,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
        }
    }
}

impl SvgRenderer {
    pub fn render(&self, scene: &Scene) -> String {
        let mut svg = String::new();

        let bounds = scene
            .bounds()
            .unwrap_or(Rect::from_origin_size(0.0, 0.0, 0.0, 0.0));
        let x = bounds.left - CANVAS_MARGIN;
        let y = bounds.top - CANVAS_MARGIN;
        let width = bounds.width() + CANVAS_MARGIN * 2.0;
        let height = bounds.height() + CANVAS_MARGIN * 2.0;

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}">"#,
            width, height, x, y, width, height
        )
        .unwrap();

        // Style
        writeln!(
            &mut svg,
            r#"<style>
  .node-bg {{ fill: #fff; }}
  .node-header {{ fill: #e0e0e0; }}
  .node-border {{ fill: none; stroke: #333; stroke-width: 1.5; }}
  .node-label {{ font-family: monospace; font-size: 14px; font-weight: bold; }}
  .port-label {{ font-family: monospace; font-size: 12px; }}
  .port {{ fill: #666; }}
  .wire {{ stroke: #666; fill: none; }}
  .wire.hovered {{ stroke: #2a7ae2; }}
  .wire.selected {{ stroke: #e2862a; }}
</style>"#
        )
        .unwrap();

        // Connectors first (behind nodes)
        for connector in scene.connectors() {
            self.render_connector(
                &mut svg,
                &connector.geometry,
                scene.style().path,
                scene.style().point_diameter,
            );
        }

        for node in scene.nodes() {
            self.render_node(&mut svg, node);
        }

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    fn render_node(&self, svg: &mut String, node: &Node) {
        let x = node.x;
        let y = node.y;
        let w = node.width;
        let header_h = self.metrics.header_height();

        writeln!(
            svg,
            r#"<rect class="node-bg" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            x, y, w, node.height
        )
        .unwrap();

        writeln!(
            svg,
            r#"<rect class="node-header" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            x, y, w, header_h
        )
        .unwrap();

        writeln!(
            svg,
            r#"<text class="node-label" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            x + w / 2.0,
            y + header_h / 2.0 + 5.0,
            escape_xml(&node.label)
        )
        .unwrap();

        let radius = 4.0;
        for (i, name) in node.inputs.iter().enumerate() {
            let py = y + self.metrics.port_offset_y(i);
            writeln!(
                svg,
                r#"<circle class="port" cx="{}" cy="{}" r="{}" />"#,
                x, py, radius
            )
            .unwrap();
            writeln!(
                svg,
                r#"<text class="port-label" x="{}" y="{}">{}</text>"#,
                x + self.metrics.padding_x,
                py + 4.0,
                escape_xml(name)
            )
            .unwrap();
        }
        for (i, name) in node.outputs.iter().enumerate() {
            let py = y + self.metrics.port_offset_y(i);
            writeln!(
                svg,
                r#"<circle class="port" cx="{}" cy="{}" r="{}" />"#,
                x + w,
                py,
                radius
            )
            .unwrap();
            writeln!(
                svg,
                r#"<text class="port-label" x="{}" y="{}" text-anchor="end">{}</text>"#,
                x + w - self.metrics.padding_x,
                py + 4.0,
                escape_xml(name)
            )
            .unwrap();
        }

        // Border last so it sits on top
        writeln!(
            svg,
            r#"<rect class="node-border" x="{}" y="{}" width="{}" height="{}" rx="4" />"#,
            x, y, w, node.height
        )
        .unwrap();
    }

    fn render_connector(
        &self,
        svg: &mut String,
        geometry: &ConnectorGeometry,
        style: PathStyle,
        point_diameter: f64,
    ) {
        let mut class = "wire".to_string();
        if geometry.hovered() {
            class.push_str(" hovered");
        }
        if geometry.selected() {
            class.push_str(" selected");
        }

        writeln!(
            svg,
            r#"<path class="{}" stroke-width="{}" d="{}" />"#,
            class,
            geometry.line_width(),
            path_data(geometry, style)
        )
        .unwrap();

        // endpoint dots
        for p in [geometry.source(), geometry.sink()] {
            writeln!(
                svg,
                r#"<circle class="port" cx="{}" cy="{}" r="{}" />"#,
                p.x,
                p.y,
                point_diameter / 2.0
            )
            .unwrap();
        }
    }
}

/// SVG path commands for a connector.
pub fn path_data(geometry: &ConnectorGeometry, style: PathStyle) -> String {
    let source = geometry.source();
    let sink = geometry.sink();
    let mut d = format!("M {} {}", source.x, source.y);

    match style {
        PathStyle::Smooth => {
            let (c1, c2) = geometry.smooth_control_points();
            write!(d, " C {} {} {} {} {} {}", c1.x, c1.y, c2.x, c2.y, sink.x, sink.y).unwrap();
        }
        PathStyle::Orthogonal => {
            let corners = geometry.used_bend_points().iter().copied();
            for p in corners.chain(std::iter::once(sink)) {
                write!(d, " L {} {}", p.x, p.y).unwrap();
            }
        }
    }
    d
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, PortType};
    use crate::loader::build_scene;
    use crate::parser::Parser;
    use crate::scene::RouteStyle;

    fn scene(input: &str, style: RouteStyle) -> Scene {
        let doc = Parser::new(input).unwrap().parse().unwrap();
        build_scene(&doc, style).unwrap()
    }

    const PIPELINE: &str = r#"
        node Load "Load <image>" at 0, 0 { out image }
        node Blur at 300, 80 { in image out result }
        wire Load.image -> Blur.image
    "#;

    #[test]
    fn test_render_basic() {
        let svg = SvgRenderer::default().render(&scene(PIPELINE, RouteStyle::default()));

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Load &lt;image&gt;"));
        assert!(svg.contains(r#"class="wire""#));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_render_empty_scene() {
        let svg = SvgRenderer::default().render(&Scene::default());
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_orthogonal_path_goes_through_bend_points() {
        let mut geometry = ConnectorGeometry::default();
        geometry.set_endpoint(PortType::Out, Point::new(0.0, 0.0));
        geometry.set_endpoint(PortType::In, Point::new(100.0, 50.0));
        geometry.route_idle(1);
        assert_eq!(
            path_data(&geometry, PathStyle::Orthogonal),
            "M 0 0 L 80 0 L 80 50 L 100 50"
        );
    }

    #[test]
    fn test_orthogonal_path_keeps_corners_at_origin() {
        let mut geometry = ConnectorGeometry::default();
        geometry.set_endpoint(PortType::Out, Point::new(100.0, 0.0));
        geometry.set_endpoint(PortType::In, Point::new(20.0, 0.0));
        geometry.route_idle(1);
        assert_eq!(
            path_data(&geometry, PathStyle::Orthogonal),
            "M 100 0 L 120 0 L 120 0 L 0 0 L 0 0 L 20 0"
        );
    }

    #[test]
    fn test_smooth_path_uses_control_points() {
        let mut geometry = ConnectorGeometry::default();
        geometry.set_endpoint(PortType::Out, Point::new(0.0, 0.0));
        geometry.set_endpoint(PortType::In, Point::new(100.0, 50.0));
        assert_eq!(
            path_data(&geometry, PathStyle::Smooth),
            "M 0 0 C 50 0 50 50 100 50"
        );
    }

    #[test]
    fn test_render_selected_and_hovered() {
        let mut scene = scene(PIPELINE, RouteStyle::default());
        let id = scene.connectors().next().unwrap().id;
        scene.press_connector(id).unwrap();
        scene.set_hovered(id, true).unwrap();
        let svg = SvgRenderer::default().render(&scene);
        assert!(svg.contains(r#"class="wire hovered selected""#));
        assert!(svg.contains(r#"stroke-width="3""#));
    }

    #[test]
    fn test_render_smooth_style() {
        let style = RouteStyle {
            path: PathStyle::Smooth,
            ..RouteStyle::default()
        };
        let svg = SvgRenderer::default().render(&scene(PIPELINE, style));
        assert!(svg.contains(" C "));
    }
}
