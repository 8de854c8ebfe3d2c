use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone)]
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub port_gap: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_x: 12.0,
            padding_y: 8.0,
            header_padding: 4.0,
            port_gap: 24.0,
            min_node_width: 100.0,
            min_node_height: 60.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    pub fn header_height(&self) -> f64 {
        self.line_height + self.header_padding * 2.0
    }

    /// Offset from the node's top edge to the center of port row `index`.
    pub fn port_offset_y(&self, index: usize) -> f64 {
        self.header_height() + self.padding_y + self.line_height * (index as f64 + 0.5)
    }

    /// Size of a node showing `label` with input labels on the left and output
    /// labels on the right, one port per row.
    pub fn node_size(&self, label: &str, inputs: &[String], outputs: &[String]) -> (f64, f64) {
        let header_width = self.text_width(label);

        let widest = |ports: &[String]| {
            ports
                .iter()
                .map(|name| self.text_width(name))
                .fold(0.0, f64::max)
        };
        let body_width = widest(inputs) + widest(outputs) + self.port_gap;

        let content_width = header_width.max(body_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_node_width);

        let rows = inputs.len().max(outputs.len());
        let body_height = if rows == 0 {
            0.0
        } else {
            rows as f64 * self.line_height + self.padding_y * 2.0
        };

        let height = (self.header_height() + body_height).max(self.min_node_height);

        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        let m = TextMetrics::default();
        assert_eq!(m.text_width("Blur"), 4.0 * 8.0);
    }

    #[test]
    fn test_unicode_width() {
        let m = TextMetrics::default();
        // full-width characters count double
        assert_eq!(m.text_width("ノード"), 6.0 * 8.0);
    }

    #[test]
    fn test_node_size_no_ports() {
        let m = TextMetrics::default();
        let (w, h) = m.node_size("Blur", &[], &[]);
        assert_eq!(w, m.min_node_width);
        assert_eq!(h, m.min_node_height);
    }

    #[test]
    fn test_node_size_grows_with_ports() {
        let m = TextMetrics::default();
        let inputs = vec!["image".to_string(), "radius".to_string()];
        let outputs = vec!["result".to_string()];
        let (_, small) = m.node_size("Blur", &inputs[..1], &outputs);
        let (w, h) = m.node_size("Blur", &inputs, &outputs);
        assert!(w >= m.min_node_width);
        assert!(h > small);
        // last row must sit inside the node
        assert!(m.port_offset_y(1) < h);
    }

    #[test]
    fn test_long_port_names_widen_node() {
        let m = TextMetrics::default();
        let inputs = vec!["a_very_long_input_name".to_string()];
        let outputs = vec!["another_long_output".to_string()];
        let (w, _) = m.node_size("N", &inputs, &outputs);
        assert!(w > m.text_width("a_very_long_input_name") + m.text_width("another_long_output"));
    }
}
