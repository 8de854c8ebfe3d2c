//! Turn a parsed scene document into a routed [`Scene`].

use crate::ast::{Hint, HintValue, SceneDoc};
use crate::geometry::{Point, PortType};
use crate::scene::{PathStyle, RouteStyle, Scene, SceneError};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("Unknown setting: @{0}")]
    UnknownSetting(String),
    #[error("Invalid value for @{0}")]
    InvalidSetting(String),
}

/// Apply `@route.*` settings on top of `style`.
pub fn apply_hints(style: &mut RouteStyle, hints: &[Hint]) -> Result<(), LoadError> {
    for hint in hints {
        let invalid = || LoadError::InvalidSetting(hint.key.clone());
        match (hint.key.as_str(), &hint.value) {
            ("route.turn_padding", HintValue::Num(n)) if *n >= 0.0 => style.turn_padding = *n,
            ("route.point_diameter", HintValue::Num(n)) if *n >= 0.0 => {
                style.point_diameter = *n
            }
            ("route.line_width", HintValue::Num(n)) if *n > 0.0 => style.line_width = *n,
            ("route.path", HintValue::Ident(s) | HintValue::Str(s)) => {
                style.path = PathStyle::from_str(s).ok_or_else(invalid)?;
            }
            (
                "route.turn_padding" | "route.point_diameter" | "route.line_width" | "route.path",
                _,
            ) => return Err(invalid()),
            (key, _) => return Err(LoadError::UnknownSetting(key.to_string())),
        }
    }
    Ok(())
}

/// Build a scene: settings first, then every node, then every wire in
/// declaration order, so sibling ordinals follow the document.
pub fn build_scene(doc: &SceneDoc, mut style: RouteStyle) -> Result<Scene, LoadError> {
    apply_hints(&mut style, &doc.hints)?;

    let mut scene = Scene::new(style);
    for node in &doc.nodes {
        scene.add_node(
            &node.name,
            node.label.as_deref().unwrap_or(&node.name),
            Point::new(node.x, node.y),
            node.port_names(PortType::In),
            node.port_names(PortType::Out),
        )?;
    }
    for wire in &doc.wires {
        scene.connect(&wire.from_node, &wire.from_port, &wire.to_node, &wire.to_port)?;
    }
    Ok(scene)
}
