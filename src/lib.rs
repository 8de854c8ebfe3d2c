pub mod ast;
pub mod connector;
pub mod geometry;
pub mod lexer;
pub mod loader;
pub mod measure;
pub mod parser;
pub mod planner;
pub mod scene;
pub mod svg;

#[cfg(test)]
mod route_proptest;

use wasm_bindgen::prelude::*;

use loader::build_scene;
use parser::Parser;
use scene::{PathStyle, RouteStyle};
use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render a wire scene to SVG. `smooth` forces curved connectors regardless
/// of the document's `@route.path` setting.
#[wasm_bindgen(js_name = "sceneToSvg")]
pub fn render_scene(source: &str, smooth: Option<bool>) -> Result<String, String> {
    let mut parser = Parser::new(source).map_err(|e| e.to_string())?;
    let doc = parser.parse().map_err(|e| e.to_string())?;

    let mut scene = build_scene(&doc, RouteStyle::default()).map_err(|e| e.to_string())?;
    if smooth == Some(true) {
        scene.set_path_style(PathStyle::Smooth);
    }
    Ok(SvgRenderer::default().render(&scene))
}
