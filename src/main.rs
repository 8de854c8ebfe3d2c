use std::env;
use std::fs;
use std::process;
use wirenet::geometry::Point;
use wirenet::loader::build_scene;
use wirenet::parser::Parser;
use wirenet::scene::{PathStyle, RouteStyle};
use wirenet::svg::SvgRenderer;

/// Parse `NODE=DX,DY`.
fn parse_move(arg: &str) -> Option<(String, Point)> {
    let (node, offset) = arg.split_once('=')?;
    let (dx, dy) = offset.split_once(',')?;
    let dx = dx.trim().parse().ok()?;
    let dy = dy.trim().parse().ok()?;
    Some((node.to_string(), Point::new(dx, dy)))
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.wire> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  -o, --output <file>       Output file (default: stdout)");
        eprintln!("  -s, --smooth              Draw connectors as curves");
        eprintln!("  -m, --move <NODE=DX,DY>   Move a node after loading (repeatable)");
        process::exit(1);
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;
    let mut smooth = false;
    let mut moves: Vec<(String, Point)> = Vec::new();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            "-s" | "--smooth" => smooth = true,
            "-m" | "--move" => {
                i += 1;
                if i < args.len() {
                    let step = parse_move(&args[i]).unwrap_or_else(|| {
                        eprintln!("Invalid move: {} (expected NODE=DX,DY)", args[i]);
                        process::exit(1);
                    });
                    moves.push(step);
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let mut parser = match Parser::new(&input) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Lex error: {}", e);
            process::exit(1);
        }
    };

    let doc = match parser.parse() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(1);
        }
    };

    let mut scene = match build_scene(&doc, RouteStyle::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Scene error: {}", e);
            process::exit(1);
        }
    };
    if smooth {
        scene.set_path_style(PathStyle::Smooth);
    }

    for (node, offset) in &moves {
        if let Err(e) = scene.move_node(node, *offset) {
            eprintln!("Move failed: {}", e);
            process::exit(1);
        }
    }

    let svg = SvgRenderer::default().render(&scene);

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &svg) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", svg),
    }
}
