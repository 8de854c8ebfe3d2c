use crate::geometry::PortType;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneDoc {
    pub nodes: Vec<NodeDecl>,
    pub wires: Vec<WireDecl>,
    /// Top-level `@key = value` settings
    pub hints: Vec<Hint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDecl {
    pub name: String,
    /// Display label; the name is shown when absent
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    pub ports: Vec<PortDecl>,
}

impl NodeDecl {
    pub fn port_names(&self, side: PortType) -> Vec<String> {
        self.ports
            .iter()
            .filter(|p| p.side == side)
            .map(|p| p.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortDecl {
    pub side: PortType,
    pub name: String,
}

/// `wire Out.port -> In.port`
#[derive(Debug, Clone, PartialEq)]
pub struct WireDecl {
    pub from_node: String,
    pub from_port: String,
    pub to_node: String,
    pub to_port: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub key: String,
    pub value: HintValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HintValue {
    Num(f64),
    Str(String),
    Ident(String),
}
