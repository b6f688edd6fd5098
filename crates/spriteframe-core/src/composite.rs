//! Pixel-art compositor graph.
//!
//! The graph is plain data: nodes with typed parameters and links between
//! numbered sockets. A [`Compositor`] host turns it into real compositor
//! nodes, replacing whatever graph was there before.
//!
//! ```text
//! Render Layers -> Blur -> Scale(1/px) -> Pixelate -> Scale(px) -> Separate HSV
//!     H, S ------------------------------------------------> Combine HSV -> Viewer
//!     V -> Multiply(palette) -> Round -> Divide(palette) ---> Combine HSV -> Composite
//!     A -> Round(clamped) -----------------------------------> Combine HSV
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PixelArtSettings;
use crate::error::{CoreError, CoreResult};
use crate::host::Compositor;

/// Name and label of the pixel size input node.
pub const PIXEL_SIZE_NODE: &str = "Pixel Size";

/// Name and label of the palette size input node.
pub const COLOR_PALETTE_SIZE_NODE: &str = "Color Palette Size";

/// Message shown before the graph is replaced.
pub const CONFIRM_MESSAGE: &str = "Delete all composite nodes? This clears every node in the compositor.";

/// Index of a node within a [`CompositeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Blur filter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurFilter {
    Gauss,
}

/// Coordinate space of a scale node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSpace {
    Relative,
}

/// Color model for separate/combine nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Hsv,
}

/// Math node operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOperation {
    Multiply,
    Divide,
    Round,
}

/// Node type plus its type-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    RenderLayers,
    Blur { filter: BlurFilter, size: [u32; 2] },
    Scale { space: ScaleSpace },
    Pixelate,
    SeparateColor { mode: ColorMode },
    Math { operation: MathOperation, use_clamp: bool },
    CombineColor { mode: ColorMode },
    Viewer,
    Composite,
    Value { value: f64 },
}

impl NodeKind {
    /// Blender compositor node type identifier.
    pub fn blender_type(&self) -> &'static str {
        match self {
            NodeKind::RenderLayers => "CompositorNodeRLayers",
            NodeKind::Blur { .. } => "CompositorNodeBlur",
            NodeKind::Scale { .. } => "CompositorNodeScale",
            NodeKind::Pixelate => "CompositorNodePixelate",
            NodeKind::SeparateColor { .. } => "CompositorNodeSeparateColor",
            NodeKind::Math { .. } => "CompositorNodeMath",
            NodeKind::CombineColor { .. } => "CompositorNodeCombineColor",
            NodeKind::Viewer => "CompositorNodeViewer",
            NodeKind::Composite => "CompositorNodeComposite",
            NodeKind::Value { .. } => "CompositorNodeValue",
        }
    }
}

/// Unlinked input socket with a fixed default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputDefault {
    pub socket: usize,
    pub value: f64,
}

/// A compositor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeNode {
    /// Unique node name, if the graph sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Node type and parameters.
    pub kind: NodeKind,
    /// Editor location.
    pub location: [f64; 2],
    /// Fixed input values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputDefault>,
}

/// A link from an output socket to an input socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLink {
    pub from: NodeId,
    pub from_socket: usize,
    pub to: NodeId,
    pub to_socket: usize,
}

/// A complete compositor node graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeGraph {
    pub nodes: Vec<CompositeNode>,
    pub links: Vec<NodeLink>,
}

impl CompositeGraph {
    /// Adds a node and returns its id.
    pub fn add(&mut self, kind: NodeKind, location: [f64; 2]) -> NodeId {
        self.nodes.push(CompositeNode {
            name: None,
            label: None,
            kind,
            location,
            inputs: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Adds a value node with matching name and label.
    pub fn add_named_value(&mut self, name: &str, value: f64, location: [f64; 2]) -> NodeId {
        let id = self.add(NodeKind::Value { value }, location);
        let node = &mut self.nodes[id.0];
        node.name = Some(name.to_string());
        node.label = Some(name.to_string());
        id
    }

    /// Sets a fixed value on an input socket.
    pub fn set_input(&mut self, node: NodeId, socket: usize, value: f64) {
        if let Some(node) = self.nodes.get_mut(node.0) {
            node.inputs.push(InputDefault { socket, value });
        }
    }

    /// Links `from`'s output socket to `to`'s input socket.
    pub fn link(&mut self, from: NodeId, from_socket: usize, to: NodeId, to_socket: usize) {
        self.links.push(NodeLink {
            from,
            from_socket,
            to,
            to_socket,
        });
    }

    /// Looks up a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<(NodeId, &CompositeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(i, n)| (NodeId(i), n))
    }

    /// Links that feed into `node`.
    pub fn inputs_of(&self, node: NodeId) -> impl Iterator<Item = &NodeLink> {
        self.links.iter().filter(move |l| l.to == node)
    }

    /// Checks every link references an existing node and no input socket
    /// is fed twice.
    pub fn validate(&self) -> CoreResult<()> {
        let mut fed = std::collections::BTreeSet::new();
        for link in &self.links {
            for id in [link.from, link.to] {
                if id.0 >= self.nodes.len() {
                    return Err(CoreError::InvalidGraph {
                        message: format!("link references missing node {}", id.0),
                    });
                }
            }
            if !fed.insert((link.to, link.to_socket)) {
                return Err(CoreError::InvalidGraph {
                    message: format!(
                        "input {} of node {} is linked twice",
                        link.to_socket, link.to.0
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Builds the pixelate and posterize pipeline.
pub fn pixel_art_graph(settings: &PixelArtSettings) -> CompositeGraph {
    let mut g = CompositeGraph::default();

    let render = g.add(NodeKind::RenderLayers, [0.0, 0.0]);
    let blur = g.add(
        NodeKind::Blur {
            filter: BlurFilter::Gauss,
            size: [1, 1],
        },
        [200.0, 0.0],
    );
    g.link(render, 0, blur, 0);

    let scale_down = g.add(
        NodeKind::Scale {
            space: ScaleSpace::Relative,
        },
        [400.0, 0.0],
    );
    g.link(blur, 0, scale_down, 0);

    let pixelate = g.add(NodeKind::Pixelate, [600.0, 0.0]);
    g.link(scale_down, 0, pixelate, 0);

    let scale_up = g.add(
        NodeKind::Scale {
            space: ScaleSpace::Relative,
        },
        [800.0, 0.0],
    );
    g.link(pixelate, 0, scale_up, 0);

    let separate = g.add(
        NodeKind::SeparateColor {
            mode: ColorMode::Hsv,
        },
        [1000.0, 0.0],
    );
    g.link(scale_up, 0, separate, 0);

    // Value channel: round(v * palette) / palette.
    let multiply = g.add(math(MathOperation::Multiply, false), [1200.0, -100.0]);
    g.link(separate, 2, multiply, 0);
    let round = g.add(math(MathOperation::Round, false), [1400.0, -100.0]);
    g.link(multiply, 0, round, 0);
    let divide = g.add(math(MathOperation::Divide, false), [1600.0, -100.0]);
    g.link(round, 0, divide, 0);

    let combine = g.add(
        NodeKind::CombineColor {
            mode: ColorMode::Hsv,
        },
        [1800.0, 0.0],
    );
    g.link(divide, 0, combine, 2);
    g.link(separate, 0, combine, 0);
    g.link(separate, 1, combine, 1);

    let viewer = g.add(NodeKind::Viewer, [2000.0, 0.0]);
    g.link(combine, 0, viewer, 0);
    let composite = g.add(NodeKind::Composite, [2000.0, 100.0]);
    g.link(combine, 0, composite, 0);

    let pixel_size = g.add_named_value(PIXEL_SIZE_NODE, settings.pixel_size, [0.0, -300.0]);
    let inverse = g.add(math(MathOperation::Divide, false), [300.0, -200.0]);
    g.set_input(inverse, 0, 1.0);
    g.link(pixel_size, 0, inverse, 1);
    g.link(inverse, 0, scale_down, 1);
    g.link(inverse, 0, scale_down, 2);
    g.link(pixel_size, 0, scale_up, 1);
    g.link(pixel_size, 0, scale_up, 2);

    let palette = g.add_named_value(
        COLOR_PALETTE_SIZE_NODE,
        settings.color_palette_size,
        [1000.0, -400.0],
    );
    g.link(palette, 0, multiply, 1);
    g.link(palette, 0, divide, 1);

    // Alpha channel: clamped round.
    let alpha = g.add(math(MathOperation::Round, true), [1200.0, -400.0]);
    g.link(separate, 3, alpha, 0);
    g.link(alpha, 0, combine, 3);

    g
}

fn math(operation: MathOperation, use_clamp: bool) -> NodeKind {
    NodeKind::Math {
        operation,
        use_clamp,
    }
}

/// Replaces the compositor graph with the pixel-art pipeline.
pub fn generate_composite_nodes<C: Compositor>(
    compositor: &mut C,
    settings: &PixelArtSettings,
) -> CoreResult<CompositeGraph> {
    settings.validate()?;
    let graph = pixel_art_graph(settings);
    graph.validate()?;
    compositor.rebuild(&graph).map_err(CoreError::host)?;
    log::info!(
        "Generated {} composite nodes (pixel size {}, palette {})",
        graph.nodes.len(),
        settings.pixel_size,
        settings.color_palette_size
    );
    Ok(graph)
}

/// Asks `confirm` before replacing the compositor graph.
///
/// Returns `Ok(None)` when the user declines; the compositor is untouched.
pub fn confirm_and_generate<C: Compositor>(
    compositor: &mut C,
    settings: &PixelArtSettings,
    confirm: impl FnOnce(&str) -> bool,
) -> CoreResult<Option<CompositeGraph>> {
    if !confirm(CONFIRM_MESSAGE) {
        log::info!("Composite node generation declined");
        return Ok(None);
    }
    generate_composite_nodes(compositor, settings).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;
    use crate::memory::MemoryHost;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_graph_shape() {
        let graph = pixel_art_graph(&PixelArtSettings::default());
        assert_eq!(graph.nodes.len(), 16);
        assert_eq!(graph.links.len(), 22);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_named_values_carry_settings() {
        let graph = pixel_art_graph(&PixelArtSettings::new(8.0, 16.0));
        let (_, pixel) = graph.node_by_name(PIXEL_SIZE_NODE).unwrap();
        assert_eq!(pixel.kind, NodeKind::Value { value: 8.0 });
        assert_eq!(pixel.label.as_deref(), Some(PIXEL_SIZE_NODE));
        let (_, palette) = graph.node_by_name(COLOR_PALETTE_SIZE_NODE).unwrap();
        assert_eq!(palette.kind, NodeKind::Value { value: 16.0 });
    }

    #[test]
    fn test_combine_receives_all_four_channels() {
        let graph = pixel_art_graph(&PixelArtSettings::default());
        let combine = graph
            .nodes
            .iter()
            .position(|n| matches!(n.kind, NodeKind::CombineColor { .. }))
            .map(NodeId)
            .unwrap();
        let mut sockets: Vec<usize> = graph.inputs_of(combine).map(|l| l.to_socket).collect();
        sockets.sort();
        assert_eq!(sockets, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_alpha_round_is_clamped() {
        let graph = pixel_art_graph(&PixelArtSettings::default());
        let clamped: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| {
                matches!(
                    n.kind,
                    NodeKind::Math {
                        operation: MathOperation::Round,
                        use_clamp: true
                    }
                )
            })
            .collect();
        assert_eq!(clamped.len(), 1);
    }

    #[test]
    fn test_validate_rejects_dangling_link() {
        let mut graph = CompositeGraph::default();
        let a = graph.add(NodeKind::RenderLayers, [0.0, 0.0]);
        graph.link(a, 0, NodeId(5), 0);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_generate_twice_gives_same_graph() {
        let mut host = MemoryHost::new(Vec3::new(0.0, -5.0, 0.0));
        let settings = PixelArtSettings::new(4.0, 8.0);
        generate_composite_nodes(&mut host, &settings).unwrap();
        generate_composite_nodes(&mut host, &settings).unwrap();
        assert_eq!(host.graphs().len(), 2);
        assert_eq!(host.graphs()[0], host.graphs()[1]);
    }

    #[test]
    fn test_declined_confirmation_leaves_compositor() {
        let mut host = MemoryHost::new(Vec3::new(0.0, -5.0, 0.0));
        let result =
            confirm_and_generate(&mut host, &PixelArtSettings::default(), |_| false).unwrap();
        assert!(result.is_none());
        assert!(host.graphs().is_empty());
    }

    #[test]
    fn test_json_has_type_tags() {
        let graph = pixel_art_graph(&PixelArtSettings::default());
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"][0]["kind"]["type"], "render_layers");
        assert_eq!(json["nodes"][1]["kind"]["filter"], "gauss");
    }
}
