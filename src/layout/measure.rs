//! Natural-size measurement.
//!
//! Mirrors the mounted subtree into a flexbox tree and computes its
//! max-content size. Elements are column flex containers; text nodes are
//! measured leaves; style nodes occupy no space.

use taffy::{AvailableSpace, Dimension, Display, FlexDirection, Size, Style, TaffyError, TaffyTree};

use crate::host::{Host, NodeId, NodeKind};

use super::text_measure::{measure_text_height, text_width};

/// Natural (max-content) size of the subtree rooted at `root`, in pixels.
///
/// Returns the zero size when the subtree is empty or has been released.
pub fn natural_size(host: &Host, root: NodeId) -> (f32, f32) {
    compute(host, root).unwrap_or((0.0, 0.0))
}

fn compute(host: &Host, root: NodeId) -> Result<(f32, f32), TaffyError> {
    let mut tree: TaffyTree<String> = TaffyTree::new();
    let Some(root_node) = build(&mut tree, host, root)? else {
        return Ok((0.0, 0.0));
    };

    tree.compute_layout_with_measure(
        root_node,
        Size {
            width: AvailableSpace::MaxContent,
            height: AvailableSpace::MaxContent,
        },
        |known, available, _node, context, _style| measure_leaf(known, available, context),
    )?;

    let layout = tree.layout(root_node)?;
    Ok((layout.size.width, layout.size.height))
}

/// Mirror one host node into the flex tree. Style nodes map to nothing.
fn build(
    tree: &mut TaffyTree<String>,
    host: &Host,
    id: NodeId,
) -> Result<Option<taffy::NodeId>, TaffyError> {
    let Some((kind, text, children, width, height)) = host.with_node(id, |node| {
        (
            node.kind.clone(),
            node.text.clone(),
            node.children.clone(),
            dimension_attr(&node.attrs, "width"),
            dimension_attr(&node.attrs, "height"),
        )
    }) else {
        return Ok(None);
    };

    match kind {
        NodeKind::Style => Ok(None),
        NodeKind::Text => Ok(Some(tree.new_leaf_with_context(Style::default(), text)?)),
        NodeKind::Element { .. } => {
            let style = Style {
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                size: Size {
                    width: width.unwrap_or(Dimension::Auto),
                    height: height.unwrap_or(Dimension::Auto),
                },
                ..Default::default()
            };
            let element = tree.new_leaf(style)?;
            for child in children {
                if let Some(child_node) = build(tree, host, child)? {
                    tree.add_child(element, child_node)?;
                }
            }
            Ok(Some(element))
        }
    }
}

fn dimension_attr(
    attrs: &std::collections::BTreeMap<String, String>,
    name: &str,
) -> Option<Dimension> {
    attrs
        .get(name)?
        .trim_end_matches("px")
        .parse::<f32>()
        .ok()
        .map(Dimension::Length)
}

fn measure_leaf(
    known: Size<Option<f32>>,
    available: Size<AvailableSpace>,
    context: Option<&mut String>,
) -> Size<f32> {
    let Some(text) = context else {
        return Size::ZERO;
    };

    let width = known.width.unwrap_or_else(|| {
        let natural = text_width(text);
        match available.width {
            AvailableSpace::Definite(limit) => natural.min(limit),
            AvailableSpace::MaxContent | AvailableSpace::MinContent => natural,
        }
    });
    let height = known
        .height
        .unwrap_or_else(|| measure_text_height(text, width));

    Size { width, height }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::text_measure::{CHAR_WIDTH, LINE_HEIGHT};

    #[test]
    fn test_text_leaf_sized_by_content() {
        let host = Host::new();
        let root = host.create_element("div");
        let text = host.create_text("hello");
        host.append_child(root, text);

        let (w, h) = natural_size(&host, root);
        assert_eq!(w, 5.0 * CHAR_WIDTH);
        assert_eq!(h, LINE_HEIGHT);
    }

    #[test]
    fn test_explicit_dimensions_win() {
        let host = Host::new();
        let root = host.create_element("div");
        host.set_attr(root, "width", "200");
        host.set_attr(root, "height", "100");

        assert_eq!(natural_size(&host, root), (200.0, 100.0));
    }

    #[test]
    fn test_column_children_stack() {
        let host = Host::new();
        let root = host.create_element("div");
        for content in ["one", "two", "three"] {
            let p = host.create_element("p");
            let text = host.create_text(content);
            host.append_child(p, text);
            host.append_child(root, p);
        }

        let (w, h) = natural_size(&host, root);
        assert_eq!(w, 5.0 * CHAR_WIDTH);
        assert_eq!(h, 3.0 * LINE_HEIGHT);
    }

    #[test]
    fn test_style_nodes_take_no_space() {
        let host = Host::new();
        let root = host.create_element("div");
        let style = host.create_style(".x { color: red }");
        host.append_child(root, style);

        assert_eq!(natural_size(&host, root), (0.0, 0.0));
    }

    #[test]
    fn test_released_root_measures_zero() {
        let host = Host::new();
        let root = host.create_element("div");
        host.release(root);
        assert_eq!(natural_size(&host, root), (0.0, 0.0));
    }
}
