//! Markdown inspection of finished turn content.

use diagram_engine::DIAGRAM_FENCE_TAG;
use markdown::{mdast, to_mdast, ParseOptions};

/// True when `content` holds an inline image or a fenced code block.
pub fn is_generated_content(content: &str) -> bool {
    let Some(root) = parse(content) else {
        return false;
    };

    let mut found = false;
    walk(&root, &mut |node| match node {
        mdast::Node::Image(_) => found = true,
        mdast::Node::Code(code) if is_fenced(code, content) => found = true,
        _ => {}
    });
    found
}

/// Sources of every fenced diagram block, in document order.
pub fn diagram_blocks(content: &str) -> Vec<String> {
    let Some(root) = parse(content) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    walk(&root, &mut |node| {
        if let mdast::Node::Code(code) = node {
            if code.lang.as_deref() == Some(DIAGRAM_FENCE_TAG) {
                blocks.push(code.value.clone());
            }
        }
    });
    blocks
}

/// Source of the diagram when it is the only block in `content`.
pub fn lone_diagram(content: &str) -> Option<String> {
    let root = parse(content)?;
    match root.children()?.as_slice() {
        [mdast::Node::Code(code)] if code.lang.as_deref() == Some(DIAGRAM_FENCE_TAG) => {
            Some(code.value.clone())
        }
        _ => None,
    }
}

fn parse(content: &str) -> Option<mdast::Node> {
    to_mdast(content, &ParseOptions::gfm()).ok()
}

fn walk(node: &mdast::Node, visit: &mut dyn FnMut(&mdast::Node)) {
    visit(node);
    if let Some(children) = node.children() {
        for child in children {
            walk(child, visit);
        }
    }
}

// Indented code blocks parse to the same node; only fences count.
fn is_fenced(code: &mdast::Code, source: &str) -> bool {
    let Some(position) = code.position.as_ref() else {
        return code.lang.is_some();
    };
    source
        .get(position.start.offset..)
        .map(|rest| {
            let rest = rest.trim_start();
            rest.starts_with("```") || rest.starts_with("~~~")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_inline_images() {
        assert!(is_generated_content(
            "Here you go:\n\n![Generated image](https://cdn.example.com/cat.png)\n"
        ));
    }

    #[test]
    fn detects_fenced_code() {
        assert!(is_generated_content("```json\n{\"a\": 1}\n```\n"));
        assert!(is_generated_content("Chart:\n\n```mermaid\ngraph TD\nA-->B\n```"));
    }

    #[test]
    fn plain_text_and_indented_code_are_not_generated() {
        assert!(!is_generated_content("Just a sentence with `inline code`."));
        assert!(!is_generated_content("Intro\n\n    indented block\n"));
        assert!(!is_generated_content(""));
    }

    #[test]
    fn collects_only_diagram_fences() {
        let content = "```mermaid\ngraph TD\nA-->B\n```\n\n```rust\nfn main() {}\n```\n\n```mermaid\nflowchart LR\nX-->Y\n```\n";
        assert_eq!(
            diagram_blocks(content),
            vec!["graph TD\nA-->B".to_string(), "flowchart LR\nX-->Y".to_string()]
        );
    }

    #[test]
    fn lone_diagram_requires_a_single_block() {
        assert_eq!(
            lone_diagram("```mermaid\ngraph TD\nA-->B\n```\n\n").as_deref(),
            Some("graph TD\nA-->B")
        );
        assert_eq!(lone_diagram("Intro\n\n```mermaid\ngraph TD\n```\n"), None);
        assert_eq!(lone_diagram("```json\n{}\n```\n"), None);
    }
}
