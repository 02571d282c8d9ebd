//! Stdout rendering for the list and tree views.

use std::collections::BTreeMap;

use bytesize::ByteSize;
use grapnel_remote::{ContentNode, Transfer};

/// Print one line per transfer with its status and human-readable
/// size.
pub(crate) fn render_transfer_list(transfers: &[Transfer]) {
    for transfer in transfers {
        println!("{}", transfer_line(transfer));
    }
}

/// Print a transfer's content as a unicode tree rooted at `.`, with
/// names in lexicographic order.
pub(crate) fn render_content_tree(content: &BTreeMap<String, ContentNode>) {
    println!(".");
    for line in tree_lines(content) {
        println!("{line}");
    }
}

fn transfer_line(transfer: &Transfer) -> String {
    format!(
        "* {} [{}] [{}]",
        transfer.name,
        transfer.status.as_str(),
        ByteSize(transfer.size)
    )
}

fn tree_lines(content: &BTreeMap<String, ContentNode>) -> Vec<String> {
    let mut lines = Vec::new();
    push_tree_lines(0, content, &mut lines);
    lines
}

fn push_tree_lines(level: usize, nodes: &BTreeMap<String, ContentNode>, lines: &mut Vec<String>) {
    let count = nodes.len();
    for (index, (name, node)) in nodes.iter().enumerate() {
        lines.push(format!("{} {name}", tree_prefix(level, index + 1 == count)));
        if let ContentNode::Dir(dir) = node {
            push_tree_lines(level + 1, &dir.children, lines);
        }
    }
}

fn tree_prefix(level: usize, is_last: bool) -> String {
    let mut prefix = "│   ".repeat(level);
    prefix.push_str(if is_last { "└──" } else { "├──" });
    prefix
}
