//! Flat-to-tree reconstruction of one page window of comments.
//!
//! The page window is an arbitrary slice of the whole dataset, so a comment's
//! parent may fall outside it. Such comments are surfaced as orphan roots for
//! the page rather than dropped; nesting is only guaranteed within a single
//! window.

use std::collections::HashMap;

use super::models::Comment;

/// Assemble a flat, ordered page window into a forest.
///
/// Two passes: the lookup is fully populated before any parent/child edge is
/// assigned, so the input iteration order never affects which comments end up
/// attached. Relative input order is preserved among roots and among the
/// children of each parent.
pub fn build_forest(flat: Vec<Comment>) -> Vec<Comment> {
    let mut by_id: HashMap<String, Comment> = HashMap::with_capacity(flat.len());
    let mut order: Vec<String> = Vec::with_capacity(flat.len());
    for mut comment in flat {
        comment.children.clear();
        let id = comment.id.clone();
        if !by_id.contains_key(&id) {
            by_id.insert(id.clone(), comment);
            order.push(id);
        }
    }

    let mut child_ids: HashMap<String, Vec<String>> = HashMap::new();
    let mut root_ids: Vec<String> = Vec::new();
    for id in &order {
        let parent_in_window = by_id
            .get(id)
            .and_then(|c| c.parent_id.as_ref())
            .filter(|pid| by_id.contains_key(*pid))
            .cloned();
        match parent_in_window {
            Some(parent_id) => child_ids.entry(parent_id).or_default().push(id.clone()),
            // True roots, and orphans whose parent lies outside this window
            None => root_ids.push(id.clone()),
        }
    }

    root_ids
        .into_iter()
        .map(|id| assemble(id, &mut by_id, &child_ids))
        .collect()
}

/// Move a root and its (transitive, in-window) children out of the lookup
/// into a nested subtree. Iterative so pathological reply depth cannot blow
/// the call stack.
fn assemble(
    root_id: String,
    by_id: &mut HashMap<String, Comment>,
    child_ids: &HashMap<String, Vec<String>>,
) -> Comment {
    enum Frame {
        Enter(String),
        Collect(String, usize),
    }

    let mut stack = vec![Frame::Enter(root_id)];
    let mut built: Vec<Comment> = Vec::new();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(id) => {
                let children: &[String] = child_ids.get(&id).map(|v| v.as_slice()).unwrap_or(&[]);
                stack.push(Frame::Collect(id, children.len()));
                for child_id in children.iter().rev() {
                    stack.push(Frame::Enter(child_id.clone()));
                }
            }
            Frame::Collect(id, child_count) => {
                // Every id lands in exactly one child list or the root list,
                // so the lookup entry is still present here.
                let mut node = by_id.remove(&id).expect("comment missing from lookup");
                node.children = built.split_off(built.len() - child_count);
                built.push(node);
            }
        }
    }

    built.pop().expect("assembly yields one root")
}

/// Apply the time-windowed permission flags and nesting levels to every node
/// of the forest, levels starting at 0 for the given roots.
pub fn annotate_forest(roots: &mut [Comment], now: i64) {
    let mut stack: Vec<(&mut Comment, usize)> = roots.iter_mut().map(|c| (c, 0)).collect();
    while let Some((comment, level)) = stack.pop() {
        comment.apply_permission_flags(now, level);
        for child in comment.children.iter_mut() {
            stack.push((child, level + 1));
        }
    }
}
