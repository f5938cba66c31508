// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cycle detection (component C7): a generic, iterative, path-reporting DFS shared by the
//! package-level and module-level cycle checks.
//!
//! Iterative rather than recursive because graphs built from real dependency trees can be
//! arbitrarily deep; a recursive DFS would risk a stack overflow on pathological inputs.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Copy, Eq, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Searches for a cycle reachable from `nodes`, visited in the given order, using
/// `neighbors_of` to list each node's out-edges in declaration order.
///
/// Returns the cycle as a path `[a, b, ..., a]` (the starting node repeated at the end), or
/// `None` if the reachable graph is acyclic. Deterministic for identical inputs: node visitation
/// order and the order `neighbors_of` returns are both declaration order, so the first back-edge
/// found is always the same one.
pub(crate) fn find_cycle<K, F>(nodes: impl IntoIterator<Item = K>, mut neighbors_of: F) -> Option<Vec<K>>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> Vec<K>,
{
    let mut color: HashMap<K, Color> = HashMap::new();
    let mut path: Vec<K> = Vec::new();
    // Each frame is (node, its ordered neighbor list, index of the next neighbor to visit).
    let mut stack: Vec<(K, Vec<K>, usize)> = Vec::new();

    for start in nodes {
        if !matches!(color.get(&start), None | Some(Color::White)) {
            continue;
        }
        color.insert(start.clone(), Color::Gray);
        path.push(start.clone());
        let neighbors = neighbors_of(&start);
        stack.push((start, neighbors, 0));

        while let Some(top) = stack.len().checked_sub(1) {
            let idx = stack[top].2;
            if idx < stack[top].1.len() {
                let next = stack[top].1[idx].clone();
                stack[top].2 += 1;
                match color.get(&next).copied().unwrap_or(Color::White) {
                    Color::White => {
                        color.insert(next.clone(), Color::Gray);
                        path.push(next.clone());
                        let next_neighbors = neighbors_of(&next);
                        stack.push((next, next_neighbors, 0));
                    }
                    Color::Gray => {
                        let start_pos = path
                            .iter()
                            .position(|n| n == &next)
                            .expect("a gray node is always still on the current path");
                        let mut cycle: Vec<K> = path[start_pos..].to_vec();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    Color::Black => {}
                }
            } else {
                let (node, _, _) = stack.pop().expect("stack is non-empty inside this loop");
                color.insert(node, Color::Black);
                path.pop();
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn run(edges: &[(&str, &str)], roots: &[&str]) -> Option<Vec<String>> {
        let mut adj: Map<String, Vec<String>> = Map::new();
        for (from, to) in edges {
            adj.entry(from.to_string()).or_default().push(to.to_string());
        }
        find_cycle(roots.iter().map(|s| s.to_string()), |n| {
            adj.get(n).cloned().unwrap_or_default()
        })
    }

    #[test]
    fn acyclic_returns_none() {
        assert!(run(&[("a", "b"), ("b", "c")], &["a"]).is_none());
    }

    #[test]
    fn simple_cycle_is_reported_with_closing_node() {
        let cycle = run(&[("a", "b"), ("b", "c"), ("c", "a")], &["a"]).unwrap();
        assert_eq!(cycle, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let cycle = run(&[("a", "a")], &["a"]).unwrap();
        assert_eq!(cycle, vec!["a", "a"]);
    }

    #[test]
    fn diamond_without_back_edge_is_acyclic() {
        assert!(run(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")], &["a"]).is_none());
    }
}
