//! Hierarchical grouping of a result tree into grouped-bar chart levels
//!
//! A tree of depth `d` becomes one leaf row (the bars) plus `d - 1` rows of
//! `(label, span)` groups. Every group row covers all leaves, so the spans of
//! any row add up to the number of bars. Order is depth-first insertion order
//! throughout.

pub mod layout;


pub use layout::{layout_coordinates, ChartLayout, LabelRow};

use crate::error::{AppError, Result};
use crate::models::tree::display_path;
use crate::models::{ResultNode, ResultTree};
use serde::Serialize;

/// A group label covering `span` consecutive leaves
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSpan {
    pub label: String,
    pub span: usize,
}

impl GroupSpan {
    pub fn new<S: Into<String>>(label: S, span: usize) -> Self {
        Self {
            label: label.into(),
            span,
        }
    }
}

/// One row of group labels at a fixed depth
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupLevel {
    pub groups: Vec<GroupSpan>,
}

impl GroupLevel {
    /// Sum of all spans
    pub fn total_span(&self) -> usize {
        self.groups.iter().map(|g| g.span).sum()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }

    fn append(&mut self, other: GroupLevel) {
        self.groups.extend(other.groups);
    }
}

/// Borrowed view of one level, leaf level included
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level<'a> {
    Leaves(&'a [(String, f64)]),
    Groups(&'a GroupLevel),
}

impl Level<'_> {
    /// Number of entries in the row
    pub fn len(&self) -> usize {
        match self {
            Level::Leaves(leaves) => leaves.len(),
            Level::Groups(level) => level.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of [`group_levels`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedLevels {
    /// `(key, value)` of every leaf in depth-first order
    pub leaves: Vec<(String, f64)>,
    /// Group rows, the one nearest to the leaves first
    pub ancestors: Vec<GroupLevel>,
}

impl GroupedLevels {
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Number of levels including the leaf row, equal to the tree depth
    pub fn depth(&self) -> usize {
        self.ancestors.len() + 1
    }

    /// All levels, leaf row first
    pub fn levels(&self) -> Vec<Level<'_>> {
        std::iter::once(Level::Leaves(&self.leaves))
            .chain(self.ancestors.iter().map(Level::Groups))
            .collect()
    }
}

/// Flatten `tree` into its leaf row and group rows.
///
/// Fails with a schema error naming the key path when a branch is empty,
/// mixes values with nested groups or has children of unequal depth, and
/// when the root itself is a bare value.
pub fn group_levels(tree: &ResultTree) -> Result<GroupedLevels> {
    match tree.root() {
        ResultNode::Leaf(_) => Err(AppError::schema(
            "the result set is a single value, expected named groups",
        )),
        root => group_branch(root, &mut Vec::new()),
    }
}

fn group_branch(node: &ResultNode, path: &mut Vec<String>) -> Result<GroupedLevels> {
    let entries = node.entries().unwrap_or_default();
    if entries.is_empty() {
        return Err(AppError::schema(format!("{} has no results", display_path(path))));
    }

    let leaf_children = entries.iter().filter(|(_, child)| child.is_leaf()).count();

    if leaf_children == entries.len() {
        let leaves = entries
            .iter()
            .filter_map(|(key, child)| match child {
                ResultNode::Leaf(value) => Some((key.clone(), *value)),
                ResultNode::Branch(_) => None,
            })
            .collect();
        return Ok(GroupedLevels {
            leaves,
            ancestors: Vec::new(),
        });
    }

    if leaf_children > 0 {
        return Err(AppError::schema(format!(
            "{} mixes values with nested groups",
            display_path(path)
        )));
    }

    let mut leaves = Vec::new();
    let mut ancestors: Vec<GroupLevel> = Vec::new();
    let mut own_level = GroupLevel::default();
    let mut child_depth: Option<usize> = None;

    for (key, child) in entries {
        path.push(key.clone());
        let grouped = group_branch(child, path)?;

        match child_depth {
            None => child_depth = Some(grouped.depth()),
            Some(depth) if depth != grouped.depth() => {
                return Err(AppError::schema(format!(
                    "{} is {} level(s) deep while its siblings are {}",
                    display_path(path),
                    grouped.depth(),
                    depth
                )));
            }
            Some(_) => {}
        }
        path.pop();

        own_level.groups.push(GroupSpan::new(key.clone(), grouped.leaf_count()));
        leaves.extend(grouped.leaves);

        if ancestors.is_empty() {
            ancestors = grouped.ancestors;
        } else {
            for (merged, level) in ancestors.iter_mut().zip(grouped.ancestors) {
                merged.append(level);
            }
        }
    }

    ancestors.push(own_level);
    Ok(GroupedLevels { leaves, ancestors })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(json: &str) -> ResultTree {
        ResultTree::from_json_str(json).unwrap()
    }

    fn spans(level: &GroupLevel) -> Vec<(&str, usize)> {
        level.groups.iter().map(|g| (g.label.as_str(), g.span)).collect()
    }

    #[test]
    fn test_two_level_tree() {
        let grouped = group_levels(&tree(r#"{"R1": {"S1": 10, "S2": 20}, "R2": {"S1": 5}}"#)).unwrap();

        assert_eq!(
            grouped.leaves,
            vec![("S1".to_string(), 10.0), ("S2".to_string(), 20.0), ("S1".to_string(), 5.0)]
        );
        assert_eq!(grouped.ancestors.len(), 1);
        assert_eq!(spans(&grouped.ancestors[0]), vec![("R1", 2), ("R2", 1)]);
        assert_eq!(grouped.depth(), 2);
    }

    #[test]
    fn test_three_level_tree_merges_sibling_levels() {
        let grouped = group_levels(&tree(
            r#"{
                "n4": {"n5": {"mean": 1, "max": 2}, "mi": {"mean": 3, "max": 4}},
                "n5": {"n4": {"mean": 5, "max": 6}}
            }"#,
        ))
        .unwrap();

        assert_eq!(grouped.leaf_count(), 6);
        assert_eq!(grouped.depth(), 3);
        assert_eq!(spans(&grouped.ancestors[0]), vec![("n5", 2), ("mi", 2), ("n4", 2)]);
        assert_eq!(spans(&grouped.ancestors[1]), vec![("n4", 4), ("n5", 2)]);

        let values: Vec<f64> = grouped.leaves.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_flat_tree_has_no_groups() {
        let grouped = group_levels(&tree(r#"{"a": 1, "b": 2}"#)).unwrap();
        assert_eq!(grouped.leaf_count(), 2);
        assert!(grouped.ancestors.is_empty());
        assert_eq!(grouped.levels().len(), 1);
    }

    #[test]
    fn test_levels_leaf_row_first() {
        let grouped = group_levels(&tree(r#"{"R1": {"S1": 10, "S2": 20}, "R2": {"S1": 5}}"#)).unwrap();
        let levels = grouped.levels();
        assert_eq!(levels.len(), 2);
        assert!(matches!(levels[0], Level::Leaves(leaves) if leaves.len() == 3));
        assert!(matches!(levels[1], Level::Groups(level) if level.total_span() == 3));
    }

    #[test]
    fn test_mixed_children_name_the_path() {
        let error = group_levels(&tree(r#"{"R1": {"S1": 10, "S2": {"mean": 1}}}"#)).unwrap_err();
        assert_eq!(error.category(), "SCHEMA");
        assert!(error.to_string().contains("R1 mixes values"));
    }

    #[test]
    fn test_unequal_depth_is_rejected() {
        let error = group_levels(&tree(
            r#"{"R1": {"S1": {"mean": 1}, "S2": {"mean": {"x": 2}}}}"#,
        ))
        .unwrap_err();
        assert_eq!(error.category(), "SCHEMA");
        assert!(error.to_string().contains("R1 / S2"));
    }

    #[test]
    fn test_unequal_depth_at_top_level() {
        let error = group_levels(&tree(r#"{"R1": {"S1": 1}, "R2": {"S1": {"mean": 2}}}"#)).unwrap_err();
        assert!(error.to_string().contains("R2"));
    }

    #[test]
    fn test_empty_branch_is_rejected() {
        let error = group_levels(&tree(r#"{"R1": {"S1": 1}, "R2": {}}"#)).unwrap_err();
        assert_eq!(error.category(), "SCHEMA");
        assert!(error.to_string().contains("R2 has no results"));

        let error = group_levels(&ResultTree::new()).unwrap_err();
        assert!(error.to_string().contains("<root> has no results"));
    }

    #[test]
    fn test_bare_root_value_is_rejected() {
        let error = group_levels(&tree("42")).unwrap_err();
        assert_eq!(error.category(), "SCHEMA");
    }
}
