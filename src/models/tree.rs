//! Nested, insertion-ordered result tree
//!
//! Branches keep their entries in insertion order so that chart groups come
//! out in the order the measurements were taken (or the order of the keys in a
//! replayed JSON file).

use crate::error::{AppError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::path::Path;

/// A node of the result tree
#[derive(Debug, Clone, PartialEq)]
pub enum ResultNode {
    /// Terminal statistic
    Leaf(f64),
    /// Ordered `(key, child)` entries
    Branch(Vec<(String, ResultNode)>),
}

impl ResultNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Entries of a branch, `None` for a leaf
    pub fn entries(&self) -> Option<&[(String, ResultNode)]> {
        match self {
            Self::Leaf(_) => None,
            Self::Branch(entries) => Some(entries),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ResultNode> {
        self.entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Number of leaves below this node (1 for a leaf)
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(entries) => entries.iter().map(|(_, child)| child.leaf_count()).sum(),
        }
    }

    /// Convert a JSON value: objects become branches, numbers become leaves
    pub fn from_json_value(value: &Value) -> Result<Self> {
        Self::from_json_at(value, &mut Vec::new())
    }

    fn from_json_at(value: &Value, path: &mut Vec<String>) -> Result<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(Self::Leaf).ok_or_else(|| {
                AppError::schema(format!("number at {} is not representable", display_path(path)))
            }),
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, child) in map {
                    path.push(key.clone());
                    let node = Self::from_json_at(child, path)?;
                    path.pop();
                    entries.push((key.clone(), node));
                }
                Ok(Self::Branch(entries))
            }
            other => Err(AppError::schema(format!(
                "expected an object or a number at {}, found {}",
                display_path(path),
                json_type_name(other)
            ))),
        }
    }

    pub fn to_json_value(&self) -> Value {
        match self {
            Self::Leaf(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Branch(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json_value()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for ResultNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(value) => serializer.serialize_f64(*value),
            Self::Branch(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, child) in entries {
                    map.serialize_entry(key, child)?;
                }
                map.end()
            }
        }
    }
}

/// Render a key path for error messages, e.g. `n4 / n5`
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(" / ")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Result tree built by the acquisition engine or loaded from JSON
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTree {
    root: ResultNode,
}

impl Default for ResultTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultTree {
    /// Create an empty tree (an empty root branch)
    pub fn new() -> Self {
        Self {
            root: ResultNode::Branch(Vec::new()),
        }
    }

    pub fn from_root(root: ResultNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ResultNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.root, ResultNode::Branch(entries) if entries.is_empty())
    }

    pub fn leaf_count(&self) -> usize {
        match &self.root {
            ResultNode::Branch(entries) if entries.is_empty() => 0,
            root => root.leaf_count(),
        }
    }

    /// Insert a leaf at `path`, creating intermediate branches as needed.
    ///
    /// Re-inserting an existing key replaces its value in place, keeping the
    /// original position.
    pub fn insert_path<S: AsRef<str>>(&mut self, path: &[S], value: f64) -> Result<()> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| AppError::schema("cannot insert a value at the root"))?;

        let mut node = &mut self.root;
        let mut walked: Vec<String> = Vec::with_capacity(path.len());
        for key in parents {
            let key = key.as_ref();
            walked.push(key.to_string());
            let entries = match node {
                ResultNode::Branch(entries) => entries,
                ResultNode::Leaf(_) => {
                    return Err(AppError::schema(format!(
                        "{} holds a value, cannot nest below it",
                        display_path(&walked[..walked.len() - 1])
                    )))
                }
            };
            let index = match entries.iter().position(|(k, _)| k == key) {
                Some(index) => index,
                None => {
                    entries.push((key.to_string(), ResultNode::Branch(Vec::new())));
                    entries.len() - 1
                }
            };
            node = &mut entries[index].1;
        }

        let entries = match node {
            ResultNode::Branch(entries) => entries,
            ResultNode::Leaf(_) => {
                return Err(AppError::schema(format!(
                    "{} holds a value, cannot nest below it",
                    display_path(&walked)
                )))
            }
        };

        let last = last.as_ref();
        match entries.iter_mut().find(|(k, _)| k == last) {
            Some((_, existing)) => *existing = ResultNode::Leaf(value),
            None => entries.push((last.to_string(), ResultNode::Leaf(value))),
        }
        Ok(())
    }

    /// Look up the node at `path`
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&ResultNode> {
        path.iter()
            .try_fold(&self.root, |node, key| node.get(key.as_ref()))
    }

    /// Every leaf with its key path, in depth-first insertion order
    pub fn leaf_paths(&self) -> Vec<(Vec<String>, f64)> {
        fn walk(node: &ResultNode, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, f64)>) {
            match node {
                ResultNode::Leaf(value) => out.push((path.clone(), *value)),
                ResultNode::Branch(entries) => {
                    for (key, child) in entries {
                        path.push(key.clone());
                        walk(child, path, out);
                        path.pop();
                    }
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut out);
        out
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::from_root(ResultNode::from_json_value(&value)?))
    }

    /// Load a tree from a nested JSON file, keeping key order
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::io(format!("Failed to read results file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Write the tree as pretty-printed nested JSON
    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        let content = self.to_json_string()?;
        std::fs::write(path, content).map_err(|e| {
            AppError::io(format!("Failed to write results file {}: {}", path.display(), e))
        })
    }
}

impl Serialize for ResultTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}
