use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::warn;

use crate::error::Result;
use crate::library::AlbumRow;

/// Label used for albums and folders without a title.
pub const UNTITLED_LABEL: &str = "Albums";

/// One node of the reconstructed hierarchy. Children are arena indices.
struct AlbumNode {
    uuid: String,
    label: String,
    asset_ids: Vec<String>,
    children: Vec<usize>,
}

/// Rebuilds the album/folder tree from a flat scan in which every folder
/// row arrives before the rows it contains.
///
/// Nodes live in an arena; `by_pk` maps source primary keys to arena slots
/// so that a child can find its parent in O(1) without any tree walk. A row
/// whose parent pk was never seen becomes a root, which is how the source
/// represents top-level albums.
pub struct AlbumStructure {
    arena: Vec<AlbumNode>,
    by_pk: HashMap<i64, usize>,
    roots: Vec<usize>,
}

impl AlbumStructure {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            by_pk: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Number of albums added so far.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Insert one album row with its resolved asset identifier list.
    ///
    /// Attachment is append-only: the node joins its parent's children when
    /// the parent is already registered, the root list otherwise, and is
    /// never re-parented afterwards.
    pub fn add_row(&mut self, row: &AlbumRow, asset_ids: Vec<String>) {
        let idx = self.arena.len();
        self.arena.push(AlbumNode {
            uuid: row.uuid.clone(),
            label: row
                .title
                .clone()
                .unwrap_or_else(|| UNTITLED_LABEL.to_string()),
            asset_ids,
            children: Vec::new(),
        });

        match row
            .parent_pk
            .and_then(|pk| self.by_pk.get(&pk).copied())
        {
            Some(parent) => self.arena[parent].children.push(idx),
            None => self.roots.push(idx),
        }

        // Source primary keys are unique per run, so this should never
        // shadow anything. If it does, later children attach to the newer
        // node and the older one keeps its place in the tree.
        if self.by_pk.insert(row.pk, idx).is_some() {
            warn!(pk = row.pk, "duplicate album primary key, keeping the later row for parent lookups");
        }
    }

    fn node_value(&self, idx: usize) -> Value {
        let node = &self.arena[idx];
        let children: Vec<Value> = node
            .children
            .iter()
            .map(|&child| self.node_value(child))
            .collect();
        json!({
            "id": node.uuid,
            "label": node.label,
            "type": "album",
            "object": {
                "label": node.label,
                "title": node.label,
                "assets": node.asset_ids,
            },
            "children": children,
        })
    }

    /// The whole structure as a JSON array of root nodes, in insertion
    /// order at every level.
    pub fn to_value(&self) -> Value {
        Value::Array(self.roots.iter().map(|&idx| self.node_value(idx)).collect())
    }

    /// Serialize the structure for storage as a single document field.
    /// Deterministic given an identical sequence of `add_row` calls.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}

impl Default for AlbumStructure {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pk: i64, parent_pk: Option<i64>, title: Option<&str>, uuid: &str) -> AlbumRow {
        AlbumRow {
            pk,
            parent_pk,
            title: title.map(str::to_string),
            uuid: uuid.to_string(),
        }
    }

    #[test]
    fn test_single_root() {
        let mut structure = AlbumStructure::new();
        structure.add_row(&row(1, None, Some("Holidays"), "u1"), vec![]);

        let value = structure.to_value();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["id"], "u1");
        assert_eq!(value[0]["label"], "Holidays");
        assert_eq!(value[0]["type"], "album");
        assert_eq!(value[0]["children"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_nested_child_with_assets() {
        // Folder "A" with asset, album "B" inside it without assets
        let mut structure = AlbumStructure::new();
        structure.add_row(&row(1, None, Some("A"), "uA"), vec!["asset:x".to_string()]);
        structure.add_row(&row(2, Some(1), Some("B"), "uB"), vec![]);

        let value = structure.to_value();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["id"], "uA");
        assert_eq!(value[0]["object"]["assets"], json!(["asset:x"]));

        let children = value[0]["children"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["id"], "uB");
        assert_eq!(children[0]["label"], "B");
        assert_eq!(children[0]["object"]["assets"], json!([]));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut structure = AlbumStructure::new();
        structure.add_row(&row(1, None, Some("root"), "u-root"), vec![]);
        structure.add_row(&row(2, Some(1), Some("first"), "u-first"), vec![]);
        structure.add_row(&row(3, None, Some("other root"), "u-other"), vec![]);
        structure.add_row(&row(4, Some(1), Some("second"), "u-second"), vec![]);

        let value = structure.to_value();
        let roots = value.as_array().unwrap();
        assert_eq!(roots[0]["id"], "u-root");
        assert_eq!(roots[1]["id"], "u-other");

        let children = roots[0]["children"].as_array().unwrap();
        assert_eq!(children[0]["id"], "u-first");
        assert_eq!(children[1]["id"], "u-second");
    }

    #[test]
    fn test_orphan_becomes_root() {
        let mut structure = AlbumStructure::new();
        // Parent pk 99 was never seen (filtered out upstream)
        structure.add_row(&row(1, Some(99), Some("orphan"), "u-orphan"), vec![]);

        let value = structure.to_value();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["id"], "u-orphan");
    }

    #[test]
    fn test_missing_title_placeholder() {
        let mut structure = AlbumStructure::new();
        structure.add_row(&row(1, None, None, "u1"), vec![]);

        let value = structure.to_value();
        assert_eq!(value[0]["label"], UNTITLED_LABEL);
        assert_eq!(value[0]["object"]["title"], UNTITLED_LABEL);
    }

    #[test]
    fn test_duplicate_pk_overwrites_lookup() {
        let mut structure = AlbumStructure::new();
        structure.add_row(&row(1, None, Some("old"), "u-old"), vec![]);
        structure.add_row(&row(1, None, Some("new"), "u-new"), vec![]);
        structure.add_row(&row(2, Some(1), Some("child"), "u-child"), vec![]);

        let value = structure.to_value();
        let roots = value.as_array().unwrap();
        // Both rows stay where they were inserted
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0]["id"], "u-old");
        assert_eq!(roots[0]["children"].as_array().unwrap().len(), 0);
        // The child attaches to the later row
        assert_eq!(roots[1]["children"][0]["id"], "u-child");
    }

    #[test]
    fn test_serialize_deterministic() {
        let build = || {
            let mut structure = AlbumStructure::new();
            structure.add_row(&row(1, None, Some("A"), "uA"), vec!["a:1".to_string()]);
            structure.add_row(&row(2, Some(1), Some("B"), "uB"), vec![]);
            structure.serialize().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_serialize_empty() {
        let structure = AlbumStructure::new();
        assert!(structure.is_empty());
        assert_eq!(structure.serialize().unwrap(), "[]");
    }
}
