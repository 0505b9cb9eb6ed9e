// crates/syncward-core/src/core/schema.rs
// ============================================================================
// Module: Syncward Field Schema
// Description: Flattening of stream JSON schemas into comparable field shapes.
// Purpose: Give the diff engine a path-keyed view of nested stream fields.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Streams describe their records with JSON Schema. This module walks object
//! `properties` and array `items` and records every reachable field path with
//! its [`FieldShape`]. A shape carries only the field's own type annotations;
//! nested properties are recorded under their own paths, so a change deep in
//! a record surfaces on the nested path rather than on every ancestor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::catalog::FieldPath;

// ============================================================================
// SECTION: Field Shapes
// ============================================================================

/// Path segment used for array element schemas.
pub const ARRAY_ITEMS_SEGMENT: &str = "items";

/// Type annotations of a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldShape {
    /// Declared JSON types (`"null"` included when nullable).
    #[serde(default)]
    pub types: BTreeSet<String>,
    /// JSON Schema `format` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Connector-specific `airbyte_type` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airbyte_type: Option<String>,
}

impl FieldShape {
    /// Extracts the shape of a schema node.
    #[must_use]
    pub fn from_node(node: &Value) -> Self {
        let types = match node.get("type") {
            Some(Value::String(single)) => BTreeSet::from([single.clone()]),
            Some(Value::Array(many)) => {
                many.iter().filter_map(Value::as_str).map(str::to_string).collect()
            }
            _ => BTreeSet::new(),
        };
        Self {
            types,
            format: string_annotation(node, "format"),
            airbyte_type: string_annotation(node, "airbyte_type"),
        }
    }

    /// Returns true when every value valid for `self` stays valid for `next`.
    ///
    /// Annotations must match exactly; `integer` widens to `number`.
    #[must_use]
    pub fn widens_to(&self, next: &Self) -> bool {
        if self.format != next.format || self.airbyte_type != next.airbyte_type {
            return false;
        }
        self.types.iter().all(|ty| {
            next.types.contains(ty) || (ty == "integer" && next.types.contains("number"))
        })
    }
}

/// Reads a string annotation from a schema node.
fn string_annotation(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

// ============================================================================
// SECTION: Flattening
// ============================================================================

/// Flattens a stream schema into field paths and shapes.
///
/// Non-object schemas yield no fields. When two schema branches produce the
/// same path, the first one encountered wins.
#[must_use]
pub fn flatten_fields(schema: &Value) -> BTreeMap<FieldPath, FieldShape> {
    let mut fields = BTreeMap::new();
    collect_fields(schema, None, &mut fields);
    fields
}

/// Records the children of `node` below `prefix`.
fn collect_fields(
    node: &Value,
    prefix: Option<&FieldPath>,
    fields: &mut BTreeMap<FieldPath, FieldShape>,
) {
    if let Some(properties) = node.get("properties").and_then(Value::as_object) {
        for (name, child) in properties {
            let path = prefix.map_or_else(
                || FieldPath::new(vec![name.clone()]),
                |parent| parent.child(name.clone()),
            );
            record(child, path, fields);
        }
    }
    if let Some(parent) = prefix
        && let Some(items) = node.get(ARRAY_ITEMS_SEGMENT).filter(|items| items.is_object())
    {
        record(items, parent.child(ARRAY_ITEMS_SEGMENT), fields);
    }
}

/// Records one node and descends into it.
fn record(node: &Value, path: FieldPath, fields: &mut BTreeMap<FieldPath, FieldShape>) {
    if fields.contains_key(&path) {
        return;
    }
    fields.insert(path.clone(), FieldShape::from_node(node));
    collect_fields(node, Some(&path), fields);
}

// ============================================================================
// SECTION: Tests
// ============================================================================
