// crates/syncward-core/src/core/catalog.rs
// ============================================================================
// Module: Syncward Catalog Model
// Description: Streams, stream configuration, and catalogs exposed by a source.
// Purpose: Provide the plain data structures consumed by the diff and propagation engines.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`Catalog`] is an ordered list of [`CatalogEntry`] values, each pairing a
//! discovered [`Stream`] with the [`StreamConfiguration`] a connection applies
//! to it. Streams are identified across catalog versions by their
//! [`StreamDescriptor`] (name plus optional namespace).
//!
//! Catalogs arrive from external collaborators and are treated as untrusted:
//! [`Catalog::index`] rejects duplicate descriptors instead of silently picking
//! one entry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::schema::FieldShape;
use crate::core::schema::flatten_fields;

// ============================================================================
// SECTION: Sync Modes
// ============================================================================

/// How a source stream is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Re-read the full stream on every sync.
    FullRefresh,
    /// Read only records past the cursor.
    Incremental,
}

impl SyncMode {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullRefresh => "full_refresh",
            Self::Incremental => "incremental",
        }
    }
}

/// How records are written to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationSyncMode {
    /// Append records to existing data.
    Append,
    /// Replace existing data.
    Overwrite,
    /// Append and deduplicate on the primary key.
    AppendDedup,
    /// Replace existing data and deduplicate on the primary key.
    OverwriteDedup,
}

impl DestinationSyncMode {
    /// Returns true when the mode deduplicates on the primary key.
    #[must_use]
    pub const fn is_dedup(self) -> bool {
        matches!(self, Self::AppendDedup | Self::OverwriteDedup)
    }

    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Overwrite => "overwrite",
            Self::AppendDedup => "append_dedup",
            Self::OverwriteDedup => "overwrite_dedup",
        }
    }
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Stable identity of a stream across catalog versions.
///
/// # Invariants
/// - Ordered by namespace first (absent namespaces sort first), then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream name.
    pub name: String,
    /// Optional namespace (schema, database, etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl StreamDescriptor {
    /// Creates a descriptor with an optional namespace.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Creates a descriptor without a namespace.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}

impl Ord for StreamDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace.cmp(&other.namespace).then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for StreamDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Path from a stream's root to a (possibly nested) field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Creates a field path from ordered segments.
    #[must_use]
    pub const fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Creates a field path from anything yielding string-like segments.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true when the path names a top-level field.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.0.len() == 1
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

// ============================================================================
// SECTION: Streams
// ============================================================================

/// Stream definition as discovered from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Stream identity.
    #[serde(flatten)]
    pub descriptor: StreamDescriptor,
    /// JSON Schema document describing the stream's records.
    #[serde(default)]
    pub json_schema: Value,
    /// Sync modes the source supports for this stream.
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,
    /// Whether the source dictates the cursor.
    #[serde(default)]
    pub source_defined_cursor: bool,
    /// Cursor the source proposes by default.
    #[serde(default)]
    pub default_cursor_field: Vec<String>,
    /// Primary key declared by the source.
    #[serde(default)]
    pub source_defined_primary_key: Vec<Vec<String>>,
}

impl Stream {
    /// Creates a stream supporting both sync modes with no cursor or key.
    #[must_use]
    pub fn new(descriptor: StreamDescriptor, json_schema: Value) -> Self {
        Self {
            descriptor,
            json_schema,
            supported_sync_modes: vec![SyncMode::FullRefresh, SyncMode::Incremental],
            source_defined_cursor: false,
            default_cursor_field: Vec::new(),
            source_defined_primary_key: Vec::new(),
        }
    }

    /// Returns true when the source supports `mode` for this stream.
    #[must_use]
    pub fn supports(&self, mode: SyncMode) -> bool {
        self.supported_sync_modes.contains(&mode)
    }

    /// Returns every field path declared by the stream schema with its shape.
    #[must_use]
    pub fn fields(&self) -> BTreeMap<FieldPath, FieldShape> {
        flatten_fields(&self.json_schema)
    }
}

/// Per-stream sync settings owned by a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfiguration {
    /// Source read mode.
    pub sync_mode: SyncMode,
    /// Destination write mode.
    pub destination_sync_mode: DestinationSyncMode,
    /// Cursor field; order matters for composite cursors.
    #[serde(default)]
    pub cursor_field: Vec<String>,
    /// Primary key field paths; order does not matter for matching.
    #[serde(default)]
    pub primary_key: Vec<Vec<String>>,
    /// Whether the stream is synced.
    #[serde(default)]
    pub selected: bool,
    /// Whether only `selected_fields` are synced.
    #[serde(default)]
    pub field_selection_enabled: bool,
    /// Synced fields when field selection is enabled.
    #[serde(default)]
    pub selected_fields: Vec<FieldPath>,
}

impl Default for StreamConfiguration {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::FullRefresh,
            destination_sync_mode: DestinationSyncMode::Overwrite,
            cursor_field: Vec::new(),
            primary_key: Vec::new(),
            selected: false,
            field_selection_enabled: false,
            selected_fields: Vec::new(),
        }
    }
}

/// Returns a primary key as an order-independent set of field paths.
#[must_use]
pub fn primary_key_set(primary_key: &[Vec<String>]) -> BTreeSet<&[String]> {
    primary_key.iter().map(Vec::as_slice).collect()
}

// ============================================================================
// SECTION: Catalogs
// ============================================================================

/// Discovered stream paired with its connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream definition.
    pub stream: Stream,
    /// Sync configuration.
    #[serde(default)]
    pub config: StreamConfiguration,
}

impl CatalogEntry {
    /// Returns the entry's stream descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &StreamDescriptor {
        &self.stream.descriptor
    }
}

/// Ordered collection of catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries in source order.
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Creates a catalog from entries.
    #[must_use]
    pub const fn new(streams: Vec<CatalogEntry>) -> Self {
        Self {
            streams,
        }
    }

    /// Returns true when the catalog has no streams.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Returns the first entry matching `descriptor`.
    #[must_use]
    pub fn find(&self, descriptor: &StreamDescriptor) -> Option<&CatalogEntry> {
        self.streams.iter().find(|entry| entry.descriptor() == descriptor)
    }

    /// Indexes entries by descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateStream`] when a descriptor appears twice.
    pub fn index(&self) -> Result<BTreeMap<&StreamDescriptor, &CatalogEntry>, CatalogError> {
        let mut index = BTreeMap::new();
        for entry in &self.streams {
            if index.insert(entry.descriptor(), entry).is_some() {
                return Err(CatalogError::DuplicateStream(entry.descriptor().to_string()));
            }
        }
        Ok(index)
    }

    /// Validates catalog invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog is malformed.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.index().map(|_| ())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The same stream descriptor appears more than once.
    #[error("duplicate stream descriptor: {0}")]
    DuplicateStream(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
