// crates/syncward-config/src/lib.rs
// ============================================================================
// Module: Syncward Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for syncward.toml semantics.
// Dependencies: syncward-core, serde, toml
// ============================================================================

//! ## Overview
//! `syncward-config` defines the configuration model for Syncward: the
//! auto-disable thresholds, the workspace gate for automatic schema
//! propagation, and logging settings. Loading is strict and fails closed on
//! unknown keys, oversized files, and out-of-range values.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
