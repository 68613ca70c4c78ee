//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and matrix builders
//! - Handle types for the node arena
//! - Logging initialisation

pub mod math;
pub mod collections;
pub mod logging;
