//! # Utility Modules
//!
//! Supporting utilities for the packet codec.
//!
//! ## Components
//! - **Name Cache**: bounded per-connection interning of resource-name bytes

pub mod name_cache;

// Re-export public types for advanced users
pub use name_cache::NameCache;
