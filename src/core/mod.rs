//! # Core Module
//!
//! This module provides the concurrency primitives used throughout the engine.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `MtWeak`: Non-owning counterpart of `MtResource`, used for back-links
//!
//! ## Usage
//! ```rust
//! use voxel_engine::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//!
//! let weak = counter.downgrade();
//! assert!(weak.upgrade().is_some());
//! ```

pub mod mt_resource;

pub use mt_resource::{MtResource, MtWeak};
