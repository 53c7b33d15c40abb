//! # bui_component
//!
//! Identity types shared by every process taking part in bound-interface
//! synchronisation.
//!
//! This crate provides:
//!
//! - [`EntityId`]: lightweight `u64` entity identifiers.
//! - [`EntityAllocator`]: monotonically increasing ID allocator.
//! - [`ComponentId`]: per-entity network id of a component.
//! - [`InterfaceKey`]: tagged key distinguishing interfaces on one entity.
//! - [`ComponentDirectory`]: the entity/component store seen as a lookup.

pub mod component;
pub mod directory;
pub mod entity;

pub use component::{ComponentId, InterfaceKey, stable_hash};
pub use directory::{ComponentDirectory, DirectoryError, InMemoryDirectory};
pub use entity::{EntityAllocator, EntityId};
