#![deny(missing_docs)]

//! # uavlink objects
//!
//! Self-describing telemetry objects for a ground ↔ flight telemetry link.
//!
//! Every object carries its application data plus an attached metadata
//! object that says how the data is accessed, transmitted, acknowledged and
//! logged on each side of the link.
//!
//! ## Object hierarchy
//!
//! ```text
//! UavObject (trait)
//! ├── DataObject            schema-driven record, even object id
//! │   └── Metadata          created on first access, id = parent | 1
//! └── Metadata              policy record, never has metadata of its own
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`object`] | The `UavObject` trait, identity helpers, timestamps |
//! | [`data_object`] | `DataObject`, the field-ordered data record |
//! | [`metadata`] | `Metadata`, its policy types and the 19-byte codec |
//! | [`modes`] | `AccessMode` and `UpdateMode` |
//! | [`field`] | Field types, descriptions and values |
//! | [`definition`] | `ObjectDefinition`, the schema record of an object |
//! | [`listener`] | Change notification channel |
//! | [`registry`] | In-memory object registry keyed by object id |

pub mod clock;
pub mod data_object;
pub mod definition;
pub mod error;
pub mod field;
pub mod listener;
pub mod metadata;
pub mod modes;
pub mod object;
pub mod registry;

// Re-export all public types at crate root for convenience.
pub use data_object::*;
pub use definition::*;
pub use error::*;
pub use field::*;
pub use listener::*;
pub use metadata::*;
pub use modes::*;
pub use object::*;
pub use registry::*;
