//! # mast-query
//!
//! The queryable-node layer of Mast. One chainable API covers DOM-element
//! traversal and plain object/array traversal:
//!
//! - [`Value`]: tagged variants for everything a node can wrap
//! - [`DomElement`]/[`DomDocument`]: the minimal capability contract an
//!   external markup parser or rendering-engine adapter implements
//! - [`Document`]: what the fetch collaborator hands over, already parsed
//! - [`Response`]: owns one document, dispatches selection, and carries
//!   the assertion sink shared with the owning scenario's log
//! - [`Node`]: an immutable chainable wrapper around one traversed value
//!
//! Data with no native tree structure (JSON objects and arrays) gets
//! synthesized parent/child/sibling relationships from the dotted
//! selection path recorded at selection time, so callers traverse it the
//! same way they traverse markup.

mod document;
mod element;
mod node;
mod response;
mod value;

pub use document::{join_path, resolve_path, split_path, Document, DomDocument};
pub use element::{DomElement, ElementHandle, ElementSet};
pub use node::{Navigable, Node, SelectionContext};
pub use response::{AssertionSink, Response, ResponseMeta};
pub use value::Value;
