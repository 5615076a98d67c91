//! # Hermes Serializer
//!
//! Turns model instances into JSON:API documents.
//!
//! [`Serializer`] reads identity, attributes and relationship linkage through
//! each resource's [`Store`](hermes_core::Store), applies sparse fieldsets,
//! and assembles compound documents: everything named by the resolved include
//! tree lands in `included`, once, in discovery order.
//!
//! | Operation | Primary data |
//! |-----------|--------------|
//! | [`Serializer::dump`] | one resource object |
//! | [`Serializer::dump_many`] | an ordered list of resource objects |
//! | [`Serializer::dump_related`] | the related object(s), or `null` |
//! | [`Serializer::dump_relationship`] | resource linkage |

#![doc(html_root_url = "https://docs.rs/hermes-serializer/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod inclusion;
mod serializer;

pub use serializer::Serializer;
