//! # Euclid Schema
//!
//! Resolves the schemas an OpenAPI document uses and validates JSON values
//! against them.
//!
//! - [`SchemaResolver`] follows `$ref` across local pointers and remote
//!   documents, fetching each document once through a [`DocumentFetcher`].
//! - The result is a [`SchemaSet`]: an arena of [`SchemaNode`]s in which a
//!   recursive definition is a cycle of [`SchemaId`]s, not a copy.
//! - [`SchemaSet::validate`] reports the first violation as a
//!   [`ValidationException`](euclid_core::ValidationException).
//!
//! Numbers are compared as exact decimals, so `0.3` is a multiple of `0.1`
//! and bounds written with many digits behave as written.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod document;
pub mod format;
pub mod model;
pub mod numeric;
mod resolver;
mod validator;

pub use document::{DefaultFetcher, DocumentFetcher, FetchError, StaticFetcher, Target};
pub use format::Format;
pub use model::{
    AdditionalProperties, ArraySchema, Combinator, CombinatorKind, ObjectSchema,
    PrimitiveSchema, PrimitiveType, SchemaArena, SchemaId, SchemaKind, SchemaNode, ValueShape,
};
pub use numeric::Decimal;
pub use resolver::{Resolution, ResolverOptions, SchemaResolver};
pub use validator::{json_equal, SchemaSet, ValidationResult};

/// URL type used for document locations.
pub use reqwest::Url;
