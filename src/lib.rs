//! This crate compiles a list of MongoDB write models into the calls a driver's bulk write
//! accumulator expects. It uses the [`bson`] crate for BSON support.
//!
//! A [`BulkWriteCompiler`] is created from the write models and the options of a bulk write.
//! Compiling it walks the models once, in order. Each model dispatches itself to exactly one of
//! the compiler's insert, update or delete operations, which check the options in play against
//! what the server supports and then forward the write to a [`BulkAccumulator`]. The compiler
//! remembers the identifier of every inserted document, keyed by the position of the write.
//!
//! # Installation
//!
//! ```toml
//! [dependencies]
//! mongodb-bulk-compiler = "0.1.0"
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! # fn main() -> mongodb_bulk_compiler::error::Result<()> {
//! use mongodb_bulk_compiler::{
//!     bson::doc,
//!     BulkWriteCompiler,
//!     WireVersionCapabilities,
//!     WriteModel,
//!     WriteModelEntry,
//! };
//!
//! // Models may be typed or given in their raw `{ <operation>: [args] }` form.
//! let models: Vec<WriteModelEntry> = vec![
//!     WriteModel::insert_one(doc! { "title": "Dune" }).into(),
//!     doc! { "updateMany": [{ "year": { "$lt": 1970 } }, { "$set": { "classic": true } }] }
//!         .into(),
//! ];
//!
//! let mut compiler: BulkWriteCompiler = BulkWriteCompiler::new(models, doc! { "ordered": false })?;
//!
//! // The capabilities usually come from the server's `hello` reply.
//! let server = WireVersionCapabilities::from_hello(&doc! { "maxWireVersion": 21 })?;
//! let accumulator = compiler.compile(&server)?;
//!
//! for command in accumulator.to_commands("books") {
//!     println!("{}", command);
//! }
//! println!("inserted: {:?}", compiler.inserted_ids());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature            | Description                                                                  | Default |
//! |:-------------------|:-----------------------------------------------------------------------------|:--------|
//! | `tracing-unstable` | Emit [`tracing`](https://docs.rs/tracing) events under the `mongodb_bulk_compiler::compile` target. | no |

#![warn(missing_docs)]
#![cfg_attr(docsrs, warn(rustdoc::missing_crate_level_docs))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod options;

pub use ::bson;

mod accumulator;
mod bson_util;
mod capabilities;
mod collation;
mod compiler;
pub mod error;
pub mod event;
mod model;
#[cfg(test)]
mod test;
mod trace;

pub use crate::{
    accumulator::{BulkAccumulator, OpsAccumulator, StatementKind, WriteStatement},
    capabilities::{
        ServerCapabilities,
        StaticCapabilities,
        WireVersionCapabilities,
        COLLATION_MIN_WIRE_VERSION,
        DOCUMENT_VALIDATION_MIN_WIRE_VERSION,
    },
    compiler::{BulkWriteCompiler, WriteModels},
    model::{Insertable, WriteModel, WriteModelEntry, WriteTarget},
};
