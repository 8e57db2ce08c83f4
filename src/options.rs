//! Contains the option structs consumed by the compiler and passed through to accumulators.

use derive_more::From;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use typed_builder::TypedBuilder;

use crate::{
    bson::{Bson, Document},
    error::{Error, Result},
};

pub use crate::collation::{
    Collation,
    CollationAlternate,
    CollationCaseFirst,
    CollationMaxVariable,
    CollationStrength,
};

/// The option keys accepted by [`BulkWriteOptions::from_document`], in sorted order.
pub const BULK_WRITE_OPTION_KEYS: [&str; 2] = ["bypassDocumentValidation", "ordered"];

/// Options applied to a whole bulk write.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(default, setter(into)))]
#[non_exhaustive]
pub struct BulkWriteOptions {
    /// Whether the server should stop at the first failed write. Defaults to `true`.
    pub ordered: Option<bool>,

    /// Opt out of document-level validation. Requires server support, which is checked when the
    /// accumulator is created.
    pub bypass_document_validation: Option<bool>,
}

impl BulkWriteOptions {
    /// Parses options out of a document, rejecting any key other than those in
    /// [`BULK_WRITE_OPTION_KEYS`].
    pub fn from_document(options: Document) -> Result<Self> {
        let unknown: Vec<&str> = options
            .keys()
            .map(String::as_str)
            .filter(|key| !BULK_WRITE_OPTION_KEYS.contains(key))
            .collect();
        if !unknown.is_empty() {
            return Err(Error::invalid_argument(format!(
                "unknown bulk write option(s) {}; allowed options are {}",
                quoted_list(unknown.iter().copied()),
                quoted_list(BULK_WRITE_OPTION_KEYS.iter().copied()),
            )));
        }

        crate::bson::from_document(options)
            .map_err(|e| Error::invalid_argument(format!("invalid bulk write options: {e}")))
    }

    /// Whether the writes are ordered, applying the server default when unset.
    pub fn is_ordered(&self) -> bool {
        self.ordered.unwrap_or(true)
    }

    /// Whether document validation bypass was explicitly requested.
    pub fn bypasses_document_validation(&self) -> bool {
        self.bypass_document_validation == Some(true)
    }
}

impl TryFrom<Document> for BulkWriteOptions {
    type Error = Error;

    fn try_from(options: Document) -> Result<Self> {
        Self::from_document(options)
    }
}

pub(crate) fn quoted_list<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    keys.map(|key| format!("\"{key}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The modifications to apply during an update.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, From)]
#[serde(untagged)]
#[non_exhaustive]
pub enum UpdateModifications {
    /// A document that contains only update operator expressions.
    Document(Document),

    /// An aggregation pipeline.
    Pipeline(Vec<Document>),
}

impl UpdateModifications {
    pub(crate) fn to_bson(&self) -> Bson {
        match self {
            UpdateModifications::Document(d) => Bson::Document(d.clone()),
            UpdateModifications::Pipeline(p) => {
                Bson::Array(p.iter().cloned().map(Bson::Document).collect())
            }
        }
    }
}

/// Specifies the index to use for a statement.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, From)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Hint {
    /// The keys of the index to use.
    Keys(Document),

    /// The name of the index to use.
    Name(String),
}

impl Hint {
    pub(crate) fn from_bson(value: &Bson) -> Result<Self> {
        match value {
            Bson::Document(keys) => Ok(Hint::Keys(keys.clone())),
            Bson::String(name) => Ok(Hint::Name(name.clone())),
            other => Err(Error::invalid_argument(format!(
                "expected \"hint\" option to be a string or document, found {}",
                crate::bson_util::type_name(other)
            ))),
        }
    }
}

/// Options for a single update statement handed to an accumulator.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(default, setter(into)))]
#[non_exhaustive]
pub struct UpdateOptions {
    /// Whether the update applies to every matching document.
    pub multi: bool,

    /// Insert a document if nothing matches the filter.
    pub upsert: Option<bool>,

    /// The collation to use when matching.
    pub collation: Option<Collation>,

    /// Filters selecting which array elements an update operator applies to.
    pub array_filters: Option<Vec<Document>>,

    /// The index to use.
    pub hint: Option<Hint>,
}

/// Options for a single delete statement handed to an accumulator.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(default, setter(into)))]
#[non_exhaustive]
pub struct DeleteOptions {
    /// Whether every matching document is removed, rather than only the first.
    #[serde(skip)]
    pub multi: bool,

    /// The collation to use when matching.
    pub collation: Option<Collation>,

    /// The index to use.
    pub hint: Option<Hint>,
}

impl DeleteOptions {
    /// The `limit` value of the delete statement: 0 removes all matches, 1 removes one.
    pub fn limit(&self) -> i32 {
        if self.multi {
            0
        } else {
            1
        }
    }
}
