use std::convert::TryFrom;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    bson::{Bson, Document},
    error::{Error, Result},
};

/// A collation attached to an update or delete statement. See the official MongoDB
/// [documentation](https://www.mongodb.com/docs/manual/reference/collation/) for the meaning of
/// each field.
///
/// Collation is only available on servers that report support for it through
/// [`ServerCapabilities::supports_collation`](crate::ServerCapabilities::supports_collation).
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(default, setter(into)))]
#[non_exhaustive]
pub struct Collation {
    /// The ICU locale.
    #[builder(!default)]
    pub locale: String,

    /// The level of comparison to perform.
    pub strength: Option<CollationStrength>,

    /// Whether to include a separate level for case differences.
    pub case_level: Option<bool>,

    /// The sort order of case differences during tertiary level comparisons.
    pub case_first: Option<CollationCaseFirst>,

    /// Whether to compare numeric strings as numbers or strings.
    pub numeric_ordering: Option<bool>,

    /// Whether whitespace and punctuation are considered base characters.
    pub alternate: Option<CollationAlternate>,

    /// Up to which characters are considered ignorable when `alternate` is "shifted".
    pub max_variable: Option<CollationMaxVariable>,

    /// Whether to check if text requires normalization and to perform it.
    pub normalization: Option<bool>,

    /// Whether strings with diacritics sort from the back of the string.
    pub backwards: Option<bool>,
}

impl Collation {
    /// Parses a collation out of a BSON value, as found in the options of a raw operation.
    pub(crate) fn from_bson(value: &Bson) -> Result<Self> {
        match value {
            Bson::Document(document) => Self::from_document(document),
            other => Err(Error::invalid_argument(format!(
                "expected \"collation\" option to be a document, found {}",
                crate::bson_util::type_name(other)
            ))),
        }
    }

    pub(crate) fn from_document(document: &Document) -> Result<Self> {
        crate::bson::from_document(document.clone())
            .map_err(|e| Error::invalid_argument(format!("invalid collation: {e}")))
    }
}

/// The level of comparison to perform, serialized as its numeric ICU level.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[non_exhaustive]
pub enum CollationStrength {
    /// Base characters only (level 1).
    #[display("1")]
    Primary,

    /// Accents are significant (level 2).
    #[display("2")]
    Secondary,

    /// Case is significant (level 3).
    #[display("3")]
    Tertiary,

    /// Punctuation is significant (level 4).
    #[display("4")]
    Quaternary,

    /// Tiebreak on code points (level 5).
    #[display("5")]
    Identical,
}

impl From<CollationStrength> for u32 {
    fn from(strength: CollationStrength) -> Self {
        match strength {
            CollationStrength::Primary => 1,
            CollationStrength::Secondary => 2,
            CollationStrength::Tertiary => 3,
            CollationStrength::Quaternary => 4,
            CollationStrength::Identical => 5,
        }
    }
}

impl TryFrom<u32> for CollationStrength {
    type Error = Error;

    fn try_from(level: u32) -> Result<Self> {
        Ok(match level {
            1 => CollationStrength::Primary,
            2 => CollationStrength::Secondary,
            3 => CollationStrength::Tertiary,
            4 => CollationStrength::Quaternary,
            5 => CollationStrength::Identical,
            _ => {
                return Err(Error::invalid_argument(format!(
                    "invalid collation strength: {level}"
                )))
            }
        })
    }
}

/// Sort order of case differences during tertiary level comparisons.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum CollationCaseFirst {
    /// Uppercase sorts before lowercase.
    #[display("upper")]
    Upper,

    /// Lowercase sorts before uppercase.
    #[display("lower")]
    Lower,

    /// Server default.
    #[display("off")]
    Off,
}

/// Whether whitespace and punctuation are considered base characters.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum CollationAlternate {
    /// Whitespace and punctuation are base characters.
    #[display("non-ignorable")]
    NonIgnorable,

    /// Whitespace and punctuation are only distinguished above strength 3.
    #[display("shifted")]
    Shifted,
}

/// Which characters are ignorable when `alternate` is "shifted".
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum CollationMaxVariable {
    /// Whitespace and punctuation.
    #[display("punct")]
    Punct,

    /// Whitespace only.
    #[display("space")]
    Space,
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::bson::doc;

    #[test]
    fn serializes_in_server_format() {
        let collation = Collation::builder()
            .locale("de")
            .strength(CollationStrength::Secondary)
            .case_first(CollationCaseFirst::Upper)
            .alternate(CollationAlternate::NonIgnorable)
            .build();
        assert_eq!(
            serde_json::to_value(&collation).unwrap(),
            json!({
                "locale": "de",
                "strength": 2,
                "caseFirst": "upper",
                "alternate": "non-ignorable",
            })
        );
    }

    #[test]
    fn parses_raw_option() {
        let collation = Collation::from_bson(&Bson::Document(doc! {
            "locale": "fr",
            "strength": 1,
            "maxVariable": "space",
        }))
        .unwrap();
        assert_eq!(collation.strength, Some(CollationStrength::Primary));
        assert_eq!(collation.max_variable, Some(CollationMaxVariable::Space));

        assert!(Collation::from_bson(&Bson::Document(doc! { "locale": "fr", "strength": 9 }))
            .unwrap_err()
            .is_invalid_argument());
        assert!(Collation::from_bson(&Bson::Document(doc! { "strength": 1 })).is_err());
        assert!(Collation::from_bson(&Bson::String("fr".to_string())).is_err());
    }
}
