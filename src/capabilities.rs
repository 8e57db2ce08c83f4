//! Answers which optional write features the connected server supports.

use serde::Deserialize;

use crate::{bson::Document, error::Result};

/// The first wire version (MongoDB 3.2) accepting `bypassDocumentValidation`.
pub const DOCUMENT_VALIDATION_MIN_WIRE_VERSION: i32 = 4;

/// The first wire version (MongoDB 3.4) accepting `collation` on write statements.
pub const COLLATION_MIN_WIRE_VERSION: i32 = 5;

/// A probe reporting whether the server a bulk write will run against accepts optional
/// write features. Discovering the capabilities is the driver's job; this crate only asks.
pub trait ServerCapabilities {
    /// Whether update and delete statements may carry a collation.
    fn supports_collation(&self) -> bool;

    /// Whether writes may set `bypassDocumentValidation`.
    fn supports_document_validation(&self) -> bool;
}

impl<T: ServerCapabilities + ?Sized> ServerCapabilities for &T {
    fn supports_collation(&self) -> bool {
        (**self).supports_collation()
    }

    fn supports_document_validation(&self) -> bool {
        (**self).supports_document_validation()
    }
}

/// Capabilities derived from the maximum wire version a server advertises in its `hello` reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireVersionCapabilities {
    max_wire_version: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelloReply {
    max_wire_version: Option<i32>,
}

impl WireVersionCapabilities {
    /// Capabilities of a server advertising `max_wire_version`.
    pub fn new(max_wire_version: i32) -> Self {
        Self { max_wire_version }
    }

    /// Reads `maxWireVersion` from a `hello` (or legacy hello) reply. Servers omitting it predate
    /// wire versioning and are treated as version 0.
    pub fn from_hello(reply: &Document) -> Result<Self> {
        let reply: HelloReply = crate::bson::from_document(reply.clone())?;
        Ok(Self::new(reply.max_wire_version.unwrap_or(0)))
    }

    /// The advertised maximum wire version.
    pub fn max_wire_version(&self) -> i32 {
        self.max_wire_version
    }
}

impl ServerCapabilities for WireVersionCapabilities {
    fn supports_collation(&self) -> bool {
        self.max_wire_version >= COLLATION_MIN_WIRE_VERSION
    }

    fn supports_document_validation(&self) -> bool {
        self.max_wire_version >= DOCUMENT_VALIDATION_MIN_WIRE_VERSION
    }
}

/// Fixed capability answers. The default supports everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticCapabilities {
    /// Answer for [`ServerCapabilities::supports_collation`].
    pub collation: bool,

    /// Answer for [`ServerCapabilities::supports_document_validation`].
    pub document_validation: bool,
}

impl Default for StaticCapabilities {
    fn default() -> Self {
        Self {
            collation: true,
            document_validation: true,
        }
    }
}

impl ServerCapabilities for StaticCapabilities {
    fn supports_collation(&self) -> bool {
        self.collation
    }

    fn supports_document_validation(&self) -> bool {
        self.document_validation
    }
}

/// The answers of a probe, captured when a compile pass starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FeatureSupport {
    pub(crate) collation: bool,
    pub(crate) document_validation: bool,
}

impl FeatureSupport {
    pub(crate) fn probe(server: &(impl ServerCapabilities + ?Sized)) -> Self {
        Self {
            collation: server.supports_collation(),
            document_validation: server.supports_document_validation(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bson::doc;

    #[test]
    fn wire_version_thresholds() {
        let old = WireVersionCapabilities::new(3);
        assert!(!old.supports_document_validation());
        assert!(!old.supports_collation());

        let validation_only = WireVersionCapabilities::new(4);
        assert!(validation_only.supports_document_validation());
        assert!(!validation_only.supports_collation());

        let modern = WireVersionCapabilities::new(25);
        assert!(modern.supports_document_validation());
        assert!(modern.supports_collation());
    }

    #[test]
    fn from_hello_reply() {
        let caps = WireVersionCapabilities::from_hello(&doc! {
            "isWritablePrimary": true,
            "minWireVersion": 0,
            "maxWireVersion": 21,
        })
        .unwrap();
        assert_eq!(caps.max_wire_version(), 21);

        let caps = WireVersionCapabilities::from_hello(&doc! { "ismaster": true }).unwrap();
        assert_eq!(caps.max_wire_version(), 0);
        assert!(!caps.supports_collation());

        assert!(WireVersionCapabilities::from_hello(&doc! { "maxWireVersion": "21" }).is_err());
    }

    #[test]
    fn probe_snapshot() {
        let support = FeatureSupport::probe(&StaticCapabilities {
            collation: false,
            document_validation: true,
        });
        assert!(!support.collation);
        assert!(support.document_validation);
        assert_eq!(
            FeatureSupport::probe(&StaticCapabilities::default()),
            FeatureSupport {
                collation: true,
                document_validation: true
            }
        );
    }
}
