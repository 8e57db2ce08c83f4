use crate::{
    bson::{oid::ObjectId, spec::ElementType, Bson, Document},
    error::{Error, Result},
};

pub(crate) fn first_key(document: &Document) -> Option<&str> {
    document.keys().next().map(String::as_str)
}

pub(crate) fn replacement_document_check(replacement: &Document) -> Result<()> {
    match first_key(replacement) {
        Some(s) if s.starts_with('$') => Err(Error::invalid_argument(
            "replace document must have first key not starting with '$'",
        )),
        _ => Ok(()),
    }
}

pub(crate) fn update_document_check(update: &Document) -> Result<()> {
    match first_key(update) {
        Some(s) if s.starts_with('$') => Ok(()),
        _ => Err(Error::invalid_argument(
            "update document must have first key starting with '$'",
        )),
    }
}

/// Returns the `_id` of the document, generating an `ObjectId` and placing it first if the
/// document has none. The second element is true if the id was generated.
pub(crate) fn get_or_prepend_id_field(document: &mut Document) -> (Bson, bool) {
    if let Some(id) = document.get("_id") {
        return (id.clone(), false);
    }

    let id = Bson::ObjectId(ObjectId::new());
    let rest = std::mem::take(document);
    document.insert("_id", id.clone());
    document.extend(rest);
    (id, true)
}

/// A lowercase name for a BSON type as it appears in error messages.
pub(crate) fn type_name(value: &Bson) -> &'static str {
    match value.element_type() {
        ElementType::Double => "double",
        ElementType::String => "string",
        ElementType::EmbeddedDocument => "document",
        ElementType::Array => "array",
        ElementType::Binary => "binData",
        ElementType::Undefined => "undefined",
        ElementType::ObjectId => "objectId",
        ElementType::Boolean => "bool",
        ElementType::DateTime => "date",
        ElementType::Null => "null",
        ElementType::RegularExpression => "regex",
        ElementType::DbPointer => "dbPointer",
        ElementType::JavaScriptCode => "javascript",
        ElementType::Symbol => "symbol",
        ElementType::JavaScriptCodeWithScope => "javascriptWithScope",
        ElementType::Int32 => "int",
        ElementType::Timestamp => "timestamp",
        ElementType::Int64 => "long",
        ElementType::Decimal128 => "decimal",
        ElementType::MaxKey => "maxKey",
        ElementType::MinKey => "minKey",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bson::doc;

    #[test]
    fn update_and_replacement_checks() {
        assert!(update_document_check(&doc! { "$set": { "a": 1 } }).is_ok());
        assert!(update_document_check(&doc! { "a": 1 }).is_err());
        assert!(update_document_check(&doc! {}).is_err());

        assert!(replacement_document_check(&doc! { "a": 1 }).is_ok());
        assert!(replacement_document_check(&doc! {}).is_ok());
        assert!(replacement_document_check(&doc! { "$set": { "a": 1 } }).is_err());
    }

    #[test]
    fn prepends_generated_id() {
        let mut document = doc! { "x": 1 };
        let (id, generated) = get_or_prepend_id_field(&mut document);
        assert!(generated);
        assert!(matches!(id, Bson::ObjectId(_)));
        assert_eq!(first_key(&document), Some("_id"));
        assert_eq!(document.get("_id"), Some(&id));
        assert_eq!(document.get_i32("x").unwrap(), 1);

        let mut document = doc! { "x": 1, "_id": "mine" };
        let (id, generated) = get_or_prepend_id_field(&mut document);
        assert!(!generated);
        assert_eq!(id, Bson::String("mine".to_string()));
        assert_eq!(first_key(&document), Some("x"));
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(&Bson::String("s".into())), "string");
        assert_eq!(type_name(&Bson::Int32(1)), "int");
        assert_eq!(type_name(&Bson::Null), "null");
        assert_eq!(type_name(&Bson::Document(doc! {})), "document");
    }
}
