//! Write models: the description of a single write before it is compiled.

#[cfg(test)]
mod test;

use std::fmt::Debug;

use derive_more::From;

use crate::{
    bson::{Bson, Document},
    bson_util::{self, replacement_document_check, update_document_check},
    error::{Error, Result},
    options::{quoted_list, Collation, DeleteOptions, Hint, UpdateModifications, UpdateOptions},
};

/// A document that can be inserted by a bulk write.
///
/// `Document` implements this with defaults: its identifier lives in its `_id` field and a
/// generated identifier is not written back. Types that manage their own identifier can
/// override [`declares_id`](Insertable::declares_id), [`id`](Insertable::id) and
/// [`assign_id`](Insertable::assign_id).
pub trait Insertable: Debug + Send + Sync {
    /// The map form of this document, as handed to the accumulator.
    fn to_document(&self) -> Result<Document>;

    /// The identifier carried as a native attribute, consulted when the map form has no `_id`.
    fn id(&self) -> Option<Bson> {
        None
    }

    /// Whether this type exposes its own identifier accessor. Such documents are expected to
    /// carry an identifier already, so an identifier generated by the accumulator is an error.
    fn declares_id(&self) -> bool {
        false
    }

    /// Stores an identifier generated by the accumulator. Returns `false` if the type does not
    /// accept one.
    fn assign_id(&mut self, _id: &Bson) -> bool {
        false
    }
}

impl Insertable for Document {
    fn to_document(&self) -> Result<Document> {
        Ok(self.clone())
    }
}

/// The operations a write model may dispatch to. Implemented by
/// [`BulkWriteCompiler`](crate::BulkWriteCompiler); the compiler only accepts these calls while
/// it is compiling.
pub trait WriteTarget {
    /// Inserts a document, returning its identifier.
    fn insert(&mut self, document: &mut dyn Insertable) -> Result<Bson>;

    /// Adds an update statement.
    fn update(
        &mut self,
        filter: Document,
        update: UpdateModifications,
        options: UpdateOptions,
    ) -> Result<()>;

    /// Adds a delete statement.
    fn delete(&mut self, filter: Document, options: DeleteOptions) -> Result<()>;
}

/// A single write operation.
#[derive(Debug)]
#[non_exhaustive]
pub enum WriteModel {
    #[non_exhaustive]
    #[allow(missing_docs)]
    InsertOne { document: Box<dyn Insertable> },
    #[non_exhaustive]
    #[allow(missing_docs)]
    UpdateOne {
        filter: Document,
        update: UpdateModifications,
        array_filters: Option<Vec<Document>>,
        collation: Option<Collation>,
        hint: Option<Hint>,
        upsert: Option<bool>,
    },
    #[non_exhaustive]
    #[allow(missing_docs)]
    UpdateMany {
        filter: Document,
        update: UpdateModifications,
        array_filters: Option<Vec<Document>>,
        collation: Option<Collation>,
        hint: Option<Hint>,
        upsert: Option<bool>,
    },
    #[non_exhaustive]
    #[allow(missing_docs)]
    ReplaceOne {
        filter: Document,
        replacement: Document,
        collation: Option<Collation>,
        hint: Option<Hint>,
        upsert: Option<bool>,
    },
    #[non_exhaustive]
    #[allow(missing_docs)]
    DeleteOne {
        filter: Document,
        collation: Option<Collation>,
        hint: Option<Hint>,
    },
    #[non_exhaustive]
    #[allow(missing_docs)]
    DeleteMany {
        filter: Document,
        collation: Option<Collation>,
        hint: Option<Hint>,
    },
}

impl WriteModel {
    /// Inserts `document`.
    pub fn insert_one(document: impl Insertable + 'static) -> Self {
        Self::InsertOne {
            document: Box::new(document),
        }
    }

    /// Updates the first document matching `filter`.
    pub fn update_one(filter: Document, update: impl Into<UpdateModifications>) -> Self {
        Self::UpdateOne {
            filter,
            update: update.into(),
            array_filters: None,
            collation: None,
            hint: None,
            upsert: None,
        }
    }

    /// Updates every document matching `filter`.
    pub fn update_many(filter: Document, update: impl Into<UpdateModifications>) -> Self {
        Self::UpdateMany {
            filter,
            update: update.into(),
            array_filters: None,
            collation: None,
            hint: None,
            upsert: None,
        }
    }

    /// Replaces the first document matching `filter`.
    pub fn replace_one(filter: Document, replacement: Document) -> Self {
        Self::ReplaceOne {
            filter,
            replacement,
            collation: None,
            hint: None,
            upsert: None,
        }
    }

    /// Deletes the first document matching `filter`.
    pub fn delete_one(filter: Document) -> Self {
        Self::DeleteOne {
            filter,
            collation: None,
            hint: None,
        }
    }

    /// Deletes every document matching `filter`.
    pub fn delete_many(filter: Document) -> Self {
        Self::DeleteMany {
            filter,
            collation: None,
            hint: None,
        }
    }

    /// Sets the collation of an update, replace or delete. Ignored for inserts.
    pub fn with_collation(mut self, value: Collation) -> Self {
        match &mut self {
            Self::UpdateOne { collation, .. }
            | Self::UpdateMany { collation, .. }
            | Self::ReplaceOne { collation, .. }
            | Self::DeleteOne { collation, .. }
            | Self::DeleteMany { collation, .. } => *collation = Some(value),
            Self::InsertOne { .. } => {}
        }
        self
    }

    /// Sets the index hint of an update, replace or delete. Ignored for inserts.
    pub fn with_hint(mut self, value: impl Into<Hint>) -> Self {
        match &mut self {
            Self::UpdateOne { hint, .. }
            | Self::UpdateMany { hint, .. }
            | Self::ReplaceOne { hint, .. }
            | Self::DeleteOne { hint, .. }
            | Self::DeleteMany { hint, .. } => *hint = Some(value.into()),
            Self::InsertOne { .. } => {}
        }
        self
    }

    /// Sets whether an update or replace inserts when nothing matches. Ignored otherwise.
    pub fn with_upsert(mut self, value: bool) -> Self {
        if let Self::UpdateOne { upsert, .. }
        | Self::UpdateMany { upsert, .. }
        | Self::ReplaceOne { upsert, .. } = &mut self
        {
            *upsert = Some(value);
        }
        self
    }

    /// Sets the array filters of an update. Ignored otherwise.
    pub fn with_array_filters(mut self, value: Vec<Document>) -> Self {
        if let Self::UpdateOne { array_filters, .. } | Self::UpdateMany { array_filters, .. } =
            &mut self
        {
            *array_filters = Some(value);
        }
        self
    }

    /// The name of the operation in the raw `{ <name>: [args] }` form.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::InsertOne { .. } => "insertOne",
            Self::UpdateOne { .. } => "updateOne",
            Self::UpdateMany { .. } => "updateMany",
            Self::ReplaceOne { .. } => "replaceOne",
            Self::DeleteOne { .. } => "deleteOne",
            Self::DeleteMany { .. } => "deleteMany",
        }
    }

    /// Pushes this model into `target` through exactly one of its insert, update or delete
    /// operations.
    pub fn write_to(&mut self, target: &mut dyn WriteTarget) -> Result<()> {
        let multi = matches!(self, Self::UpdateMany { .. } | Self::DeleteMany { .. });
        match self {
            Self::InsertOne { document } => {
                target.insert(document.as_mut())?;
            }
            Self::UpdateOne {
                filter,
                update,
                array_filters,
                collation,
                hint,
                upsert,
            }
            | Self::UpdateMany {
                filter,
                update,
                array_filters,
                collation,
                hint,
                upsert,
            } => {
                if let UpdateModifications::Document(update_document) = update {
                    update_document_check(update_document)?;
                }
                target.update(
                    filter.clone(),
                    update.clone(),
                    UpdateOptions {
                        multi,
                        upsert: *upsert,
                        collation: collation.clone(),
                        array_filters: array_filters.clone(),
                        hint: hint.clone(),
                    },
                )?;
            }
            Self::ReplaceOne {
                filter,
                replacement,
                collation,
                hint,
                upsert,
            } => {
                replacement_document_check(replacement)?;
                target.update(
                    filter.clone(),
                    UpdateModifications::Document(replacement.clone()),
                    UpdateOptions {
                        multi: false,
                        upsert: *upsert,
                        collation: collation.clone(),
                        array_filters: None,
                        hint: hint.clone(),
                    },
                )?;
            }
            Self::DeleteOne {
                filter,
                collation,
                hint,
            }
            | Self::DeleteMany {
                filter,
                collation,
                hint,
            } => {
                target.delete(
                    filter.clone(),
                    DeleteOptions {
                        multi,
                        collation: collation.clone(),
                        hint: hint.clone(),
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Parses the raw `{ <operationName>: [args...] }` form found at `position`:
    ///
    /// * `{ insertOne: [document] }`
    /// * `{ updateOne | updateMany: [filter, update, options?] }`
    /// * `{ replaceOne: [filter, replacement, options?] }`
    /// * `{ deleteOne | deleteMany: [filter, options?] }`
    pub fn from_operation(operation: &Bson, position: usize) -> Result<Self> {
        let Bson::Document(operation) = operation else {
            return Err(Error::invalid_argument(format!(
                "expected a write model at position {position}, found {}",
                bson_util::type_name(operation)
            )));
        };
        let mut entries = operation.iter();
        let (name, args) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(Error::invalid_argument(format!(
                    "expected a single operation name at position {position}, found {} keys",
                    operation.len()
                )))
            }
        };
        let Bson::Array(args) = args else {
            return Err(Error::invalid_argument(format!(
                "expected arguments of \"{name}\" at position {position} to be an array, found {}",
                bson_util::type_name(args)
            )));
        };
        let args = OperationArgs {
            name,
            position,
            args,
        };

        let model = match name.as_str() {
            "insertOne" => Self::insert_one(args.document(0, "document")?),
            "updateOne" | "updateMany" => {
                let filter = args.document(0, "filter")?;
                let update = match args.required(1, "update")? {
                    Bson::Document(update) => UpdateModifications::Document(update.clone()),
                    Bson::Array(stages) => UpdateModifications::Pipeline(
                        stages
                            .iter()
                            .map(|stage| match stage {
                                Bson::Document(stage) => Ok(stage.clone()),
                                other => Err(args.type_error("update", "a pipeline stage", other)),
                            })
                            .collect::<Result<_>>()?,
                    ),
                    other => return Err(args.type_error("update", "a document or array", other)),
                };
                let options = args.options(2, UPDATE_OPTION_KEYS)?;
                let model = if name == "updateOne" {
                    Self::update_one(filter, update)
                } else {
                    Self::update_many(filter, update)
                };
                let model = match options.get("arrayFilters") {
                    Some(Bson::Array(filters)) => model.with_array_filters(
                        filters
                            .iter()
                            .map(|filter| match filter {
                                Bson::Document(filter) => Ok(filter.clone()),
                                other => Err(args.type_error("arrayFilters", "a document", other)),
                            })
                            .collect::<Result<_>>()?,
                    ),
                    Some(other) => return Err(args.type_error("arrayFilters", "an array", other)),
                    None => model,
                };
                args.apply_common_options(model, &options, true)?
            }
            "replaceOne" => {
                let model =
                    Self::replace_one(args.document(0, "filter")?, args.document(1, "replacement")?);
                let options = args.options(2, REPLACE_OPTION_KEYS)?;
                args.apply_common_options(model, &options, true)?
            }
            "deleteOne" | "deleteMany" => {
                let filter = args.document(0, "filter")?;
                let model = if name == "deleteOne" {
                    Self::delete_one(filter)
                } else {
                    Self::delete_many(filter)
                };
                let options = args.options(1, DELETE_OPTION_KEYS)?;
                args.apply_common_options(model, &options, false)?
            }
            other => {
                return Err(Error::invalid_argument(format!(
                    "unknown operation type \"{other}\" at position {position}"
                )))
            }
        };
        Ok(model)
    }
}

const UPDATE_OPTION_KEYS: &[&str] = &["arrayFilters", "collation", "hint", "upsert"];
const REPLACE_OPTION_KEYS: &[&str] = &["collation", "hint", "upsert"];
const DELETE_OPTION_KEYS: &[&str] = &["collation", "hint"];

struct OperationArgs<'a> {
    name: &'a str,
    position: usize,
    args: &'a [Bson],
}

impl OperationArgs<'_> {
    fn required(&self, index: usize, what: &str) -> Result<&Bson> {
        self.args.get(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "missing {what} argument for \"{}\" at position {}",
                self.name, self.position
            ))
        })
    }

    fn document(&self, index: usize, what: &str) -> Result<Document> {
        match self.required(index, what)? {
            Bson::Document(document) => Ok(document.clone()),
            other => Err(self.type_error(what, "a document", other)),
        }
    }

    fn options(&self, index: usize, allowed: &[&str]) -> Result<Document> {
        let options = match self.args.get(index) {
            None | Some(Bson::Null) => return Ok(Document::new()),
            Some(Bson::Document(options)) => options,
            Some(other) => return Err(self.type_error("options", "a document", other)),
        };

        let unknown: Vec<&str> = options
            .keys()
            .map(String::as_str)
            .filter(|key| !allowed.contains(key))
            .collect();
        if !unknown.is_empty() {
            return Err(Error::invalid_argument(format!(
                "unknown option(s) {} for \"{}\" at position {}; allowed options are {}",
                quoted_list(unknown.iter().copied()),
                self.name,
                self.position,
                quoted_list(allowed.iter().copied()),
            )));
        }
        Ok(options.clone())
    }

    fn type_error(&self, what: &str, expected: &str, found: &Bson) -> Error {
        Error::invalid_argument(format!(
            "expected {what} of \"{}\" at position {} to be {expected}, found {}",
            self.name,
            self.position,
            bson_util::type_name(found)
        ))
    }

    fn apply_common_options(
        &self,
        mut model: WriteModel,
        options: &Document,
        accepts_upsert: bool,
    ) -> Result<WriteModel> {
        if let Some(collation) = options.get("collation") {
            model = model.with_collation(Collation::from_bson(collation)?);
        }
        if let Some(hint) = options.get("hint") {
            model = model.with_hint(Hint::from_bson(hint)?);
        }
        if accepts_upsert {
            match options.get("upsert") {
                Some(Bson::Boolean(upsert)) => model = model.with_upsert(*upsert),
                Some(other) => return Err(self.type_error("upsert", "a boolean", other)),
                None => {}
            }
        }
        Ok(model)
    }
}

/// An element of a bulk write: either a typed model or a raw operation value that is converted
/// when the element is compiled.
#[derive(Debug, From)]
pub enum WriteModelEntry {
    /// A typed write model.
    Model(WriteModel),

    /// A raw `{ <operationName>: [args...] }` value. See [`WriteModel::from_operation`].
    Operation(Bson),
}

impl From<Document> for WriteModelEntry {
    fn from(operation: Document) -> Self {
        Self::Operation(Bson::Document(operation))
    }
}

impl WriteModelEntry {
    /// Dispatches this entry into `target`, converting a raw operation first.
    pub(crate) fn write_to(&mut self, position: usize, target: &mut dyn WriteTarget) -> Result<()> {
        match self {
            Self::Model(model) => model.write_to(target),
            Self::Operation(operation) => {
                WriteModel::from_operation(operation, position)?.write_to(target)
            }
        }
    }
}
