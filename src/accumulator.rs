//! The low-level bulk object a compile pass writes into.


use crate::{
    bson::{doc, Bson, Document},
    bson_util,
    error::Result,
    options::{BulkWriteOptions, DeleteOptions, UpdateModifications, UpdateOptions},
};

/// A driver-side collector of raw write statements that are later dispatched to the server in a
/// single bulk operation.
///
/// The compiler creates one accumulator per compile pass, on the first write, and hands it back
/// from [`BulkWriteCompiler::compile`](crate::BulkWriteCompiler::compile).
pub trait BulkAccumulator: Sized {
    /// Creates an accumulator for a bulk write using `options`.
    fn new(options: &BulkWriteOptions) -> Result<Self>;

    /// Adds a document to insert. Returns the identifier the accumulator generated for it, or
    /// `None` if the document already carried an `_id`.
    fn insert(&mut self, document: Document) -> Result<Option<Bson>>;

    /// Adds an update (or replacement) statement.
    fn update(
        &mut self,
        filter: Document,
        update: UpdateModifications,
        options: UpdateOptions,
    ) -> Result<()>;

    /// Adds a delete statement.
    fn delete(&mut self, filter: Document, options: DeleteOptions) -> Result<()>;
}

/// The kind of a write command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    /// An `insert` command.
    Insert,
    /// An `update` command.
    Update,
    /// A `delete` command.
    Delete,
}

impl StatementKind {
    /// The command name.
    pub fn command_name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn payload_name(self) -> &'static str {
        match self {
            Self::Insert => "documents",
            Self::Update => "updates",
            Self::Delete => "deletes",
        }
    }
}

/// A single statement in the shape it takes inside a write command's payload array.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteStatement {
    /// Which command the statement belongs to.
    pub kind: StatementKind,

    /// The statement itself: the document for inserts, `{ q, u, multi, .. }` for updates and
    /// `{ q, limit, .. }` for deletes.
    pub body: Document,
}

/// The default [`BulkAccumulator`]. It records statements in server command format and assigns
/// an `ObjectId` to inserted documents that lack an `_id`.
#[derive(Clone, Debug, Default)]
pub struct OpsAccumulator {
    options: BulkWriteOptions,
    statements: Vec<WriteStatement>,
}

impl OpsAccumulator {
    /// The recorded statements, in the order they were added.
    pub fn statements(&self) -> &[WriteStatement] {
        &self.statements
    }

    /// The number of recorded statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The options this accumulator was created with.
    pub fn options(&self) -> &BulkWriteOptions {
        &self.options
    }

    /// Renders the recorded statements as write commands against `collection`.
    ///
    /// Ordered writes keep their relative order, so only adjacent statements of the same kind
    /// share a command. Unordered writes are grouped per kind, in order of first appearance.
    pub fn to_commands(&self, collection: &str) -> Vec<Document> {
        let mut groups: Vec<(StatementKind, Vec<Bson>)> = Vec::new();
        for statement in &self.statements {
            let group = if self.options.is_ordered() {
                groups.last_mut().filter(|(kind, _)| *kind == statement.kind)
            } else {
                groups.iter_mut().find(|(kind, _)| *kind == statement.kind)
            };
            match group {
                Some((_, payload)) => payload.push(Bson::Document(statement.body.clone())),
                None => groups.push((
                    statement.kind,
                    vec![Bson::Document(statement.body.clone())],
                )),
            }
        }

        groups
            .into_iter()
            .map(|(kind, payload)| {
                let mut command = doc! {
                    kind.command_name(): collection,
                    kind.payload_name(): payload,
                    "ordered": self.options.is_ordered(),
                };
                if kind != StatementKind::Delete {
                    if let Some(bypass) = self.options.bypass_document_validation {
                        command.insert("bypassDocumentValidation", bypass);
                    }
                }
                command
            })
            .collect()
    }

    fn push(&mut self, kind: StatementKind, body: Document) {
        self.statements.push(WriteStatement { kind, body });
    }
}

impl BulkAccumulator for OpsAccumulator {
    fn new(options: &BulkWriteOptions) -> Result<Self> {
        Ok(Self {
            options: options.clone(),
            statements: Vec::new(),
        })
    }

    fn insert(&mut self, mut document: Document) -> Result<Option<Bson>> {
        let (id, generated) = bson_util::get_or_prepend_id_field(&mut document);
        self.push(StatementKind::Insert, document);
        Ok(generated.then_some(id))
    }

    fn update(
        &mut self,
        filter: Document,
        update: UpdateModifications,
        options: UpdateOptions,
    ) -> Result<()> {
        let mut body = doc! { "q": filter, "u": update.to_bson() };
        body.extend(crate::bson::to_document(&options)?);
        self.push(StatementKind::Update, body);
        Ok(())
    }

    fn delete(&mut self, filter: Document, options: DeleteOptions) -> Result<()> {
        let mut body = doc! { "q": filter, "limit": options.limit() };
        body.extend(crate::bson::to_document(&options)?);
        self.push(StatementKind::Delete, body);
        Ok(())
    }
}
