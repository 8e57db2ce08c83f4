//! Compiles a list of write models into a single bulk accumulator.

mod source;

use std::collections::BTreeMap;

pub use source::WriteModels;

use crate::{
    accumulator::{BulkAccumulator, OpsAccumulator},
    bson::{Bson, Document},
    capabilities::{FeatureSupport, ServerCapabilities},
    error::{Error, Result},
    event::{BulkWriteEvent, DeleteEvent, EventHandler, InsertEvent, UpdateEvent},
    model::{Insertable, WriteTarget},
    options::{BulkWriteOptions, DeleteOptions, UpdateModifications, UpdateOptions},
    trace::CompileTracingEventEmitter,
};

/// Whether the compiler is inside [`BulkWriteCompiler::compile`]. While compiling, the capability
/// answers captured at the start of the pass travel with the phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CompilePhase {
    Idle,
    Compiling(FeatureSupport),
}

/// Turns a list of [`WriteModel`](crate::WriteModel)s into calls against a [`BulkAccumulator`].
///
/// Each model dispatches itself to exactly one of the compiler's [`WriteTarget`] operations. Those
/// operations check server support for the options in play, notify the listener, forward to the
/// accumulator and record the identifier of every inserted document under the position of the
/// write that inserted it.
///
/// ```rust
/// # fn main() -> mongodb_bulk_compiler::error::Result<()> {
/// use mongodb_bulk_compiler::{
///     bson::{doc, Bson},
///     BulkWriteCompiler,
///     StaticCapabilities,
///     WriteModel,
/// };
///
/// let mut compiler: BulkWriteCompiler = BulkWriteCompiler::new(
///     vec![
///         WriteModel::insert_one(doc! { "_id": 1, "x": 1 }),
///         WriteModel::update_one(doc! { "_id": 1 }, doc! { "$inc": { "x": 1 } }),
///         WriteModel::delete_many(doc! { "x": { "$gt": 10 } }),
///     ],
///     doc! { "ordered": true },
/// )?;
///
/// let accumulator = compiler.compile(&StaticCapabilities::default())?;
/// assert_eq!(accumulator.len(), 3);
/// assert_eq!(compiler.inserted_ids().get(&0), Some(&Bson::Int32(1)));
/// # Ok(())
/// # }
/// ```
pub struct BulkWriteCompiler<A: BulkAccumulator = OpsAccumulator> {
    models: WriteModels,
    count: Option<usize>,
    yielded: Option<usize>,
    options: BulkWriteOptions,
    listener: Option<EventHandler<BulkWriteEvent>>,
    phase: CompilePhase,
    position: usize,
    inserted_ids: BTreeMap<usize, Bson>,
    accumulator: Option<A>,
}

impl<A: BulkAccumulator> std::fmt::Debug for BulkWriteCompiler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkWriteCompiler")
            .field("models", &self.models)
            .field("options", &self.options)
            .field("phase", &self.phase)
            .field("position", &self.position)
            .field("inserted_ids", &self.inserted_ids)
            .finish_non_exhaustive()
    }
}

impl<A: BulkAccumulator> BulkWriteCompiler<A> {
    /// Creates a compiler for `models`, parsing `options` as [`BulkWriteOptions`].
    ///
    /// Fails with an invalid-argument error if the models are known to be empty or if
    /// `options` holds a key other than `bypassDocumentValidation` or `ordered`.
    pub fn new(models: impl Into<WriteModels>, options: Document) -> Result<Self> {
        Self::with_options(models, BulkWriteOptions::from_document(options)?)
    }

    /// Creates a compiler for `models` with already-typed options.
    pub fn with_options(models: impl Into<WriteModels>, options: BulkWriteOptions) -> Result<Self> {
        let models = models.into();
        if models.is_known_empty() {
            return Err(Error::invalid_argument("write models must not be empty"));
        }

        Ok(Self {
            count: models.known_len(),
            yielded: None,
            models,
            options,
            listener: None,
            phase: CompilePhase::Idle,
            position: 0,
            inserted_ids: BTreeMap::new(),
            accumulator: None,
        })
    }

    /// Attaches a handler notified right before each write reaches the accumulator.
    pub fn listener(mut self, handler: impl Into<EventHandler<BulkWriteEvent>>) -> Self {
        self.listener = Some(handler.into());
        self
    }

    /// The options of this bulk write.
    pub fn options(&self) -> &BulkWriteOptions {
        &self.options
    }

    /// Dispatches every model, in order, into a fresh accumulator and returns it.
    ///
    /// `server` is asked once, when the pass starts, whether collation and document validation
    /// bypass are supported. The compiler accepts [`WriteTarget`] calls only for the duration of
    /// this method, whether it succeeds or fails.
    ///
    /// A list of models can be compiled again; a lazy source is consumed by the first pass and a
    /// later pass fails as empty. The write counter and inserted ids carry over between passes.
    pub fn compile(&mut self, server: &(impl ServerCapabilities + ?Sized)) -> Result<A> {
        self.accumulator = None;
        self.phase = CompilePhase::Compiling(FeatureSupport::probe(server));
        CompileTracingEventEmitter::compile_started(self.count());

        let mut models = std::mem::take(&mut self.models);
        let (reached, result) = models.write_all(self);
        self.models = models;
        self.phase = CompilePhase::Idle;
        if self.count.is_none() {
            self.yielded = Some(self.yielded.unwrap_or(0) + reached);
        }

        let outcome = match result {
            Ok(()) if reached == 0 => Err(Error::invalid_argument(
                "write models yielded no elements to compile",
            )),
            Ok(()) => self
                .accumulator
                .take()
                .ok_or_else(|| Error::internal("no accumulator was created while compiling")),
            Err(e) => Err(e),
        };
        self.accumulator = None;

        match &outcome {
            Ok(_) => {
                CompileTracingEventEmitter::compile_succeeded(self.position, self.inserted_ids.len())
            }
            Err(e) => CompileTracingEventEmitter::compile_failed(e),
        }
        outcome
    }

    /// The identifiers of inserted documents, keyed by the position of the write that inserted
    /// them.
    pub fn inserted_ids(&self) -> &BTreeMap<usize, Bson> {
        &self.inserted_ids
    }

    /// The number of models supplied, independent of how many were compiled or failed.
    ///
    /// A lazy source without an exact size hint cannot be measured without consuming it. Until
    /// the first compile pass this is the lower bound of its size hint; afterwards it is the
    /// number of models the source produced, including those after a failed write.
    pub fn count(&self) -> usize {
        match (self.count, self.yielded) {
            (Some(count), _) | (None, Some(count)) => count,
            (None, None) => self.models.min_len(),
        }
    }

    /// The number of writes forwarded to accumulators so far.
    pub fn position(&self) -> usize {
        self.position
    }

    fn guard(&self, operation: &str) -> Result<FeatureSupport> {
        match self.phase {
            CompilePhase::Compiling(support) => Ok(support),
            CompilePhase::Idle => Err(Error::bad_method_call(format!(
                "{operation} may only be called while the bulk write is compiling"
            ))),
        }
    }

    /// The accumulator of the current pass, created on first use.
    fn accumulator(&mut self, support: FeatureSupport) -> Result<&mut A> {
        let accumulator = match self.accumulator.take() {
            Some(accumulator) => accumulator,
            None => {
                if self.options.bypasses_document_validation() && !support.document_validation {
                    return Err(Error::unsupported(
                        "bypassDocumentValidation is not supported by the server",
                    ));
                }
                A::new(&self.options)?
            }
        };
        Ok(self.accumulator.insert(accumulator))
    }

    fn emit(&self, event: BulkWriteEvent) {
        CompileTracingEventEmitter::handle(self.position, &event);
        if let Some(ref listener) = self.listener {
            listener.handle(event);
        }
    }
}

fn check_collation(collation_set: bool, support: FeatureSupport) -> Result<()> {
    if collation_set && !support.collation {
        return Err(Error::unsupported("collation is not supported by the server"));
    }
    Ok(())
}

impl<A: BulkAccumulator> WriteTarget for BulkWriteCompiler<A> {
    fn insert(&mut self, document: &mut dyn Insertable) -> Result<Bson> {
        let support = self.guard("insert")?;
        let map = document.to_document()?;
        self.emit(BulkWriteEvent::Insert(InsertEvent {
            document: map.clone(),
        }));

        let own_id = map.get("_id").cloned();
        let generated = self.accumulator(support)?.insert(map)?;
        let id = match generated {
            Some(generated) if document.declares_id() => {
                return Err(Error::logic(format!(
                    "id mismatch: generated {generated} for a document that declares its own id"
                )));
            }
            Some(generated) => {
                document.assign_id(&generated);
                generated
            }
            None => own_id.or_else(|| document.id()).ok_or_else(|| {
                Error::logic("inserted document carries no id and none was generated")
            })?,
        };

        self.inserted_ids.insert(self.position, id.clone());
        self.position += 1;
        Ok(id)
    }

    fn update(
        &mut self,
        filter: Document,
        update: UpdateModifications,
        options: UpdateOptions,
    ) -> Result<()> {
        let support = self.guard("update")?;
        self.emit(BulkWriteEvent::Update(UpdateEvent {
            filter: filter.clone(),
            update: update.clone(),
            options: options.clone(),
        }));
        check_collation(options.collation.is_some(), support)?;

        self.accumulator(support)?.update(filter, update, options)?;
        self.position += 1;
        Ok(())
    }

    fn delete(&mut self, filter: Document, options: DeleteOptions) -> Result<()> {
        let support = self.guard("delete")?;
        self.emit(BulkWriteEvent::Delete(DeleteEvent {
            filter: filter.clone(),
            options: options.clone(),
        }));
        check_collation(options.collation.is_some(), support)?;

        self.accumulator(support)?.delete(filter, options)?;
        self.position += 1;
        Ok(())
    }
}
