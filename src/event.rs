//! Contains the events emitted before each write is handed to the accumulator, and the handler
//! types used to receive them.

use std::sync::{mpsc, Arc};

use crate::{
    bson::Document,
    options::{DeleteOptions, UpdateModifications, UpdateOptions},
};

/// Published right before a document is inserted into the accumulator.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct InsertEvent {
    /// The document in the form handed to the accumulator.
    pub document: Document,
}

/// Published right before an update statement is added to the accumulator.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct UpdateEvent {
    /// The statement's filter.
    pub filter: Document,

    /// The modifications or replacement document.
    pub update: UpdateModifications,

    /// The statement options.
    pub options: UpdateOptions,
}

/// Published right before a delete statement is added to the accumulator.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct DeleteEvent {
    /// The statement's filter.
    pub filter: Document,

    /// The statement options.
    pub options: DeleteOptions,
}

/// Any of the events published during compilation.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum BulkWriteEvent {
    /// See [`InsertEvent`].
    Insert(InsertEvent),

    /// See [`UpdateEvent`].
    Update(UpdateEvent),

    /// See [`DeleteEvent`].
    Delete(DeleteEvent),
}

/// A destination for events. Allows implicit conversion via [`From`] for channel senders and for
/// [`BulkWriteListener`] implementations:
///
/// ```rust
/// # use mongodb_bulk_compiler::event::{BulkWriteEvent, EventHandler};
/// let (tx, rx) = std::sync::mpsc::channel::<BulkWriteEvent>();
/// let handler: EventHandler<BulkWriteEvent> = tx.into();
///
/// let printing = EventHandler::callback(|ev: BulkWriteEvent| println!("{:?}", ev));
/// # drop((handler, printing, rx));
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub enum EventHandler<T> {
    /// A callback.
    Callback(Arc<dyn Fn(T) + Sync + Send>),
    /// A channel sender. Events sent after the receiver is dropped are discarded.
    Mpsc(mpsc::Sender<T>),
}

impl<T> std::fmt::Debug for EventHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EventHandler").finish()
    }
}

impl<T> From<mpsc::Sender<T>> for EventHandler<T> {
    fn from(value: mpsc::Sender<T>) -> Self {
        Self::Mpsc(value)
    }
}

impl<T: BulkWriteListener + 'static> From<Arc<T>> for EventHandler<BulkWriteEvent> {
    fn from(value: Arc<T>) -> Self {
        Self::callback(move |ev| match ev {
            BulkWriteEvent::Insert(e) => value.before_insert(e),
            BulkWriteEvent::Update(e) => value.before_update(e),
            BulkWriteEvent::Delete(e) => value.before_delete(e),
        })
    }
}

impl<T: Send + Sync + 'static> EventHandler<T> {
    /// Construct a new event handler with a callback.
    pub fn callback(f: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self::Callback(Arc::new(f))
    }

    pub(crate) fn handle(&self, event: T) {
        match self {
            Self::Callback(cb) => (cb)(event),
            Self::Mpsc(sender) => {
                let _ = sender.send(event);
            }
        }
    }
}

/// Applications can implement this trait to observe each write before it reaches the
/// accumulator. Every method has an empty default.
///
/// ```rust
/// # use std::sync::Arc;
/// # use mongodb_bulk_compiler::event::{BulkWriteListener, InsertEvent};
/// struct InsertLogger;
///
/// impl BulkWriteListener for InsertLogger {
///     fn before_insert(&self, event: InsertEvent) {
///         eprintln!("inserting {}", event.document);
///     }
/// }
///
/// # fn main() -> mongodb_bulk_compiler::error::Result<()> {
/// # use mongodb_bulk_compiler::{bson::doc, BulkWriteCompiler, WriteModel};
/// let compiler: BulkWriteCompiler =
///     BulkWriteCompiler::new(vec![WriteModel::insert_one(doc! { "x": 1 })], doc! {})?
///     .listener(Arc::new(InsertLogger));
/// # drop(compiler);
/// # Ok(())
/// # }
/// ```
pub trait BulkWriteListener: Send + Sync {
    /// Called before a document is inserted.
    fn before_insert(&self, _event: InsertEvent) {}

    /// Called before an update statement is added.
    fn before_update(&self, _event: UpdateEvent) {}

    /// Called before a delete statement is added.
    fn before_delete(&self, _event: DeleteEvent) {}
}
