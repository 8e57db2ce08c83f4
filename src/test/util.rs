use std::sync::{Arc, Mutex};

use crate::{
    accumulator::BulkAccumulator,
    bson::{Bson, Document},
    error::Result,
    event::{BulkWriteEvent, EventHandler},
    model::Insertable,
    options::{BulkWriteOptions, DeleteOptions, UpdateModifications, UpdateOptions},
};

/// A call received by a [`RecordingAccumulator`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RecordedCall {
    Insert(Document),
    Update {
        filter: Document,
        update: UpdateModifications,
        options: UpdateOptions,
    },
    Delete {
        filter: Document,
        options: DeleteOptions,
    },
}

/// An accumulator that records every call it receives. With `GENERATE` set it reports a generated
/// id (`"generated-<n>"`) for every insert, whether or not the document already has one.
#[derive(Clone, Debug)]
pub(crate) struct RecordingAccumulator<const GENERATE: bool> {
    pub(crate) options: BulkWriteOptions,
    pub(crate) calls: Vec<RecordedCall>,
}

/// Never generates ids.
pub(crate) type Recording = RecordingAccumulator<false>;

/// Generates an id for every insert.
pub(crate) type Generating = RecordingAccumulator<true>;

impl<const GENERATE: bool> BulkAccumulator for RecordingAccumulator<GENERATE> {
    fn new(options: &BulkWriteOptions) -> Result<Self> {
        Ok(Self {
            options: options.clone(),
            calls: Vec::new(),
        })
    }

    fn insert(&mut self, document: Document) -> Result<Option<Bson>> {
        self.calls.push(RecordedCall::Insert(document));
        Ok(GENERATE.then(|| Bson::String(format!("generated-{}", self.calls.len() - 1))))
    }

    fn update(
        &mut self,
        filter: Document,
        update: UpdateModifications,
        options: UpdateOptions,
    ) -> Result<()> {
        self.calls.push(RecordedCall::Update {
            filter,
            update,
            options,
        });
        Ok(())
    }

    fn delete(&mut self, filter: Document, options: DeleteOptions) -> Result<()> {
        self.calls.push(RecordedCall::Delete { filter, options });
        Ok(())
    }
}

/// A buffer collecting the events published by a compiler.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventBuffer {
    events: Arc<Mutex<Vec<BulkWriteEvent>>>,
}

impl EventBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn handler(&self) -> EventHandler<BulkWriteEvent> {
        let events = self.events.clone();
        EventHandler::callback(move |ev| events.lock().unwrap().push(ev))
    }

    pub(crate) fn get_all(&self) -> Vec<BulkWriteEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// An insertable object whose id lives in a native attribute rather than in its map form.
#[derive(Debug, Default)]
pub(crate) struct TestEntity {
    pub(crate) fields: Document,
    pub(crate) id: Option<Bson>,
    pub(crate) declares_id: bool,
    pub(crate) assigned: Arc<Mutex<Option<Bson>>>,
}

impl Insertable for TestEntity {
    fn to_document(&self) -> Result<Document> {
        Ok(self.fields.clone())
    }

    fn id(&self) -> Option<Bson> {
        self.id.clone()
    }

    fn declares_id(&self) -> bool {
        self.declares_id
    }

    fn assign_id(&mut self, id: &Bson) -> bool {
        *self.assigned.lock().unwrap() = Some(id.clone());
        true
    }
}
