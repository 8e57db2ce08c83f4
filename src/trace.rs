//! Emits `tracing` events describing compile passes. Compiled to no-ops unless the
//! `tracing-unstable` feature is enabled.

#[cfg(feature = "tracing-unstable")]
use crate::bson::{Bson, Document};
use crate::{error::Error, event::BulkWriteEvent};

#[cfg(feature = "tracing-unstable")]
pub(crate) const COMPILE_TRACING_EVENT_TARGET: &str = "mongodb_bulk_compiler::compile";

#[cfg(feature = "tracing-unstable")]
pub(crate) const DEFAULT_MAX_DOCUMENT_LENGTH_BYTES: usize = 1000;

#[cfg(feature = "tracing-unstable")]
pub(crate) trait TracingRepresentation {
    type Representation;

    fn tracing_representation(&self) -> Self::Representation;
}

#[cfg(feature = "tracing-unstable")]
impl TracingRepresentation for Document {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        let mut ext_json = Bson::Document(self.clone())
            .into_relaxed_extjson()
            .to_string();
        truncate_on_char_boundary(&mut ext_json, DEFAULT_MAX_DOCUMENT_LENGTH_BYTES);
        ext_json
    }
}

#[cfg(feature = "tracing-unstable")]
impl TracingRepresentation for Error {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        format!("{} ({})", self, self.kind.name())
    }
}

/// Truncates `s` to at most `new_length` bytes plus a trailing "...", backing off to the nearest
/// char boundary.
#[cfg(feature = "tracing-unstable")]
pub(crate) fn truncate_on_char_boundary(s: &mut String, new_length: usize) {
    if s.len() <= new_length {
        return;
    }
    let mut boundary = new_length;
    while !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    s.truncate(boundary);
    s.push_str("...");
}

/// Whether anything listens for debug events on the compile target, via either `tracing` or
/// `log`. Pending https://github.com/tokio-rs/tracing/issues/2036.
#[cfg(feature = "tracing-unstable")]
fn debug_enabled() -> bool {
    tracing::enabled!(target: COMPILE_TRACING_EVENT_TARGET, tracing::Level::DEBUG)
        || log::log_enabled!(target: COMPILE_TRACING_EVENT_TARGET, log::Level::Debug)
}

/// Converts compile lifecycle notifications and write events into tracing events.
pub(crate) struct CompileTracingEventEmitter;

impl CompileTracingEventEmitter {
    pub(crate) fn compile_started(models: usize) {
        #[cfg(feature = "tracing-unstable")]
        tracing::debug!(
            target: COMPILE_TRACING_EVENT_TARGET,
            models,
            "Bulk write compile started"
        );
        #[cfg(not(feature = "tracing-unstable"))]
        let _ = models;
    }

    pub(crate) fn compile_succeeded(writes: usize, inserted: usize) {
        #[cfg(feature = "tracing-unstable")]
        tracing::debug!(
            target: COMPILE_TRACING_EVENT_TARGET,
            writes,
            inserted,
            "Bulk write compile succeeded"
        );
        #[cfg(not(feature = "tracing-unstable"))]
        let _ = (writes, inserted);
    }

    pub(crate) fn compile_failed(error: &Error) {
        #[cfg(feature = "tracing-unstable")]
        tracing::debug!(
            target: COMPILE_TRACING_EVENT_TARGET,
            failure = error.tracing_representation(),
            "Bulk write compile failed"
        );
        #[cfg(not(feature = "tracing-unstable"))]
        let _ = error;
    }

    pub(crate) fn handle(position: usize, event: &BulkWriteEvent) {
        #[cfg(feature = "tracing-unstable")]
        if !debug_enabled() {
            return;
        }
        #[cfg(feature = "tracing-unstable")]
        match event {
            BulkWriteEvent::Insert(event) => {
                tracing::debug!(
                    target: COMPILE_TRACING_EVENT_TARGET,
                    position,
                    document = event.document.tracing_representation(),
                    "Insert compiled"
                );
            }
            BulkWriteEvent::Update(event) => {
                tracing::debug!(
                    target: COMPILE_TRACING_EVENT_TARGET,
                    position,
                    filter = event.filter.tracing_representation(),
                    multi = event.options.multi,
                    "Update compiled"
                );
            }
            BulkWriteEvent::Delete(event) => {
                tracing::debug!(
                    target: COMPILE_TRACING_EVENT_TARGET,
                    position,
                    filter = event.filter.tracing_representation(),
                    multi = event.options.multi,
                    "Delete compiled"
                );
            }
        }
        #[cfg(not(feature = "tracing-unstable"))]
        let _ = (position, event);
    }
}
