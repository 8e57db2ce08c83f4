use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    model::{WriteModel, WriteModelEntry, WriteTarget},
};

/// The write models of a bulk write, in one of the shapes a caller may supply them:
///
/// * a `Vec`, whose positions are dense by construction;
/// * a `BTreeMap<usize, _>`, whose keys must turn out to be `0..n` when compiled;
/// * a lazy iterator (see [`WriteModels::lazy`]), consumed by the first compile pass.
///
/// Elements may be typed [`WriteModel`]s or raw operation values.
pub struct WriteModels {
    source: ModelSource,
}

enum ModelSource {
    Indexed(Vec<(usize, WriteModelEntry)>),
    Lazy(Box<dyn Iterator<Item = WriteModelEntry>>),
    Drained,
}

impl std::fmt::Debug for WriteModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            ModelSource::Indexed(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(position, entry)| (position, entry)))
                .finish(),
            ModelSource::Lazy(_) => f.write_str("WriteModels::Lazy"),
            ModelSource::Drained => f.write_str("WriteModels::Drained"),
        }
    }
}

impl Default for WriteModels {
    fn default() -> Self {
        Self {
            source: ModelSource::Drained,
        }
    }
}

impl<T: Into<WriteModelEntry>> From<Vec<T>> for WriteModels {
    fn from(models: Vec<T>) -> Self {
        Self {
            source: ModelSource::Indexed(
                models
                    .into_iter()
                    .map(Into::into)
                    .enumerate()
                    .collect(),
            ),
        }
    }
}

impl<T: Into<WriteModelEntry>> From<BTreeMap<usize, T>> for WriteModels {
    fn from(models: BTreeMap<usize, T>) -> Self {
        Self {
            source: ModelSource::Indexed(
                models
                    .into_iter()
                    .map(|(position, model)| (position, model.into()))
                    .collect(),
            ),
        }
    }
}

impl From<WriteModel> for WriteModels {
    fn from(model: WriteModel) -> Self {
        vec![model].into()
    }
}

impl<T: Into<WriteModelEntry>> FromIterator<T> for WriteModels {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl WriteModels {
    /// Models produced on demand by `iter`. The iterator is drained by the first compile pass.
    pub fn lazy<I>(iter: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WriteModelEntry> + 'static,
        I::IntoIter: 'static,
    {
        Self {
            source: ModelSource::Lazy(Box::new(iter.into_iter().map(Into::into))),
        }
    }

    /// The number of models, if it is known without consuming anything: the length of a list or
    /// map, or the exact size hint of a lazy iterator.
    pub fn known_len(&self) -> Option<usize> {
        match &self.source {
            ModelSource::Indexed(entries) => Some(entries.len()),
            ModelSource::Lazy(iter) => match iter.size_hint() {
                (lower, Some(upper)) if lower == upper => Some(lower),
                _ => None,
            },
            ModelSource::Drained => None,
        }
    }

    /// Whether the models are known to be empty without consuming anything.
    pub(crate) fn is_known_empty(&self) -> bool {
        match &self.source {
            ModelSource::Indexed(entries) => entries.is_empty(),
            ModelSource::Lazy(iter) => iter.size_hint().1 == Some(0),
            ModelSource::Drained => true,
        }
    }

    /// A lower bound on the number of models, known without consuming anything.
    pub(crate) fn min_len(&self) -> usize {
        match &self.source {
            ModelSource::Indexed(entries) => entries.len(),
            ModelSource::Lazy(iter) => iter.size_hint().0,
            ModelSource::Drained => 0,
        }
    }

    /// Dispatches every model into `target` in order, stopping at the first failure. Returns the
    /// outcome together with how many elements were reached, or for a lazy source, how many it
    /// produced: the models after a failure are still drawn and counted. A lazy source is drained
    /// afterwards either way.
    pub(crate) fn write_all(&mut self, target: &mut dyn WriteTarget) -> (usize, Result<()>) {
        let mut seen = 0;
        let result = match &mut self.source {
            ModelSource::Indexed(entries) => write_indexed(entries, target, &mut seen),
            ModelSource::Lazy(iter) => write_lazy(iter.as_mut(), target, &mut seen),
            ModelSource::Drained => Ok(()),
        };
        if matches!(self.source, ModelSource::Lazy(_)) {
            self.source = ModelSource::Drained;
        }
        (seen, result)
    }
}

fn write_indexed(
    entries: &mut [(usize, WriteModelEntry)],
    target: &mut dyn WriteTarget,
    reached: &mut usize,
) -> Result<()> {
    for (position, entry) in entries.iter_mut() {
        check_position(*reached, *position)?;
        *reached += 1;
        entry.write_to(*position, target)?;
    }
    Ok(())
}

fn write_lazy(
    iter: &mut dyn Iterator<Item = WriteModelEntry>,
    target: &mut dyn WriteTarget,
    seen: &mut usize,
) -> Result<()> {
    while let Some(mut entry) = iter.next() {
        let position = *seen;
        *seen += 1;
        if let Err(e) = entry.write_to(position, target) {
            *seen += (&mut *iter).count();
            return Err(e);
        }
    }
    Ok(())
}

fn check_position(expected: usize, position: usize) -> Result<()> {
    if position == expected {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "write models are not a list (unexpected index: {position}, expected {expected})"
        )))
    }
}
