use pretty_assertions::assert_eq;

use crate::{
    bson::{doc, Bson, Document},
    error::Result,
    model::{Insertable, WriteModel, WriteModelEntry, WriteTarget},
    options::{Collation, CollationStrength, DeleteOptions, Hint, UpdateModifications, UpdateOptions},
};

#[derive(Debug, PartialEq)]
enum Dispatched {
    Insert(Document),
    Update(Document, UpdateModifications, UpdateOptions),
    Delete(Document, DeleteOptions),
}

#[derive(Default)]
struct DispatchLog {
    calls: Vec<Dispatched>,
}

impl WriteTarget for DispatchLog {
    fn insert(&mut self, document: &mut dyn Insertable) -> Result<Bson> {
        let document = document.to_document()?;
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);
        self.calls.push(Dispatched::Insert(document));
        Ok(id)
    }

    fn update(
        &mut self,
        filter: Document,
        update: UpdateModifications,
        options: UpdateOptions,
    ) -> Result<()> {
        self.calls.push(Dispatched::Update(filter, update, options));
        Ok(())
    }

    fn delete(&mut self, filter: Document, options: DeleteOptions) -> Result<()> {
        self.calls.push(Dispatched::Delete(filter, options));
        Ok(())
    }
}

fn dispatch(mut model: WriteModel) -> Result<Vec<Dispatched>> {
    let mut log = DispatchLog::default();
    model.write_to(&mut log)?;
    Ok(log.calls)
}

#[test]
fn each_model_dispatches_once() {
    assert_eq!(
        dispatch(WriteModel::insert_one(doc! { "_id": 1 })).unwrap(),
        vec![Dispatched::Insert(doc! { "_id": 1 })]
    );

    let collation = Collation::builder()
        .locale("en")
        .strength(CollationStrength::Secondary)
        .build();
    assert_eq!(
        dispatch(
            WriteModel::update_many(doc! { "a": 1 }, doc! { "$set": { "b": 1 } })
                .with_upsert(true)
                .with_collation(collation.clone())
                .with_array_filters(vec![doc! { "e.x": 1 }])
        )
        .unwrap(),
        vec![Dispatched::Update(
            doc! { "a": 1 },
            doc! { "$set": { "b": 1 } }.into(),
            UpdateOptions {
                multi: true,
                upsert: Some(true),
                collation: Some(collation),
                array_filters: Some(vec![doc! { "e.x": 1 }]),
                hint: None,
            }
        )]
    );

    assert_eq!(
        dispatch(WriteModel::replace_one(doc! { "a": 1 }, doc! { "a": 2 }).with_hint("a_1".to_string()))
            .unwrap(),
        vec![Dispatched::Update(
            doc! { "a": 1 },
            doc! { "a": 2 }.into(),
            UpdateOptions {
                hint: Some(Hint::Name("a_1".to_string())),
                ..Default::default()
            }
        )]
    );

    assert_eq!(
        dispatch(WriteModel::delete_one(doc! { "a": 1 })).unwrap(),
        vec![Dispatched::Delete(doc! { "a": 1 }, DeleteOptions::default())]
    );
    assert_eq!(
        dispatch(WriteModel::delete_many(doc! { "a": 1 })).unwrap(),
        vec![Dispatched::Delete(
            doc! { "a": 1 },
            DeleteOptions {
                multi: true,
                ..Default::default()
            }
        )]
    );
}

#[test]
fn update_and_replacement_shapes_are_checked() {
    let error = dispatch(WriteModel::update_one(doc! {}, doc! { "a": 1 })).unwrap_err();
    assert!(error.is_invalid_argument());

    let pipeline = vec![doc! { "$set": { "a": 1 } }];
    assert!(dispatch(WriteModel::update_one(doc! {}, pipeline)).is_ok());

    let error = dispatch(WriteModel::replace_one(doc! {}, doc! { "$set": { "a": 1 } })).unwrap_err();
    assert!(error.is_invalid_argument());
}

#[test]
fn parses_raw_operations() {
    let model = WriteModel::from_operation(&Bson::Document(doc! { "insertOne": [{ "x": 1 }] }), 0)
        .unwrap();
    assert_eq!(model.operation_name(), "insertOne");

    let model = WriteModel::from_operation(
        &Bson::Document(doc! {
            "updateOne": [
                { "a": 1 },
                [{ "$set": { "b": 2 } }],
                { "upsert": true, "hint": { "a": 1 }, "collation": { "locale": "fr" } },
            ]
        }),
        3,
    )
    .unwrap();
    assert_eq!(
        dispatch(model).unwrap(),
        vec![Dispatched::Update(
            doc! { "a": 1 },
            UpdateModifications::Pipeline(vec![doc! { "$set": { "b": 2 } }]),
            UpdateOptions {
                upsert: Some(true),
                hint: Some(Hint::Keys(doc! { "a": 1 })),
                collation: Some(Collation::builder().locale("fr").build()),
                ..Default::default()
            }
        )]
    );

    let model = WriteModel::from_operation(
        &Bson::Document(doc! { "deleteMany": [{ "a": 1 }, null] }),
        1,
    )
    .unwrap();
    assert_eq!(model.operation_name(), "deleteMany");
}

#[test]
fn malformed_raw_operations() {
    let message = |operation: Bson| {
        WriteModel::from_operation(&operation, 2)
            .unwrap_err()
            .message()
            .map(str::to_string)
            .unwrap()
    };

    assert_eq!(
        message(Bson::String("insert".to_string())),
        "expected a write model at position 2, found string"
    );
    assert_eq!(
        message(Bson::Document(doc! { "upsertOne": [{}] })),
        "unknown operation type \"upsertOne\" at position 2"
    );
    assert_eq!(
        message(Bson::Document(doc! { "insertOne": { "x": 1 } })),
        "expected arguments of \"insertOne\" at position 2 to be an array, found document"
    );
    assert_eq!(
        message(Bson::Document(doc! { "deleteOne": [] })),
        "missing filter argument for \"deleteOne\" at position 2"
    );
    assert_eq!(
        message(Bson::Document(doc! { "updateOne": [{}, 5] })),
        "expected update of \"updateOne\" at position 2 to be a document or array, found int"
    );
    assert!(message(Bson::Document(doc! { "insertOne": [{}], "deleteOne": [{}] }))
        .starts_with("expected a single operation name"));
}

#[test]
fn entries_from_documents_are_raw_operations() {
    let entry = WriteModelEntry::from(doc! { "deleteOne": [{}] });
    assert!(matches!(entry, WriteModelEntry::Operation(Bson::Document(_))));

    let entry = WriteModelEntry::from(WriteModel::delete_one(doc! {}));
    assert!(matches!(entry, WriteModelEntry::Model(_)));
}

#[test]
fn raw_operation_options_are_restricted_per_operation() {
    let message = |operation: Document| {
        WriteModel::from_operation(&Bson::Document(operation), 4)
            .unwrap_err()
            .message()
            .map(str::to_string)
            .unwrap()
    };

    assert_eq!(
        message(doc! { "deleteOne": [{}, { "Collation": { "locale": "en" } }] }),
        "unknown option(s) \"Collation\" for \"deleteOne\" at position 4; allowed options are \
         \"collation\", \"hint\""
    );
    assert_eq!(
        message(doc! { "deleteMany": [{}, { "upsert": true }] }),
        "unknown option(s) \"upsert\" for \"deleteMany\" at position 4; allowed options are \
         \"collation\", \"hint\""
    );
    assert_eq!(
        message(doc! { "replaceOne": [{}, { "a": 1 }, { "arrayFilters": [], "multi": true }] }),
        "unknown option(s) \"arrayFilters\", \"multi\" for \"replaceOne\" at position 4; allowed \
         options are \"collation\", \"hint\", \"upsert\""
    );

    assert!(WriteModel::from_operation(
        &Bson::Document(doc! {
            "updateMany": [{}, { "$set": { "a": 1 } }, { "arrayFilters": [], "upsert": false }]
        }),
        4,
    )
    .is_ok());
}
