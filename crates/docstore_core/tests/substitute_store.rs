mod common;

use common::{fields, widget, CountingRepository, UnreachableRepository};
use docstore_core::{
    AccessError, DocumentService, DynamicCodec, Filter, MemoryDocumentRepository, PageDescriptor,
    PartialUpdate, RepoError,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[test]
fn memory_repository_honours_the_same_contract() {
    let service = DocumentService::new(MemoryDocumentRepository::new(), DynamicCodec::new(), "w");

    let created = service.create(widget()).unwrap();
    let id = created.id.to_hex();

    let updated = service
        .update(&id, &PartialUpdate::new().set("qty", 6))
        .unwrap();
    assert_eq!(
        serde_json::Value::Object(updated.fields),
        json!({"name": "Widget", "qty": 6})
    );

    service.delete(&id).unwrap();
    assert!(matches!(service.get(&id), Err(AccessError::NotFound(_))));
    assert!(matches!(service.delete(&id), Err(AccessError::NotFound(_))));
}

#[test]
fn rejected_inputs_never_reach_the_store() {
    let repo = CountingRepository::default();
    let service = DocumentService::new(&repo, DynamicCodec::new().require("name"), "w");

    let _ = service.get("nope");
    let _ = service.delete("65a1b2c3d4e5f60718293a4");
    let _ = service.update("zz", &PartialUpdate::new().set("qty", 1));
    let _ = service.update(
        "65a1b2c3d4e5f60718293a4b",
        &PartialUpdate::new().set("$inc", json!({"qty": 1})),
    );
    let _ = service.create(fields(json!({"qty": 1})));
    let _ = service.create(fields(json!({"_id": "x", "name": "y"})));
    let _ = service.list(PageDescriptor::first(), Filter::new().eq("a.b", 1));

    assert_eq!(repo.calls(), 0);
}

#[test]
fn list_cursor_is_lazy_and_batched() {
    let repo = CountingRepository::default();
    let service = DocumentService::new(&repo, DynamicCodec::new(), "w");
    let payloads = (0..40).map(|n| fields(json!({"n": n}))).collect();
    service.create_many(payloads).unwrap();
    let after_seed = repo.calls();

    let page = PageDescriptor::Offset {
        offset: 0,
        limit: Some(40),
    };
    let mut cursor = service.list(page, Filter::new()).unwrap();
    assert_eq!(repo.calls(), after_seed);

    cursor.next().unwrap().unwrap();
    assert_eq!(repo.calls(), after_seed + 1);

    let rest = cursor.by_ref().count();
    assert_eq!(rest, 39);
    assert_eq!(repo.calls(), after_seed + 2);
    assert!(cursor.next().is_none());
}

#[test]
fn store_failures_surface_as_store_unavailable() {
    let service = DocumentService::new(UnreachableRepository, DynamicCodec::new(), "w");

    assert!(matches!(
        service.create(widget()),
        Err(AccessError::StoreUnavailable(RepoError::Unavailable(_)))
    ));
    assert!(matches!(
        service.get("65a1b2c3d4e5f60718293a4b"),
        Err(AccessError::StoreUnavailable(_))
    ));
    assert!(matches!(service.ping(), Err(AccessError::StoreUnavailable(_))));

    let mut cursor = service
        .list(PageDescriptor::first(), Filter::new())
        .unwrap();
    assert!(matches!(
        cursor.next(),
        Some(Err(AccessError::StoreUnavailable(_)))
    ));
    assert!(cursor.next().is_none());
}

#[test]
fn concurrent_updates_to_distinct_fields_both_land() {
    let service = Arc::new(DocumentService::new(
        MemoryDocumentRepository::new(),
        DynamicCodec::new(),
        "w",
    ));
    let id = service
        .create(fields(json!({"a": 0, "b": 0})))
        .unwrap()
        .id
        .to_hex();

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|field| {
            let service = Arc::clone(&service);
            let id = id.clone();
            thread::spawn(move || {
                for n in 1..=50 {
                    service
                        .update(&id, &PartialUpdate::new().set(field, n))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = service.get(&id).unwrap();
    assert_eq!(stored.get("a"), Some(&json!(50)));
    assert_eq!(stored.get("b"), Some(&json!(50)));
}
