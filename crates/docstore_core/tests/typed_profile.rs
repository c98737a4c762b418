mod common;

use common::sample_profile;
use docstore_core::{
    AccessError, CodecError, DocumentRepository, DocumentService, Model, PartialUpdate, Profile,
    ProfilePatch, SqliteDocumentRepository, StoreHandle, TypedCodec,
};
use serde_json::{json, Value};

fn profiles(handle: &StoreHandle) -> DocumentService<SqliteDocumentRepository<'_>, TypedCodec<Profile>> {
    DocumentService::new(
        SqliteDocumentRepository::new(handle),
        TypedCodec::<Profile>::new(),
        Profile::COLLECTION,
    )
}

#[test]
fn typed_create_and_get_decode_into_profile() {
    let handle = StoreHandle::open_in_memory().unwrap();
    let service = profiles(&handle);

    let created = service.create(sample_profile()).unwrap();
    let fetched = service.get(&created.id.to_hex()).unwrap();

    let profile: Profile = fetched.into_model().unwrap();
    assert_eq!(profile.id.as_deref(), Some(created.id.to_hex().as_str()));
    assert_eq!(profile.username, "terry53");
    assert_eq!(profile.current_location, vec![89.371661, -102.604933]);
    assert_eq!(profile.website.len(), 2);
}

#[test]
fn typed_create_rejects_schema_violations() {
    let handle = StoreHandle::open_in_memory().unwrap();
    let service = profiles(&handle);

    let mut missing = sample_profile();
    missing.remove("mail");
    assert!(matches!(
        service.create(missing),
        Err(AccessError::InvalidResource(CodecError::MissingField(field))) if field == "mail"
    ));

    let mut unknown = sample_profile();
    unknown.insert("favourite_colour".to_string(), json!("teal"));
    assert!(matches!(
        service.create(unknown),
        Err(AccessError::InvalidResource(CodecError::UnknownField(_)))
    ));

    let mut mistyped = sample_profile();
    mistyped.insert("current_location".to_string(), json!(["north", "west"]));
    assert!(matches!(
        service.create(mistyped),
        Err(AccessError::InvalidResource(CodecError::TypeMismatch { .. }))
    ));

    let mut bad_date = sample_profile();
    bad_date.insert("birthdate".to_string(), json!("July 19th"));
    assert!(matches!(
        service.create(bad_date),
        Err(AccessError::InvalidResource(CodecError::TypeMismatch { .. }))
    ));
}

#[test]
fn typed_patch_only_writes_present_members() {
    let handle = StoreHandle::open_in_memory().unwrap();
    let service = profiles(&handle);
    let created = service.create(sample_profile()).unwrap();

    let patch = ProfilePatch {
        job: Some("Nurse, learning disability".to_string()),
        website: Some(vec!["http://lopez.org/".to_string()]),
        ..ProfilePatch::default()
    };
    let update = PartialUpdate::from_patch(&patch).unwrap();
    assert_eq!(update.len(), 2);
    assert!(!update.contains("name"));

    let updated = service.update(&created.id.to_hex(), &update).unwrap();

    let mut expected = sample_profile();
    expected.insert("job".to_string(), json!("Nurse, learning disability"));
    expected.insert("website".to_string(), json!(["http://lopez.org/"]));
    assert_eq!(updated.fields, expected);
}

#[test]
fn typed_update_rejects_unknown_and_mistyped_fields_without_writing() {
    let handle = StoreHandle::open_in_memory().unwrap();
    let service = profiles(&handle);
    let created = service.create(sample_profile()).unwrap();
    let id = created.id.to_hex();

    let unknown = PartialUpdate::new().set("job", "Chef").set("nickname", "T");
    assert!(matches!(
        service.update(&id, &unknown),
        Err(AccessError::InvalidUpdate(CodecError::UnknownField(field))) if field == "nickname"
    ));

    let mistyped = PartialUpdate::new().set("website", "http://single.example/");
    assert!(matches!(
        service.update(&id, &mistyped),
        Err(AccessError::InvalidUpdate(CodecError::TypeMismatch { .. }))
    ));

    let nulling = PartialUpdate::new().set("name", Value::Null);
    assert!(matches!(
        service.update(&id, &nulling),
        Err(AccessError::InvalidUpdate(CodecError::NullNotAllowed(_)))
    ));

    assert_eq!(service.get(&id).unwrap(), created);
}

#[test]
fn typed_read_rejects_documents_outside_the_schema() {
    let handle = StoreHandle::open_in_memory().unwrap();
    let repo = SqliteDocumentRepository::new(&handle);
    let mut partial = sample_profile();
    partial.remove("ssn");
    let id = repo.insert_one(Profile::COLLECTION, &partial).unwrap();

    let service = profiles(&handle);
    assert!(matches!(
        service.get(&id.to_hex()),
        Err(AccessError::InvalidData(_))
    ));
}

#[test]
fn profile_schema_covers_every_model_field() {
    let value = serde_json::to_value(
        serde_json::from_value::<Profile>(Value::Object(sample_profile())).unwrap(),
    )
    .unwrap();
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

    assert_eq!(keys.len(), Profile::FIELDS.len());
    for key in keys {
        assert!(Profile::field(key).is_some(), "schema misses `{key}`");
    }
}
