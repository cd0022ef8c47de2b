//! Persistence tests: records written through one repository instance are
//! visible, unchanged, after reopening the data directory.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use cornerstone_core::model::{
    ClaimMetadata, DataType, Property, ProofRequest, ProofRequestStatus, TypeMetadata,
    ValueType, VctDefinition, Zone, ZonePosition, ZoneRole, ZoneTemplate,
};
use cornerstone_storage::{JsonFileRepository, Repository};
use tempfile::TempDir;

#[tokio::test]
async fn data_types_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let mut employee = DataType::new("Employee");
    employee.id = "employee".into();
    employee
        .add_property(Property::new("Given Name", ValueType::String))
        .unwrap();

    let stored = {
        let repo = JsonFileRepository::<DataType>::open(dir.path())
            .await
            .unwrap();
        repo.insert(employee).await.unwrap()
    };

    let repo = JsonFileRepository::<DataType>::open(dir.path())
        .await
        .unwrap();
    let reloaded = repo.get("employee").await.unwrap();
    assert_eq!(reloaded, stored);
    assert_eq!(reloaded.properties[0].id, "given-name");
}

#[tokio::test]
async fn vct_definitions_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let metadata = TypeMetadata {
        vct: "https://vdr.example.org/vct/member.json".into(),
        name: Some("Member".into()),
        claims: vec![ClaimMetadata::simple("given_name", "Given name")],
        ..Default::default()
    };

    let id = {
        let repo = JsonFileRepository::<VctDefinition>::open(dir.path())
            .await
            .unwrap();
        repo.insert(VctDefinition::new(metadata.clone()))
            .await
            .unwrap()
            .id
    };

    let repo = JsonFileRepository::<VctDefinition>::open(dir.path())
        .await
        .unwrap();
    let reloaded = repo.get(&id).await.unwrap();
    assert_eq!(reloaded.metadata, metadata);
}

#[tokio::test]
async fn created_at_is_kept_across_updates_and_reopen() {
    let dir = TempDir::new().unwrap();
    let repo = JsonFileRepository::<ZoneTemplate>::open(dir.path())
        .await
        .unwrap();

    let mut template = ZoneTemplate::new("Front");
    template.zones.push(Zone {
        id: String::new(),
        role: ZoneRole::Logo,
        label: None,
        claim_path: None,
        position: ZonePosition {
            x: 5.0,
            y: 5.0,
            width: 20.0,
            height: 20.0,
        },
    });
    let created = repo.insert(template).await.unwrap();
    assert!(!created.zones[0].id.is_empty());

    let mut changed = created.clone();
    changed.name = "Front v2".into();
    changed.created_at = None;
    let updated = repo.update(&created.id, changed).await.unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    drop(repo);

    let repo = JsonFileRepository::<ZoneTemplate>::open(dir.path())
        .await
        .unwrap();
    let reloaded = repo.get(&created.id).await.unwrap();
    assert_eq!(reloaded.name, "Front v2");
    assert_eq!(reloaded.created_at, created.created_at);
}

#[tokio::test]
async fn collections_are_separate_files() {
    let dir = TempDir::new().unwrap();
    let templates = JsonFileRepository::<ZoneTemplate>::open(dir.path())
        .await
        .unwrap();
    let requests = JsonFileRepository::<ProofRequest>::open(dir.path())
        .await
        .unwrap();

    templates.insert(ZoneTemplate::new("Front")).await.unwrap();
    let request = requests
        .insert(ProofRequest::new("age-check"))
        .await
        .unwrap();
    assert_eq!(request.status, ProofRequestStatus::Created);

    assert!(dir.path().join("zone_templates.json").exists());
    assert!(dir.path().join("proof_requests.json").exists());
    assert_eq!(templates.count().await.unwrap(), 1);
    assert_eq!(requests.count().await.unwrap(), 1);
}
