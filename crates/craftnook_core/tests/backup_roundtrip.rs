use craftnook_core::db::open_db_in_memory;
use craftnook_core::{
    BackupEnvelope, BackupError, BackupService, ImageStore, InventoryService, NewMaterial,
    QuantityDecision, SqliteMaterialRepository, SqliteUsageLogRepository, UpdateOutcome,
};
use rusqlite::Connection;

type Inventory<'a> = InventoryService<SqliteMaterialRepository<'a>, SqliteUsageLogRepository<'a>>;
type Backup<'a> = BackupService<SqliteMaterialRepository<'a>, SqliteUsageLogRepository<'a>>;

fn services<'a>(conn: &'a Connection, files: &tempfile::TempDir) -> (Inventory<'a>, Backup<'a>) {
    let images = ImageStore::new(files.path()).unwrap();
    let materials = SqliteMaterialRepository::new(conn);
    let logs = SqliteUsageLogRepository::new(conn);
    (
        InventoryService::new(materials, logs, images.clone()),
        BackupService::new(materials, logs, images),
    )
}

fn seed(inventory: &Inventory<'_>, photo_source: &std::path::Path) {
    let mut with_photo = NewMaterial::new("Red Paint", 5, "Paint");
    with_photo.photo_uri = Some(photo_source.to_string_lossy().into_owned());
    let mut red = inventory.add_material(with_photo).unwrap().material;

    red.quantity = 3;
    let UpdateOutcome::NeedsConfirmation(pending) = inventory.update_material(red).unwrap() else {
        panic!("expected pending confirmation");
    };
    inventory
        .resolve_quantity_change(&pending, QuantityDecision::Used)
        .unwrap();

    inventory
        .add_material(NewMaterial::new("Sketchbook", 2, "Paper"))
        .unwrap();
}

#[test]
fn export_then_import_into_empty_store_restores_everything() {
    let outside = tempfile::tempdir().unwrap();
    let photo = outside.path().join("red.jpg");
    std::fs::write(&photo, [0xFF_u8, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

    let source_conn = open_db_in_memory().unwrap();
    let source_files = tempfile::tempdir().unwrap();
    let (source_inventory, source_backup) = services(&source_conn, &source_files);
    seed(&source_inventory, &photo);

    let mut buffer = Vec::new();
    let exported = source_backup.export_to_writer(&mut buffer).unwrap();
    assert_eq!(exported.materials, 2);
    assert_eq!(exported.usage_logs, 3);
    assert_eq!(exported.images, 1);

    let target_conn = open_db_in_memory().unwrap();
    let target_files = tempfile::tempdir().unwrap();
    let (target_inventory, target_backup) = services(&target_conn, &target_files);

    let imported = target_backup.import_from_reader(buffer.as_slice()).unwrap();
    assert_eq!(imported.materials_imported, 2);
    assert_eq!(imported.logs_imported, 3);

    let restored = target_inventory.list_materials().unwrap();
    let original = source_inventory.list_materials().unwrap();
    assert_eq!(restored.len(), original.len());
    for (left, right) in restored.iter().zip(&original) {
        assert_eq!(left.id, right.id);
        assert_eq!(left.quantity, right.quantity);
        assert_eq!(left.last_updated, right.last_updated);
    }

    let red = restored.iter().find(|m| m.name == "Red Paint").unwrap();
    let restored_photo = red.photo_uri.clone().unwrap();
    assert!(target_inventory.images().is_owned(&restored_photo));
    assert_eq!(
        std::fs::read(&restored_photo).unwrap(),
        vec![0xFF_u8, 0xD8, 0xFF, 0xE0, 0x00, 0x10]
    );
    assert_eq!(
        target_inventory.list_logs().unwrap(),
        source_inventory.list_logs().unwrap()
    );
}

#[test]
fn reimporting_the_same_backup_adds_nothing() {
    let outside = tempfile::tempdir().unwrap();
    let photo = outside.path().join("red.jpg");
    std::fs::write(&photo, b"jpeg").unwrap();

    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (inventory, backup) = services(&conn, &files);
    seed(&inventory, &photo);

    let mut buffer = Vec::new();
    backup.export_to_writer(&mut buffer).unwrap();
    let before = inventory.list_materials().unwrap();

    let summary = backup.import_from_reader(buffer.as_slice()).unwrap();
    assert_eq!(summary.materials_imported, 0);
    assert_eq!(summary.logs_imported, 0);
    assert_eq!(inventory.list_materials().unwrap(), before);
    assert_eq!(inventory.list_logs().unwrap().len(), 3);
}

#[test]
fn import_never_overwrites_local_rows() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (inventory, backup) = services(&conn, &files);
    let local = inventory
        .add_material(NewMaterial::new("Glue", 9, "Adhesives"))
        .unwrap()
        .material;

    let mut stale = local.clone();
    stale.quantity = 1;
    let envelope = BackupEnvelope {
        schema_version: 2,
        exported_at: 0,
        materials: vec![stale],
        usage_logs: Vec::new(),
        images: Vec::new(),
    };
    let summary = backup.restore(envelope).unwrap();
    assert_eq!(summary.materials_imported, 0);
    assert_eq!(inventory.get_material(&local.id).unwrap().unwrap().quantity, 9);
}

#[test]
fn version_one_backup_without_images_imports() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (inventory, backup) = services(&conn, &files);

    let json = r#"{
        "schemaVersion": 1,
        "exportedAt": 1700000000000,
        "materials": [
            {"id": "m-1", "name": "Charcoal", "category": "Charcoal", "quantity": 4,
             "unit": "sticks", "lastUpdated": 1700000000000}
        ],
        "usageLogs": [
            {"id": "l-1", "materialId": "m-1", "materialName": "Charcoal", "category": "Charcoal",
             "eventType": "ADDED", "quantityDelta": 4, "quantityAfter": 4, "timestamp": 1700000000000}
        ]
    }"#;
    let summary = backup.import_from_reader(json.as_bytes()).unwrap();
    assert_eq!(summary.materials_imported, 1);
    assert_eq!(summary.logs_imported, 1);

    let charcoal = inventory.get_material("m-1").unwrap().unwrap();
    assert_eq!(charcoal.unit, "sticks");
    assert_eq!(charcoal.description, "");
    assert!(charcoal.photo_uri.is_none());
}

#[test]
fn malformed_json_fails_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (inventory, backup) = services(&conn, &files);

    let err = backup.import_from_reader("{ not json".as_bytes()).unwrap_err();
    assert!(matches!(err, BackupError::Parse(_)));
    assert!(inventory.list_materials().unwrap().is_empty());
}

#[test]
fn invalid_base64_image_is_reported_with_material_id() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (_, backup) = services(&conn, &files);

    let json = r#"{"schemaVersion":2,"exportedAt":0,"materials":[],"usageLogs":[],
        "images":[{"materialId":"m-9","base64Data":"***"}]}"#;
    match backup.import_from_reader(json.as_bytes()) {
        Err(BackupError::InvalidImage { material_id, .. }) => assert_eq!(material_id, "m-9"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn export_to_path_writes_readable_file() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (inventory, backup) = services(&conn, &files);
    inventory
        .add_material(NewMaterial::new("Tape", 1, "Tape"))
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("backup.json");
    backup.export_to_path(&path).unwrap();

    let envelope: BackupEnvelope =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(envelope.schema_version, 2);
    assert_eq!(envelope.materials.len(), 1);
    assert!(envelope.images.is_empty());
}

#[test]
fn reimport_does_not_leave_extra_image_files() {
    let outside = tempfile::tempdir().unwrap();
    let photo = outside.path().join("red.jpg");
    std::fs::write(&photo, b"jpeg").unwrap();

    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (inventory, backup) = services(&conn, &files);
    seed(&inventory, &photo);

    let mut buffer = Vec::new();
    backup.export_to_writer(&mut buffer).unwrap();
    let image_count = || {
        std::fs::read_dir(inventory.images().images_dir())
            .unwrap()
            .count()
    };
    let before = image_count();

    backup.import_from_reader(buffer.as_slice()).unwrap();
    backup.import_from_reader(buffer.as_slice()).unwrap();
    assert_eq!(image_count(), before);
}

#[test]
fn photo_paths_escaping_the_images_dir_are_treated_as_external() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let (inventory, backup) = services(&conn, &files);

    let victim = files.path().join("victim.txt");
    std::fs::write(&victim, b"keep me").unwrap();
    let mut material = NewMaterial::new("Tape", 1, "Tape").into_material();
    material.photo_uri = Some(format!(
        "{}/../victim.txt",
        inventory.images().images_dir().display()
    ));
    let envelope = BackupEnvelope {
        schema_version: 2,
        exported_at: 0,
        materials: vec![material.clone()],
        usage_logs: Vec::new(),
        images: Vec::new(),
    };
    assert_eq!(backup.restore(envelope).unwrap().materials_imported, 1);

    assert!(backup.snapshot().unwrap().images.is_empty());
    inventory.delete_material(&material.id).unwrap();
    assert!(victim.exists());
}
