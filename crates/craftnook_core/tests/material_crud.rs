use craftnook_core::db::open_db_in_memory;
use craftnook_core::{
    CategoryAddOutcome, CategoryRepository, CategoryService, ImageStore, InventoryError,
    InventoryService, MaterialRepository, NewMaterial, RepoError, SqliteCategoryRepository,
    SqliteMaterialRepository, SqliteUsageLogRepository, ValidationError,
};
use rusqlite::Connection;

fn service<'a>(
    conn: &'a Connection,
    files: &tempfile::TempDir,
) -> InventoryService<SqliteMaterialRepository<'a>, SqliteUsageLogRepository<'a>> {
    InventoryService::new(
        SqliteMaterialRepository::new(conn),
        SqliteUsageLogRepository::new(conn),
        ImageStore::new(files.path()).unwrap(),
    )
}

#[test]
fn add_then_get_applies_defaults() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let inventory = service(&conn, &files);

    let change = inventory
        .add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap();
    let stored = inventory
        .get_material(&change.material.id)
        .unwrap()
        .unwrap();

    assert_eq!(stored.name, "Red Paint");
    assert_eq!(stored.description, "No brand specified");
    assert_eq!(stored.unit, "unit");
    assert_eq!(stored.quantity, 5);
    assert!(stored.photo_uri.is_none());
    assert!(stored.last_updated > 0);
}

#[test]
fn add_rejects_blank_name_and_non_positive_quantity() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let inventory = service(&conn, &files);

    let blank = inventory.add_material(NewMaterial::new("   ", 2, "Paint"));
    assert!(matches!(
        blank,
        Err(InventoryError::Validation(ValidationError::BlankField("name")))
    ));

    let zero = inventory.add_material(NewMaterial::new("Tape", 0, "Tape"));
    assert!(matches!(
        zero,
        Err(InventoryError::Validation(
            ValidationError::NonPositiveInitialQuantity(0)
        ))
    ));

    assert!(inventory.list_materials().unwrap().is_empty());
    assert!(inventory.list_logs().unwrap().is_empty());
}

#[test]
fn list_orders_by_name_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let inventory = service(&conn, &files);

    for name in ["brush", "Acrylic", "Canvas"] {
        inventory
            .add_material(NewMaterial::new(name, 1, "Other"))
            .unwrap();
    }
    let names: Vec<String> = inventory
        .list_materials()
        .unwrap()
        .into_iter()
        .map(|material| material.name)
        .collect();
    assert_eq!(names, vec!["Acrylic", "brush", "Canvas"]);
}

#[test]
fn set_quantity_validates_and_reports_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let inventory = service(&conn, &files);
    let repo = SqliteMaterialRepository::new(&conn);

    let id = inventory
        .add_material(NewMaterial::new("Glue", 3, "Adhesives"))
        .unwrap()
        .material
        .id;

    inventory.set_quantity(&id, 0).unwrap();
    assert_eq!(repo.get_material(&id).unwrap().unwrap().quantity, 0);
    // Direct quantity writes are not journaled.
    assert_eq!(inventory.list_logs_for_material(&id).unwrap().len(), 1);

    assert!(matches!(
        inventory.set_quantity(&id, -1),
        Err(InventoryError::Validation(ValidationError::NegativeQuantity(-1)))
    ));
    assert!(matches!(
        inventory.set_quantity("missing", 4),
        Err(InventoryError::NotFound(id)) if id == "missing"
    ));
}

#[test]
fn insert_if_absent_never_overwrites() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMaterialRepository::new(&conn);

    let original = NewMaterial::new("Charcoal", 4, "Charcoal").into_material();
    assert!(repo.insert_material_if_absent(&original).unwrap());

    let mut changed = original.clone();
    changed.quantity = 40;
    assert!(!repo.insert_material_if_absent(&changed).unwrap());

    assert_eq!(repo.get_material(&original.id).unwrap().unwrap().quantity, 4);
    assert_eq!(repo.count_materials().unwrap(), 1);
}

#[test]
fn duplicate_insert_is_a_db_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMaterialRepository::new(&conn);
    let material = NewMaterial::new("Charcoal", 4, "Charcoal").into_material();

    repo.insert_material(&material).unwrap();
    assert!(matches!(
        repo.insert_material(&material),
        Err(RepoError::Db(_))
    ));
}

#[test]
fn categories_normalize_and_ignore_case_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let categories = CategoryService::new(SqliteCategoryRepository::new(&conn));

    assert_eq!(
        categories.add_category("  Washi   Tape ").unwrap(),
        CategoryAddOutcome::Added("Washi Tape".to_string())
    );
    assert_eq!(
        categories.add_category("paint").unwrap(),
        CategoryAddOutcome::AlreadyExists("Paint".to_string())
    );
    assert!(categories.add_category("   ").is_err());

    let names = categories.list_categories().unwrap();
    assert!(names.contains(&"Washi Tape".to_string()));
    assert_eq!(names.iter().filter(|name| *name == "Paint").count(), 1);

    let records = SqliteCategoryRepository::new(&conn)
        .list_category_records()
        .unwrap();
    let washi = records
        .iter()
        .find(|record| record.name == "Washi Tape")
        .unwrap();
    assert!(!washi.is_default);
}

#[test]
fn deleting_a_category_keeps_its_materials() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let inventory = service(&conn, &files);
    let categories = CategoryService::new(SqliteCategoryRepository::new(&conn));

    let id = inventory
        .add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap()
        .material
        .id;
    assert!(categories.delete_category("Paint").unwrap());
    assert!(!categories.delete_category("Paint").unwrap());

    let material = inventory.get_material(&id).unwrap().unwrap();
    assert_eq!(material.category, "Paint");
    assert!(!categories
        .list_categories()
        .unwrap()
        .contains(&"Paint".to_string()));
}

#[test]
fn external_photo_is_copied_and_removed_with_material() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let inventory = service(&conn, &files);

    let outside = tempfile::tempdir().unwrap();
    let source = outside.path().join("picked.jpg");
    std::fs::write(&source, b"jpeg-bytes").unwrap();

    let mut request = NewMaterial::new("Sketchbook", 2, "Paper");
    request.photo_uri = Some(source.to_string_lossy().into_owned());
    let material = inventory.add_material(request).unwrap().material;

    let owned = material.photo_uri.clone().unwrap();
    assert!(inventory.images().is_owned(&owned));
    assert_eq!(std::fs::read(&owned).unwrap(), b"jpeg-bytes");
    assert!(source.exists());

    inventory.delete_material(&material.id).unwrap();
    assert!(!std::path::Path::new(&owned).exists());
    assert!(source.exists());
}
