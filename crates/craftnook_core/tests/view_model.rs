use craftnook_core::db::open_db_in_memory;
use craftnook_core::{
    BackupOutcome, ImageStore, InventoryError, InventoryViewModel, JournalFilter, NewMaterial,
    UpdateOutcome, UsageEventKind, ALL_CATEGORIES,
};
use std::time::Duration;

fn images(files: &tempfile::TempDir) -> ImageStore {
    ImageStore::new(files.path()).unwrap()
}

#[test]
fn red_paint_usage_is_confirmed_and_journaled() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    let mut red = vm
        .add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap()
        .material;
    red.quantity = 3;
    let outcome = vm.update_material(red.clone()).unwrap();
    assert!(matches!(outcome, UpdateOutcome::NeedsConfirmation(_)));

    let pending = vm.pending_confirmation().unwrap();
    assert_eq!((pending.old_quantity, pending.new_quantity), (5, 3));

    let entry = vm.confirm_quantity_change(true).unwrap().unwrap();
    assert_eq!(entry.kind, UsageEventKind::Used);
    assert_eq!(entry.quantity_delta, -2);
    assert!(vm.pending_confirmation().is_none());

    // A second confirmation without a pending value is a no-op.
    assert!(vm.confirm_quantity_change(true).unwrap().is_none());

    let used = vm
        .journal(JournalFilter::Kind(UsageEventKind::Used))
        .unwrap();
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].entries.len(), 1);
    assert_eq!(vm.total_units().unwrap(), 3);
}

#[test]
fn dismissing_a_reduction_keeps_quantity_but_skips_journal() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    let mut brush = vm
        .add_material(NewMaterial::new("Brush", 4, "Brushes"))
        .unwrap()
        .material;
    brush.quantity = 1;
    vm.update_material(brush).unwrap();
    vm.dismiss_quantity_confirmation();

    assert!(vm.pending_confirmation().is_none());
    assert_eq!(vm.all_materials().unwrap()[0].quantity, 1);
    assert_eq!(vm.log_entries().unwrap().len(), 1);
}

#[test]
fn deleting_selected_category_resets_filter_to_all() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    vm.add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap();
    vm.add_material(NewMaterial::new("Sketchbook", 2, "Paper"))
        .unwrap();

    vm.select_category("Paint");
    assert_eq!(vm.filtered_materials().unwrap().len(), 1);

    assert!(vm.delete_category("Paint").unwrap());
    assert_eq!(vm.selected_category(), ALL_CATEGORIES);
    assert_eq!(vm.filtered_materials().unwrap().len(), 2);
    assert!(!vm
        .available_categories()
        .unwrap()
        .contains(&"Paint".to_string()));

    // Deleting an unselected category leaves the filter alone.
    vm.select_category("Paper");
    vm.delete_category("Tape").unwrap();
    assert_eq!(vm.selected_category(), "Paper");
}

#[test]
fn search_matches_name_and_description() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    let mut marker = NewMaterial::new("Marker", 3, "Markers");
    marker.description = "Copic".to_string();
    vm.add_material(marker).unwrap();
    vm.add_material(NewMaterial::new("Copper Wire", 1, "Other"))
        .unwrap();
    vm.add_material(NewMaterial::new("Glue", 1, "Adhesives"))
        .unwrap();

    vm.set_search_query("cop");
    assert_eq!(vm.search_query(), "cop");
    assert_eq!(vm.filtered_materials().unwrap().len(), 2);

    vm.select_category("Markers");
    let hits = vm.filtered_materials().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Marker");
}

#[test]
fn failed_actions_record_and_clear_error_message() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    assert!(vm.add_material(NewMaterial::new("", 1, "Paint")).is_err());
    assert_eq!(vm.error_message(), Some("name cannot be empty"));

    vm.clear_error();
    assert!(vm.error_message().is_none());

    assert!(vm.set_quantity("missing", 2).is_err());
    assert!(vm.error_message().unwrap().contains("missing"));
}

#[test]
fn blank_category_is_ignored() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    let before = vm.available_categories().unwrap();
    assert!(vm.add_category("   ").unwrap().is_none());
    assert_eq!(vm.available_categories().unwrap(), before);
    assert!(vm.error_message().is_none());
}

#[test]
fn subscribers_receive_snapshots_after_writes() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    let materials = vm.subscribe_materials().unwrap();
    let logs = vm.subscribe_logs().unwrap();
    let categories = vm.subscribe_categories().unwrap();

    assert_eq!(materials.try_next(), Some(Vec::new()));
    assert_eq!(logs.try_next(), Some(Vec::new()));
    assert!(categories.try_next().unwrap().contains(&"Paint".to_string()));

    vm.add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap();
    let snapshot = materials.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(logs.latest().unwrap().len(), 1);

    vm.add_category("Washi Tape").unwrap();
    assert!(categories
        .latest()
        .unwrap()
        .contains(&"Washi Tape".to_string()));
}

#[test]
fn backup_result_reports_import_counts_and_failures() {
    let source_conn = open_db_in_memory().unwrap();
    let source_files = tempfile::tempdir().unwrap();
    let mut source = InventoryViewModel::new(&source_conn, images(&source_files));
    source
        .add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap();

    let mut buffer = Vec::new();
    source.export_backup(&mut buffer).unwrap();
    assert_eq!(source.backup_result(), Some(&BackupOutcome::ExportSuccess));
    source.clear_backup_result();
    assert!(source.backup_result().is_none());

    let target_conn = open_db_in_memory().unwrap();
    let target_files = tempfile::tempdir().unwrap();
    let mut target = InventoryViewModel::new(&target_conn, images(&target_files));
    target.import_backup(buffer.as_slice()).unwrap();
    assert_eq!(
        target.backup_result(),
        Some(&BackupOutcome::ImportSuccess {
            materials_added: 1,
            logs_added: 1,
        })
    );

    assert!(target.import_backup("oops".as_bytes()).is_err());
    assert!(matches!(
        target.backup_result(),
        Some(BackupOutcome::Failure(_))
    ));

    let missing = target_files.path().join("missing.json");
    assert!(target.import_backup_from_path(&missing).is_err());
    assert!(matches!(
        target.backup_result(),
        Some(BackupOutcome::Failure(_))
    ));
}

#[test]
fn summary_reports_top_category() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    vm.add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap();
    vm.add_material(NewMaterial::new("Sketchbook", 15, "Paper"))
        .unwrap();

    let summary = vm.summary().unwrap();
    assert_eq!(summary.total_items, 2);
    assert_eq!(summary.total_units, 20);
    assert_eq!(summary.top_category.as_deref(), Some("Paper"));
    let stats = vm.category_stats().unwrap();
    assert!((stats[0].percentage - 75.0).abs() < 1e-9);
}

#[test]
fn red_paint_search_stats_and_delete() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    let red = vm
        .add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap()
        .material;

    vm.set_search_query("red");
    let hits = vm.filtered_materials().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, red.id);

    let stats = vm.category_stats().unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].category, "Paint");
    assert!((stats[0].percentage - 100.0).abs() < 1e-9);

    let deleted = vm.delete_material(&red.id).unwrap();
    assert_eq!(deleted.entry.kind, UsageEventKind::Deleted);
    assert_eq!(deleted.entry.quantity_delta, -5);
    assert_eq!(deleted.entry.quantity_after, 0);
    assert!(vm.filtered_materials().unwrap().is_empty());
    assert!(vm.category_stats().unwrap().is_empty());
}

#[test]
fn later_edit_replaces_unanswered_reduction() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));

    let mut paint = vm
        .add_material(NewMaterial::new("Red Paint", 5, "Paint"))
        .unwrap()
        .material;
    paint.quantity = 3;
    vm.update_material(paint.clone()).unwrap();
    assert!(vm.pending_confirmation().is_some());

    paint.quantity = 10;
    let outcome = vm.update_material(paint.clone()).unwrap();
    assert!(matches!(outcome, UpdateOutcome::Restocked(_)));
    assert!(vm.pending_confirmation().is_none());
    assert!(vm.confirm_quantity_change(true).unwrap().is_none());
    assert!(vm
        .journal(JournalFilter::Kind(UsageEventKind::Used))
        .unwrap()
        .is_empty());

    paint.quantity = 4;
    vm.update_material(paint.clone()).unwrap();
    assert!(vm.pending_confirmation().is_some());
    vm.delete_material(&paint.id).unwrap();
    assert!(vm.pending_confirmation().is_none());
}

#[test]
fn material_subscribers_refresh_when_journal_append_fails() {
    let conn = open_db_in_memory().unwrap();
    let files = tempfile::tempdir().unwrap();
    let mut vm = InventoryViewModel::new(&conn, images(&files));
    let materials = vm.subscribe_materials().unwrap();
    assert_eq!(materials.try_next(), Some(Vec::new()));

    conn.execute_batch("DROP TABLE usage_logs;").unwrap();

    let result = vm.add_material(NewMaterial::new("Glue", 2, "Adhesives"));
    assert!(matches!(result, Err(InventoryError::Journal { .. })));
    assert!(vm.error_message().is_some());

    let snapshot = materials.latest().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].name, "Glue");
}
