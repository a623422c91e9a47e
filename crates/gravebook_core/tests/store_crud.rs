use gravebook_core::{
    Cemetery, Coordinate, EntityKind, Individual, Photo, PhotoKind, Plot, RecordStore, StoreError,
    SyncState,
};

fn store_with_backend() -> RecordStore {
    let mut store = RecordStore::new();
    store.configure_backend();
    store
}

#[test]
fn create_and_query_roundtrip() {
    let mut store = store_with_backend();

    let cemetery = Cemetery::new("Oakwood Cemetery");
    let cemetery_id = store.create_cemetery(cemetery).unwrap();

    let plot = Plot::new(cemetery_id, "A-001");
    let plot_id = store.create_plot(plot).unwrap();

    let loaded = store.plot(plot_id).unwrap();
    assert_eq!(loaded.cemetery_id, cemetery_id);
    assert_eq!(loaded.plot_number, "A-001");
    assert_eq!(store.plots_in(cemetery_id).len(), 1);
}

#[test]
fn create_rejects_empty_names() {
    let mut store = store_with_backend();
    let err = store
        .create_cemetery(Cemetery::new("   "))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn plot_requires_existing_cemetery() {
    let mut store = store_with_backend();
    let orphan = Plot::new(uuid::Uuid::new_v4(), "B-002");
    let err = store.create_plot(orphan).unwrap_err();
    assert!(matches!(
        err,
        StoreError::MissingOwner {
            kind: EntityKind::Plot,
            owner: EntityKind::Cemetery,
            ..
        }
    ));
}

#[test]
fn individual_and_photo_require_existing_plot() {
    let mut store = store_with_backend();
    let missing_plot = uuid::Uuid::new_v4();

    let err = store
        .create_individual(Individual::new(missing_plot, "John Smith"))
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingOwner { .. }));

    let err = store
        .create_photo(Photo::new(missing_plot, "stone.jpg", PhotoKind::Headstone))
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingOwner { .. }));
}

#[test]
fn every_mutation_bumps_local_revision() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    let record = store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .unwrap();
    assert_eq!(record.local_revision, 1);
    assert_eq!(record.state, SyncState::PendingPush);

    let coordinate = Coordinate::new(40.7128, -74.0060).unwrap();
    store
        .set_cemetery_coordinate(cemetery_id, Some(coordinate))
        .unwrap();
    let record = store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .unwrap();
    assert_eq!(record.local_revision, 2);
    assert_eq!(
        store.cemetery(cemetery_id).unwrap().coordinate,
        Some(coordinate)
    );
}

#[test]
fn offline_session_marks_records_local_only_until_backend_appears() {
    let mut store = RecordStore::new();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    let record = store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .unwrap();
    assert_eq!(record.state, SyncState::LocalOnly);

    store.configure_backend();
    let record = store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .unwrap();
    assert_eq!(record.state, SyncState::PendingPush);
}

#[test]
fn delete_of_never_pushed_record_drops_metadata() {
    let mut store = RecordStore::new();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    store.delete_cemetery(cemetery_id).unwrap();
    assert!(store.cemetery(cemetery_id).is_none());
    assert!(store.sync_record(EntityKind::Cemetery, cemetery_id).is_none());
}

#[test]
fn delete_of_pending_record_leaves_tombstone() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    store.delete_cemetery(cemetery_id).unwrap();
    assert!(store.cemetery(cemetery_id).is_none());

    let record = store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .expect("pending delete must keep a tombstone");
    assert!(record.tombstone);
    assert_eq!(record.state, SyncState::PendingPush);
    assert_eq!(record.local_revision, 2);
}

#[test]
fn cemetery_delete_cascades_to_plots_individuals_and_photos() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    let plot_id = store.create_plot(Plot::new(cemetery_id, "A-001")).unwrap();
    let individual_id = store
        .create_individual(Individual::new(plot_id, "John Smith"))
        .unwrap();
    let photo_id = store
        .create_photo(Photo::new(plot_id, "stone.jpg", PhotoKind::Headstone))
        .unwrap();

    store.delete_cemetery(cemetery_id).unwrap();

    assert!(store.plot(plot_id).is_none());
    assert!(store.individual(individual_id).is_none());
    assert!(store.photo(photo_id).is_none());
    // Each cascaded record keeps its own tombstone.
    assert!(store.sync_record(EntityKind::Plot, plot_id).unwrap().tombstone);
    assert!(store
        .sync_record(EntityKind::Individual, individual_id)
        .unwrap()
        .tombstone);
    assert!(store.sync_record(EntityKind::Photo, photo_id).unwrap().tombstone);
}

#[test]
fn attach_ocr_text_validates_confidence_range() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    let plot_id = store.create_plot(Plot::new(cemetery_id, "A-001")).unwrap();
    let photo_id = store
        .create_photo(Photo::new(plot_id, "stone.jpg", PhotoKind::Headstone))
        .unwrap();

    let err = store
        .attach_ocr_text(photo_id, "IN LOVING MEMORY", 1.2)
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.photo(photo_id).unwrap().ocr.is_none());

    store
        .attach_ocr_text(photo_id, "IN LOVING MEMORY", 0.87)
        .unwrap();
    let ocr = store.photo(photo_id).unwrap().ocr.as_ref().unwrap();
    assert_eq!(ocr.text, "IN LOVING MEMORY");
    assert_eq!(ocr.confidence, 0.87);
}

#[test]
fn queries_do_not_touch_sync_state() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    let before = store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .unwrap()
        .clone();

    let _ = store.list_cemeteries();
    let _ = store.search("oak");
    let _ = store.plots_in(cemetery_id);

    let after = store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .unwrap();
    assert_eq!(&before, after);
}

#[test]
fn search_matches_names_numbers_and_epitaphs_case_insensitively() {
    let mut store = store_with_backend();
    let cemetery_id = store
        .create_cemetery(Cemetery::new("Oakwood Cemetery"))
        .unwrap();
    let plot_id = store.create_plot(Plot::new(cemetery_id, "A-001")).unwrap();
    let mut individual = Individual::new(plot_id, "Mary Johnson");
    individual.epitaph = "Beloved Mother".to_string();
    store.create_individual(individual).unwrap();

    assert_eq!(store.search("OAKWOOD").len(), 1);
    assert_eq!(store.search("a-001").len(), 1);
    assert_eq!(store.search("beloved").len(), 1);
    assert!(store.search("nomatch").is_empty());
    assert!(store.search("   ").is_empty());
}

#[test]
fn update_of_missing_record_reports_not_found() {
    let mut store = store_with_backend();
    let ghost = Cemetery::new("Ghost Hill");
    let err = store.update_cemetery(ghost.clone()).unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            kind: EntityKind::Cemetery,
            id
        } if id == ghost.id
    ));
}
