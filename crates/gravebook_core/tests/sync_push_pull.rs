mod common;

use common::{unreachable, StubGateway};
use gravebook_core::{
    Cemetery, Entity, EntityKind, GatewayResponse, Method, Plot, RecordStore, SyncManager,
    SyncState, TransportError,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const TIMEOUT_MS: u64 = 2_000;

fn store_with_backend() -> RecordStore {
    let mut store = RecordStore::new();
    store.configure_backend();
    store
}

/// Handler that acks every upsert by echoing the pushed revision and
/// answers every pull with an empty page.
fn ack_all() -> Arc<StubGateway> {
    Arc::new(StubGateway::with_handler(|call| match call.method {
        Method::Put => {
            let revision = call.body.as_ref().and_then(|b| b["revision"].as_u64());
            Ok(GatewayResponse {
                status: 200,
                body: json!({ "revision": revision.unwrap_or(0) }).to_string(),
            })
        }
        Method::Delete => Ok(GatewayResponse {
            status: 200,
            body: "{}".to_string(),
        }),
        Method::Get => Ok(GatewayResponse {
            status: 200,
            body: json!({ "records": [] }).to_string(),
        }),
    }))
}

#[test]
fn push_marks_records_synced_with_matching_revisions() {
    let gateway = ack_all();
    let manager = SyncManager::new(gateway.clone());
    let mut store = store_with_backend();

    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    let plot_id = store.create_plot(Plot::new(cemetery_id, "A-001")).unwrap();

    let report = manager.push_pending(&mut store, TIMEOUT_MS);
    assert!(report.is_clean());
    assert_eq!(report.succeeded.len(), 2);
    // Owners push before dependents.
    assert_eq!(report.succeeded[0].kind, EntityKind::Cemetery);
    assert_eq!(report.succeeded[1].kind, EntityKind::Plot);

    for (kind, id) in [
        (EntityKind::Cemetery, cemetery_id),
        (EntityKind::Plot, plot_id),
    ] {
        let record = store.sync_record(kind, id).unwrap();
        assert_eq!(record.state, SyncState::Synced);
        assert_eq!(record.remote_revision, Some(record.local_revision));
    }
}

#[test]
fn pushing_unmodified_entity_twice_stays_idempotent() {
    let upserts: Arc<Mutex<HashMap<String, u32>>> = Arc::new(Mutex::new(HashMap::new()));
    let seen = upserts.clone();
    let gateway = Arc::new(StubGateway::with_handler(move |call| {
        assert_eq!(call.method, Method::Put);
        *seen.lock().unwrap().entry(call.path.clone()).or_insert(0) += 1;
        let revision = call.body.as_ref().and_then(|b| b["revision"].as_u64());
        Ok(GatewayResponse {
            status: 200,
            body: json!({ "revision": revision.unwrap_or(0) }).to_string(),
        })
    }));
    let manager = SyncManager::new(gateway.clone());
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    let first = manager.push_pending(&mut store, TIMEOUT_MS);
    assert_eq!(first.succeeded.len(), 1);
    // Nothing changed locally, so the second batch has nothing to send.
    let second = manager.push_pending(&mut store, TIMEOUT_MS);
    assert!(second.succeeded.is_empty());
    assert!(second.is_clean());

    // One backend record, one upsert in total.
    assert_eq!(upserts.lock().unwrap().len(), 1);
    let record = store.sync_record(EntityKind::Cemetery, cemetery_id).unwrap();
    assert_eq!(record.remote_revision, Some(record.local_revision));
}

#[test]
fn one_record_failure_never_aborts_the_batch() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    let plot_a = store.create_plot(Plot::new(cemetery_id, "A-001")).unwrap();
    let plot_b = store.create_plot(Plot::new(cemetery_id, "B-002")).unwrap();

    let failing_path = format!("/api/plots/{plot_a}");
    let gateway = Arc::new(StubGateway::with_handler(move |call| {
        if call.path == failing_path {
            return Err(unreachable());
        }
        let revision = call.body.as_ref().and_then(|b| b["revision"].as_u64());
        Ok(GatewayResponse {
            status: 200,
            body: json!({ "revision": revision.unwrap_or(0) }).to_string(),
        })
    }));
    let manager = SyncManager::new(gateway.clone());

    let report = manager.push_pending(&mut store, TIMEOUT_MS);

    // All three were attempted; exactly the broken one failed.
    assert_eq!(gateway.call_count(), 3);
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, Some(plot_a));

    assert_eq!(
        store.sync_record(EntityKind::Plot, plot_a).unwrap().state,
        SyncState::PushFailed
    );
    assert_eq!(
        store.sync_record(EntityKind::Plot, plot_b).unwrap().state,
        SyncState::Synced
    );
    // The failed record stays fully usable locally.
    assert!(store.plot(plot_a).is_some());
    let mut edited = store.plot(plot_a).unwrap().clone();
    edited.section = "North".to_string();
    store.update_plot(edited).unwrap();
}

#[test]
fn failed_records_are_retried_on_the_next_batch() {
    let mut store = store_with_backend();
    store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    let broken = Arc::new(StubGateway::with_handler(|_| Err(unreachable())));
    let report = SyncManager::new(broken).push_pending(&mut store, TIMEOUT_MS);
    assert_eq!(report.failed.len(), 1);

    let healthy = ack_all();
    let report = SyncManager::new(healthy).push_pending(&mut store, TIMEOUT_MS);
    assert!(report.is_clean());
    assert_eq!(report.succeeded.len(), 1);
}

#[test]
fn tombstoned_delete_is_pushed_and_cleared() {
    let gateway = ack_all();
    let manager = SyncManager::new(gateway.clone());
    let mut store = store_with_backend();

    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    manager.push_pending(&mut store, TIMEOUT_MS);
    assert_eq!(
        store
            .sync_record(EntityKind::Cemetery, cemetery_id)
            .unwrap()
            .state,
        SyncState::Synced
    );

    store.delete_cemetery(cemetery_id).unwrap();
    let report = manager.push_pending(&mut store, TIMEOUT_MS);
    assert!(report.is_clean());
    assert_eq!(report.succeeded.len(), 1);

    // Delete confirmed: the tombstone has done its job.
    assert!(store.sync_record(EntityKind::Cemetery, cemetery_id).is_none());
    let deletes: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter(|call| call.method == Method::Delete)
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].path, format!("/api/cemeteries/{cemetery_id}"));
}

#[test]
fn delete_of_record_unknown_to_backend_counts_as_reconciled() {
    let gateway = Arc::new(StubGateway::with_handler(|call| match call.method {
        Method::Delete => Err(TransportError::Http {
            status: 404,
            message: "not found".to_string(),
            suggestion: None,
        }),
        _ => {
            let revision = call.body.as_ref().and_then(|b| b["revision"].as_u64());
            Ok(GatewayResponse {
                status: 200,
                body: json!({ "revision": revision.unwrap_or(0) }).to_string(),
            })
        }
    }));
    let manager = SyncManager::new(gateway);
    let mut store = store_with_backend();

    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    manager.push_pending(&mut store, TIMEOUT_MS);
    store.delete_cemetery(cemetery_id).unwrap();

    let report = manager.push_pending(&mut store, TIMEOUT_MS);
    assert!(report.is_clean());
    assert!(store.sync_record(EntityKind::Cemetery, cemetery_id).is_none());
}

fn cemetery_page_body(cemetery: &Cemetery, revision: u64) -> String {
    json!({
        "records": [{ "revision": revision, "record": cemetery }]
    })
    .to_string()
}

/// Handler serving one remote cemetery and empty pages for other kinds.
fn serve_cemetery(cemetery: Cemetery, revision: u64) -> Arc<StubGateway> {
    Arc::new(StubGateway::with_handler(move |call| {
        assert_eq!(call.method, Method::Get);
        if call.path == "/api/cemeteries" {
            Ok(GatewayResponse {
                status: 200,
                body: cemetery_page_body(&cemetery, revision),
            })
        } else {
            Ok(GatewayResponse {
                status: 200,
                body: json!({ "records": [] }).to_string(),
            })
        }
    }))
}

#[test]
fn pull_applies_remote_records_unknown_locally() {
    let remote_id = Uuid::new_v4();
    let mut remote = Cemetery::with_id(remote_id, "Riverside Cemetery");
    remote.location = "Riverside, IA".to_string();

    let manager = SyncManager::new(serve_cemetery(remote, 4));
    let mut store = store_with_backend();

    let report = manager.pull_updates(&mut store, TIMEOUT_MS);
    assert!(report.is_clean());
    assert_eq!(report.succeeded.len(), 1);

    let pulled = store.cemetery(remote_id).unwrap();
    assert_eq!(pulled.name, "Riverside Cemetery");
    let record = store.sync_record(EntityKind::Cemetery, remote_id).unwrap();
    assert_eq!(record.state, SyncState::Synced);
    assert_eq!(record.remote_revision, Some(4));
}

#[test]
fn pull_never_overwrites_unpushed_local_edits() {
    let mut store = store_with_backend();
    let cemetery_id = store
        .create_cemetery(Cemetery::new("Oakwood Cemetery"))
        .unwrap();

    // Remote copy with the same id but different content and a revision
    // this session has never observed.
    let mut remote = Cemetery::with_id(cemetery_id, "Oakwood (remote rename)");
    remote.description = "edited elsewhere".to_string();

    let manager = SyncManager::new(serve_cemetery(remote, 9));
    let report = manager.pull_updates(&mut store, TIMEOUT_MS);

    // Local copy untouched, record flagged for manual resolution.
    assert_eq!(store.cemetery(cemetery_id).unwrap().name, "Oakwood Cemetery");
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(
        store
            .sync_record(EntityKind::Cemetery, cemetery_id)
            .unwrap()
            .state,
        SyncState::Conflict
    );
}

#[test]
fn pull_cannot_resurrect_a_tombstoned_record() {
    let gateway = ack_all();
    let manager = SyncManager::new(gateway);
    let mut store = store_with_backend();

    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    manager.push_pending(&mut store, TIMEOUT_MS);
    store.delete_cemetery(cemetery_id).unwrap();

    // Backend still serves the record (the delete has not been pushed).
    let stale_remote = Cemetery::with_id(cemetery_id, "Oakwood");
    let manager = SyncManager::new(serve_cemetery(stale_remote, 8));
    let report = manager.pull_updates(&mut store, TIMEOUT_MS);

    assert!(store.cemetery(cemetery_id).is_none());
    assert_eq!(report.skipped, 1);
    assert!(store
        .sync_record(EntityKind::Cemetery, cemetery_id)
        .unwrap()
        .tombstone);
}

#[test]
fn pull_fetch_failure_degrades_to_noop_for_that_kind() {
    let gateway = Arc::new(StubGateway::with_handler(|_| Err(unreachable())));
    let manager = SyncManager::new(gateway);
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    let report = manager.pull_updates(&mut store, TIMEOUT_MS);

    assert_eq!(report.failed.len(), 4);
    assert!(report.failed.iter().all(|failure| failure.id.is_none()));
    assert!(report.succeeded.is_empty());
    // Store unchanged; the operator can keep working locally.
    assert!(store.cemetery(cemetery_id).is_some());
    assert_eq!(
        store
            .sync_record(EntityKind::Cemetery, cemetery_id)
            .unwrap()
            .state,
        SyncState::PendingPush
    );
}

#[test]
fn pull_uses_the_remote_watermark_as_since() {
    let gateway = ack_all();
    let manager = SyncManager::new(gateway.clone());
    let mut store = store_with_backend();
    store.create_cemetery(Cemetery::new("Oakwood")).unwrap();
    manager.push_pending(&mut store, TIMEOUT_MS);

    manager.pull_updates(&mut store, TIMEOUT_MS);
    let pulls: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter(|call| call.method == Method::Get && call.path == "/api/cemeteries")
        .collect();
    assert_eq!(pulls.len(), 1);
    // The cemetery pushed at local revision 1; since must reflect it.
    assert_eq!(
        pulls[0].query,
        vec![("since".to_string(), "1".to_string())]
    );
}

#[test]
fn conflict_resolution_keep_local_requeues_the_record() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    let remote = Cemetery::with_id(cemetery_id, "Oakwood (remote)");
    SyncManager::new(serve_cemetery(remote, 6)).pull_updates(&mut store, TIMEOUT_MS);
    assert_eq!(
        store
            .sync_record(EntityKind::Cemetery, cemetery_id)
            .unwrap()
            .state,
        SyncState::Conflict
    );

    store
        .resolve_conflict_keep_local(EntityKind::Cemetery, cemetery_id)
        .unwrap();
    assert_eq!(
        store
            .sync_record(EntityKind::Cemetery, cemetery_id)
            .unwrap()
            .state,
        SyncState::PendingPush
    );
    assert_eq!(store.cemetery(cemetery_id).unwrap().name, "Oakwood");
}

#[test]
fn conflict_resolution_accept_remote_replaces_the_local_copy() {
    let mut store = store_with_backend();
    let cemetery_id = store.create_cemetery(Cemetery::new("Oakwood")).unwrap();

    let remote = Cemetery::with_id(cemetery_id, "Oakwood (remote)");
    SyncManager::new(serve_cemetery(remote.clone(), 6)).pull_updates(&mut store, TIMEOUT_MS);

    store
        .resolve_conflict_accept_remote(Entity::Cemetery(remote), 6)
        .unwrap();
    assert_eq!(store.cemetery(cemetery_id).unwrap().name, "Oakwood (remote)");
    let record = store.sync_record(EntityKind::Cemetery, cemetery_id).unwrap();
    assert_eq!(record.state, SyncState::Synced);
    assert_eq!(record.remote_revision, Some(6));
}
