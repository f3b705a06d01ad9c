//! Shared fixtures for unit and HTTP tests.

use crate::{
    AppState, build_router,
    billing::charges::Rates,
    config::{BillingConfig, Config},
    db::models::{rooms::Room, tenants::Tenant},
    email::{BillingNotice, NoticeKind, NotificationSender},
    errors::Result,
    export::{ExportSink, JsonFileSink},
    occupancy::{NewRoom, NewTenant},
    store::{InMemoryStore, Store},
    types::{RoomId, TenantId},
};
use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub fn test_rates() -> Rates {
    test_billing_config().rates()
}

/// 3000 per kWh, 50000 per fixture, alerts after the 26th
pub fn test_billing_config() -> BillingConfig {
    BillingConfig::default()
}

/// Room on floor 1 at 3,000,000 with one bathroom and one shower
pub fn sample_new_room(room_number: &str) -> NewRoom {
    NewRoom {
        room_number: Some(room_number.to_string()),
        floor: Some(1),
        price: Some(Decimal::from(3_000_000)),
        bathroom_count: Some(1),
        shower_count: Some(1),
    }
}

pub fn sample_new_tenant(room_id: RoomId, citizen_id: &str) -> NewTenant {
    NewTenant {
        room_id: Some(room_id),
        name: Some("Lan".to_string()),
        citizen_id: Some(citizen_id.to_string()),
        phone: Some("0900".to_string()),
        email: None,
        move_in_date: Some("2024-01-01".to_string()),
    }
}

/// A stored room record matching [`sample_new_room`], without touching a store
pub fn sample_room(room_number: &str) -> Room {
    let now = Utc::now();
    Room {
        id: Uuid::new_v4(),
        room_number: room_number.to_string(),
        floor: 1,
        price: Decimal::from(3_000_000),
        bathroom_count: 1,
        shower_count: 1,
        tenant_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_tenant(room_id: RoomId, citizen_id: &str) -> Tenant {
    let now = Utc::now();
    Tenant {
        id: TenantId::new_v4(),
        citizen_id: citizen_id.to_string(),
        name: "Lan".to_string(),
        phone: "0900".to_string(),
        email: None,
        move_in_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        room_id: Some(room_id),
        old_meter_reading: 0,
        new_meter_reading: 0,
        total_cost: Decimal::ZERO,
        is_paid: false,
        billing_period: None,
        created_at: now,
        updated_at: now,
    }
}

/// JSON body for `POST /api/v1/rooms`
pub fn room_body(room_number: &str) -> serde_json::Value {
    json!({
        "room_number": room_number,
        "floor": 1,
        "price": "3000000",
        "bathroom_count": 1,
        "shower_count": 1,
    })
}

/// JSON body for `POST /api/v1/tenants`
pub fn tenant_body(room_id: RoomId, citizen_id: &str) -> serde_json::Value {
    json!({
        "room_id": room_id,
        "name": "Lan",
        "citizen_id": citizen_id,
        "phone": "0900",
        "move_in_date": "2024-01-01",
    })
}

/// Notification sender that remembers what it was asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(NoticeKind, BillingNotice)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(NoticeKind, BillingNotice)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send_invoice(&self, notice: &BillingNotice) -> Result<()> {
        self.sent.lock().push((NoticeKind::Invoice, notice.clone()));
        Ok(())
    }

    async fn send_reminder(&self, notice: &BillingNotice) -> Result<()> {
        self.sent.lock().push((NoticeKind::Reminder, notice.clone()));
        Ok(())
    }
}

/// Handles kept alive alongside a test server
pub struct TestHarness {
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<InMemoryStore>,
    pub export_dir: TempDir,
}

fn test_state(notifier: Option<Arc<dyn NotificationSender>>, store: Arc<InMemoryStore>, export_dir: &TempDir) -> AppState {
    AppState::builder()
        .store(store as Arc<dyn Store>)
        .config(Config::default())
        .maybe_notifier(notifier)
        .export_sink(Arc::new(JsonFileSink::new(export_dir.path())) as Arc<dyn ExportSink>)
        .build()
}

/// Server over an empty in-memory store, with a recording notifier
pub fn create_test_server() -> (TestServer, TestHarness) {
    let harness = TestHarness {
        notifier: Arc::new(RecordingNotifier::default()),
        store: Arc::new(InMemoryStore::new()),
        export_dir: tempfile::tempdir().expect("Failed to create export dir"),
    };
    let state = test_state(
        Some(harness.notifier.clone() as Arc<dyn NotificationSender>),
        harness.store.clone(),
        &harness.export_dir,
    );
    let router = build_router(state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, harness)
}

/// Server with email disabled
pub fn create_test_server_without_email() -> TestServer {
    let export_dir = tempfile::tempdir().expect("Failed to create export dir");
    let state = test_state(None, Arc::new(InMemoryStore::new()), &export_dir);
    let router = build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}
