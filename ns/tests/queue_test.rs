//! Integration tests for queue runs
//!
//! These drive the public API against a scripted messaging client; nothing
//! touches a real network.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notifysender::{
    ChatHandle, DryRunClient, LifecycleEvent, Media, MessageId, MessagingClient, MessagingError, PacingProfile,
    QueueRunner, RecordProcessor, Session, SessionError,
};
use queuestore::RecordStore;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Scripted stand-in for a messaging account
struct FakeClient {
    events: Vec<LifecycleEvent>,
    registered: HashSet<String>,
    resolved: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl FakeClient {
    fn new(registered: &[&str]) -> Self {
        Self {
            events: vec![LifecycleEvent::Ready],
            registered: registered.iter().map(|s| s.to_string()).collect(),
            resolved: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingClient for FakeClient {
    fn name(&self) -> &str {
        "fake"
    }

    async fn initialize(&mut self, events: mpsc::Sender<LifecycleEvent>) -> Result<(), MessagingError> {
        for event in self.events.clone() {
            events.send(event).await.unwrap();
        }
        Ok(())
    }

    async fn resolve(&self, number: &str) -> Result<Option<ChatHandle>, MessagingError> {
        self.resolved.lock().unwrap().push(number.to_string());
        Ok(self.registered.contains(number).then(|| ChatHandle::new(number)))
    }

    async fn send_media(&self, chat: &ChatHandle, media: Media, caption: &str) -> Result<MessageId, MessagingError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat.id.clone(), media.filename, caption.to_string()));
        Ok("wamid.test".to_string())
    }

    async fn disconnect(&mut self) -> Result<(), MessagingError> {
        Ok(())
    }
}

struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new(records: Value) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp.path().join("pdfs")).unwrap();
        fs::write(temp.path().join("output.json"), serde_json::to_string_pretty(&records).unwrap()).unwrap();
        Self { temp }
    }

    fn attach(&self, name: &str) {
        fs::write(self.temp.path().join("pdfs").join(name), b"%PDF-1.7").unwrap();
    }

    fn store_path(&self) -> std::path::PathBuf {
        self.temp.path().join("output.json")
    }

    fn runner(&self) -> QueueRunner {
        runner_for(self.temp.path())
    }

    fn records(&self) -> Vec<Value> {
        let content = fs::read_to_string(self.store_path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}

fn runner_for(root: &Path) -> QueueRunner {
    let processor = RecordProcessor::new(PacingProfile::immediate(), root.join("pdfs"), Duration::from_secs(5));
    QueueRunner::new(RecordStore::new(root.join("output.json")), processor)
}

fn scenario_record() -> Value {
    json!({
        "name": "A",
        "phone": "555-1234",
        "countryCode": "1",
        "filename": "a.pdf",
        "message": "hi",
        "status": "PENDING"
    })
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[tokio::test]
async fn test_pending_record_is_sent() {
    let fixture = Fixture::new(json!([scenario_record()]));
    fixture.attach("a.pdf");
    let client = FakeClient::new(&["15551234"]);
    let started = Utc::now();

    let summary = fixture.runner().run(&client).await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(client.resolved(), vec!["15551234".to_string()]);
    assert_eq!(
        client.sent(),
        vec![("15551234".to_string(), "a.pdf".to_string(), "hi".to_string())]
    );

    let records = fixture.records();
    assert_eq!(records[0]["status"], "SENT");
    let sent_at: DateTime<Utc> = records[0]["sent_at"].as_str().unwrap().parse().unwrap();
    assert!(sent_at >= started - chrono::Duration::milliseconds(1));
    assert!(records[0].get("error_msg").is_none());
}

#[tokio::test]
async fn test_missing_attachment_is_file_missing() {
    let fixture = Fixture::new(json!([scenario_record()]));
    let client = FakeClient::new(&["15551234"]);

    let summary = fixture.runner().run(&client).await.unwrap();

    assert_eq!(summary.file_missing, 1);
    assert!(client.resolved().is_empty());
    assert!(client.sent().is_empty());
    let records = fixture.records();
    assert_eq!(records[0]["status"], "ERROR_FILE_MISSING");
    assert!(records[0].get("sent_at").is_none());
}

#[tokio::test]
async fn test_receipt_not_required_is_skipped() {
    let mut record = scenario_record();
    record["send_receipt"] = json!(false);
    let fixture = Fixture::new(json!([record]));
    fixture.attach("a.pdf");
    let client = FakeClient::new(&["15551234"]);

    fixture.runner().run(&client).await.unwrap();

    assert!(client.resolved().is_empty());
    assert!(client.sent().is_empty());
    assert_eq!(fixture.records()[0]["status"], "SKIPPED_NO_RECEIPT");
}

#[tokio::test]
async fn test_unregistered_number_fails() {
    let fixture = Fixture::new(json!([scenario_record()]));
    fixture.attach("a.pdf");
    let client = FakeClient::new(&[]);

    let summary = fixture.runner().run(&client).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(client.resolved().len(), 1);
    assert!(client.sent().is_empty());
    let records = fixture.records();
    assert_eq!(records[0]["status"], "FAILED");
    assert!(!records[0]["error_msg"].as_str().unwrap().is_empty());
    assert!(records[0].get("sent_at").is_none());
}

#[tokio::test]
async fn test_missing_contact_fields() {
    let fixture = Fixture::new(json!([
        {"name": "NoPhone", "countryCode": "1", "filename": "a.pdf", "status": "PENDING"},
        {"name": "NoCode", "phone": "555", "countryCode": "", "filename": "a.pdf", "status": "PENDING"},
        {"name": "ZeroCode", "phone": "555", "countryCode": 0, "filename": "gone.pdf", "status": "PENDING"}
    ]));
    fixture.attach("a.pdf");
    let client = FakeClient::new(&["1555"]);

    let summary = fixture.runner().run(&client).await.unwrap();

    assert_eq!(summary.phone_missing, 3);
    assert!(client.resolved().is_empty());
    for record in fixture.records() {
        assert_eq!(record["status"], "ERROR_PHONE_MISSING");
    }
}

// =============================================================================
// Store properties
// =============================================================================

#[tokio::test]
async fn test_settled_records_are_untouched() {
    let settled = json!([
        {"filename": "a.pdf", "name": "S", "phone": "555-1234", "lot": "L-1", "status": "SENT", "countryCode": "1", "sent_at": "2025-05-01T12:00:00.000Z", "error_msg": null},
        {"name": "F", "phone": "555-1234", "countryCode": "1", "filename": "a.pdf", "status": "FAILED", "error_msg": "Evaluation failed: Error: wid error", "sent_at": null},
        {"name": "U", "phone": "555-1234", "countryCode": "1", "filename": "a.pdf", "status": "ON_HOLD"},
        {"name": "N", "phone": "555-1234", "countryCode": "1", "filename": "a.pdf"},
        scenario_record()
    ]);
    let fixture = Fixture::new(settled.clone());
    fixture.attach("a.pdf");
    let client = FakeClient::new(&["15551234"]);

    let summary = fixture.runner().run(&client).await.unwrap();

    assert_eq!(summary.already_settled, 4);
    assert_eq!(summary.sent, 1);
    let records = fixture.records();
    // Compared as text so key order and null values count too
    for idx in 0..4 {
        assert_eq!(
            serde_json::to_string(&records[idx]).unwrap(),
            serde_json::to_string(&settled[idx]).unwrap(),
            "record {} changed",
            idx
        );
    }
    assert_eq!(records[4]["status"], "SENT");
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let mut declined = scenario_record();
    declined["name"] = json!("B");
    declined["send_receipt"] = json!(false);
    let mut orphan = scenario_record();
    orphan["name"] = json!("C");
    orphan["filename"] = json!("c.pdf");
    let fixture = Fixture::new(json!([scenario_record(), declined, orphan]));
    fixture.attach("a.pdf");
    let client = FakeClient::new(&["15551234"]);

    fixture.runner().run(&client).await.unwrap();
    let after_first = fs::read(fixture.store_path()).unwrap();

    let summary = fixture.runner().run(&client).await.unwrap();
    let after_second = fs::read(fixture.store_path()).unwrap();

    assert_eq!(summary.already_settled, 3);
    assert_eq!(summary.settled(), 0);
    assert_eq!(client.sent().len(), 1);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_order_and_extra_fields_preserved() {
    let fixture = Fixture::new(json!([
        {"name": "Z", "phone": 5550001, "countryCode": 52, "filename": "z.pdf", "message": "m", "status": "PENDING", "invoice_number": "0042", "pending_amount": 0.0},
        {"name": "A", "phone": "555-0002", "countryCode": "1", "filename": "a.pdf", "message": "m", "status": "PENDING", "invoice_number": "0043"}
    ]));
    fixture.attach("z.pdf");
    fixture.attach("a.pdf");
    let client = FakeClient::new(&["525550001", "15550002"]);

    fixture.runner().run(&client).await.unwrap();

    assert_eq!(client.resolved(), vec!["525550001".to_string(), "15550002".to_string()]);
    let records = fixture.records();
    assert_eq!(records[0]["name"], "Z");
    assert_eq!(records[0]["phone"], json!(5550001));
    assert_eq!(records[0]["countryCode"], json!(52));
    assert_eq!(records[0]["invoice_number"], "0042");
    assert_eq!(records[1]["name"], "A");
    assert_eq!(records[1]["invoice_number"], "0043");
}

#[tokio::test]
async fn test_odd_field_types_stay_record_local() {
    let fixture = Fixture::new(json!([
        {"name": 42, "phone": "555-1234", "countryCode": "1", "filename": ["a.pdf"], "status": "PENDING"},
        scenario_record()
    ]));
    fixture.attach("a.pdf");
    let client = FakeClient::new(&["15551234"]);

    let summary = fixture.runner().run(&client).await.unwrap();

    assert_eq!(summary.file_missing, 1);
    assert_eq!(summary.sent, 1);
    let records = fixture.records();
    assert_eq!(records[0]["status"], "ERROR_FILE_MISSING");
    assert_eq!(records[0]["name"], json!(42));
    assert_eq!(records[1]["status"], "SENT");
}

#[tokio::test]
async fn test_dry_run_leaves_store_bytes_unchanged() {
    let mut declined = scenario_record();
    declined["send_receipt"] = json!(false);
    let fixture = Fixture::new(json!([scenario_record(), declined]));
    fixture.attach("a.pdf");
    let before = fs::read(fixture.store_path()).unwrap();

    let summary = fixture.runner().read_only().run(&DryRunClient::new()).await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped_no_receipt, 1);
    assert_eq!(fs::read(fixture.store_path()).unwrap(), before);
}

#[tokio::test]
async fn test_missing_store_processes_nothing() {
    let temp = TempDir::new().unwrap();
    let client = FakeClient::new(&["15551234"]);

    let summary = runner_for(temp.path()).run(&client).await.unwrap();

    assert_eq!(summary.loaded, 0);
    assert!(client.resolved().is_empty());
    assert!(!temp.path().join("output.json").exists());
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_session_auth_failure_is_fatal() {
    let mut client = FakeClient::new(&[]);
    client.events = vec![LifecycleEvent::AuthenticationFailed("session logged out".to_string())];

    let result = Session::open(Box::new(client), Duration::from_secs(1)).await;
    assert!(matches!(result, Err(SessionError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_session_drives_a_run() {
    let fixture = Fixture::new(json!([scenario_record()]));
    fixture.attach("a.pdf");

    let session = Session::open(Box::new(FakeClient::new(&["15551234"])), Duration::from_secs(1))
        .await
        .unwrap();
    let summary = fixture.runner().run(session.client()).await.unwrap();
    session.close().await.unwrap();

    assert_eq!(summary.sent, 1);
}
