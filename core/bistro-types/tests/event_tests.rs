use bistro_types::{ChangeEvent, ChangeKind, ChangePayload, Error, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Row {
    id: RecordId,
    name: String,
    available: bool,
}

fn row(id: i64, name: &str, available: bool) -> Row {
    Row {
        id: RecordId::int(id),
        name: name.to_string(),
        available,
    }
}

fn payload(event_type: &str, new: serde_json::Value, old: serde_json::Value) -> ChangePayload {
    ChangePayload {
        event_type: event_type.to_string(),
        new,
        old,
        table: Some("products".into()),
    }
}

// ── ChangeKind ───────────────────────────────────────────────────

#[test]
fn change_kind_parses_case_insensitively() {
    assert_eq!("INSERT".parse::<ChangeKind>().unwrap(), ChangeKind::Insert);
    assert_eq!("update".parse::<ChangeKind>().unwrap(), ChangeKind::Update);
    assert_eq!("Delete".parse::<ChangeKind>().unwrap(), ChangeKind::Delete);
}

#[test]
fn change_kind_rejects_unknown() {
    let err = "TRUNCATE".parse::<ChangeKind>().unwrap_err();
    assert!(matches!(err, Error::UnknownEventType(ref t) if t == "TRUNCATE"));
}

#[test]
fn change_kind_display_matches_wire() {
    assert_eq!(ChangeKind::Insert.to_string(), "INSERT");
    assert_eq!(ChangeKind::Delete.to_string(), "DELETE");
}

// ── Decoding ─────────────────────────────────────────────────────

#[test]
fn decode_insert() {
    let p = payload("INSERT", json!({"id": 1, "name": "Pizza A", "available": true}), json!({}));
    let event = ChangeEvent::<Row>::decode(&p).unwrap();
    assert_eq!(event, ChangeEvent::Insert(row(1, "Pizza A", true)));
}

#[test]
fn decode_update_with_full_old_row() {
    let p = payload(
        "UPDATE",
        json!({"id": 1, "name": "Pizza A", "available": false}),
        json!({"id": 1, "name": "Pizza A", "available": true}),
    );
    let event = ChangeEvent::<Row>::decode(&p).unwrap();
    assert_eq!(
        event,
        ChangeEvent::Update {
            old: row(1, "Pizza A", true),
            new: row(1, "Pizza A", false),
        }
    );
}

#[test]
fn decode_update_with_key_only_old_row_reuses_new() {
    let p = payload(
        "UPDATE",
        json!({"id": 1, "name": "Pizza B", "available": true}),
        json!({"id": 1}),
    );
    match ChangeEvent::<Row>::decode(&p).unwrap() {
        ChangeEvent::Update { old, new } => assert_eq!(old, new),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn decode_update_rejects_key_change() {
    let p = payload(
        "UPDATE",
        json!({"id": 2, "name": "Pizza B", "available": true}),
        json!({"id": 1}),
    );
    assert!(matches!(
        ChangeEvent::<Row>::decode(&p),
        Err(Error::InvalidPayload(_))
    ));
}

#[test]
fn decode_delete_uses_old_id() {
    let p = payload("DELETE", json!({}), json!({"id": 9}));
    let event = ChangeEvent::<Row>::decode(&p).unwrap();
    assert_eq!(event, ChangeEvent::Delete(RecordId::int(9)));
}

#[test]
fn decode_delete_without_id_fails() {
    let p = payload("DELETE", json!({}), json!({}));
    assert!(ChangeEvent::<Row>::decode(&p).is_err());
}

#[test]
fn decode_insert_missing_row_fails() {
    let p = payload("INSERT", json!({}), json!({}));
    assert!(matches!(
        ChangeEvent::<Row>::decode(&p),
        Err(Error::InvalidPayload(_))
    ));
}

#[test]
fn decode_malformed_row_fails() {
    let p = payload("INSERT", json!({"id": 1, "name": 5}), json!({}));
    assert!(ChangeEvent::<Row>::decode(&p).is_err());
}

#[test]
fn decode_unknown_event_type_fails() {
    let p = payload("TRUNCATE", json!({}), json!({}));
    assert!(matches!(
        ChangeEvent::<Row>::decode(&p),
        Err(Error::UnknownEventType(_))
    ));
}

#[test]
fn from_json_parses_wire_text() {
    let text = r#"{"eventType":"INSERT","new":{"id":"a","name":"x","available":true},"old":{}}"#;
    let event = ChangeEvent::<Row>::from_json(text).unwrap();
    assert_eq!(event.kind(), ChangeKind::Insert);
}

#[test]
fn from_json_rejects_garbage() {
    assert!(matches!(
        ChangeEvent::<Row>::from_json("not json"),
        Err(Error::Serialization(_))
    ));
}

// ── Encoding ─────────────────────────────────────────────────────

#[test]
fn to_payload_is_decodable() {
    let events = vec![
        ChangeEvent::Insert(row(1, "A", true)),
        ChangeEvent::Update {
            old: row(1, "A", true),
            new: row(1, "A2", true),
        },
        ChangeEvent::Delete(RecordId::int(1)),
    ];
    for event in events {
        let p = event.to_payload("products").unwrap();
        assert_eq!(p.table.as_deref(), Some("products"));
        assert_eq!(ChangeEvent::<Row>::decode(&p).unwrap(), event);
    }
}
