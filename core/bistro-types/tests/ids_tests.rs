use bistro_types::RecordId;
use serde_json::json;
use std::collections::HashSet;

// ── Construction ─────────────────────────────────────────────────

#[test]
fn int_and_text_ids_display() {
    assert_eq!(RecordId::int(42).to_string(), "42");
    assert_eq!(RecordId::text("pizza-a").to_string(), "pizza-a");
}

#[test]
fn int_and_text_forms_are_distinct() {
    assert_ne!(RecordId::int(1), RecordId::text("1"));
}

#[test]
fn as_int_only_for_sequence_keys() {
    assert_eq!(RecordId::from(7).as_int(), Some(7));
    assert_eq!(RecordId::from("7").as_int(), None);
}

#[test]
fn ids_hash_by_identity() {
    let set: HashSet<RecordId> = [RecordId::int(1), RecordId::int(1), RecordId::text("a")]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 2);
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn deserializes_integer_and_string_keys() {
    let a: RecordId = serde_json::from_value(json!(12)).unwrap();
    let b: RecordId = serde_json::from_value(json!("3f1c")).unwrap();
    assert_eq!(a, RecordId::int(12));
    assert_eq!(b, RecordId::text("3f1c"));
}

#[test]
fn serializes_in_original_form() {
    assert_eq!(serde_json::to_value(RecordId::int(12)).unwrap(), json!(12));
    assert_eq!(serde_json::to_value(RecordId::text("x")).unwrap(), json!("x"));
}

#[test]
fn from_row_reads_id_member() {
    assert_eq!(RecordId::from_row(&json!({"id": 5, "name": "x"})), Some(RecordId::int(5)));
    assert_eq!(RecordId::from_row(&json!({"name": "x"})), None);
    assert_eq!(RecordId::from_row(&json!({"id": null})), None);
}

#[test]
fn generated_ids_are_unique_text_keys() {
    let a = RecordId::generate();
    let b = RecordId::generate();
    assert_ne!(a, b);
    assert_eq!(a.as_int(), None);
    assert_eq!(a.to_string().len(), 36);
}
