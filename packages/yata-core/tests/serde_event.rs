#![cfg(feature = "serde")]

use yata_core::{Doc, Error, Event, EventKind, Id};

#[test]
fn event_json_uses_string_client_keys() {
    let mut doc = Doc::new(1);
    doc.insert_text(0, "a").unwrap();
    let event = doc.insert_text(1, "b").unwrap();

    let json = event.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["type"], "insert");
    assert_eq!(value["state_vector"]["1"], 1);
    let block = &value["blocks"]["1"][0];
    assert_eq!(block["id"]["client"], 1);
    assert_eq!(block["id"]["clock"], 1);
    assert_eq!(block["content"], "b");
    assert_eq!(block["deleted"], false);
    assert_eq!(block["left_origin"]["clock"], 0);
    assert!(block["right_origin"].is_null());

    assert_eq!(Event::from_json(&json).unwrap(), event);
}

#[test]
fn decodes_hand_written_events() {
    let json = r#"{
        "type": "integrate",
        "state_vector": {},
        "blocks": {
            "2": [
                {"id": {"client": 2, "clock": 0}, "content": "x", "deleted": false,
                 "left_origin": null, "right_origin": null},
                {"id": {"client": 2, "clock": 1}, "content": "y", "deleted": true,
                 "left_origin": {"client": 2, "clock": 0}, "right_origin": null}
            ]
        }
    }"#;
    let event = Event::from_json(json).unwrap();
    assert_eq!(event.kind, EventKind::Integrate);

    let mut doc = Doc::new(1);
    doc.apply(&event).unwrap();
    assert_eq!(doc.content(), "x");
    assert!(doc.lookup(&Id::new(2, 1)).unwrap().deleted);
}

#[test]
fn missing_fields_are_malformed() {
    let missing_type = r#"{"state_vector": {}, "blocks": {}}"#;
    assert!(matches!(
        Event::from_json(missing_type),
        Err(Error::MalformedEvent(_))
    ));

    let missing_id = r#"{"type": "insert", "state_vector": {}, "blocks": {"1": [
        {"content": "a", "left_origin": null, "right_origin": null}
    ]}}"#;
    assert!(matches!(
        Event::from_json(missing_id),
        Err(Error::MalformedEvent(_))
    ));

    assert!(matches!(Event::from_json(""), Err(Error::MalformedEvent(_))));
}

#[test]
fn non_numeric_client_key_is_malformed() {
    let json = r#"{"type": "insert", "state_vector": {"abc": 1}, "blocks": {}}"#;
    assert!(matches!(Event::from_json(json), Err(Error::MalformedEvent(_))));
}

#[test]
fn multi_character_content_is_malformed() {
    let json = r#"{"type": "insert", "state_vector": {}, "blocks": {"2": [
        {"id": {"client": 2, "clock": 0}, "content": "hello", "deleted": false,
         "left_origin": null, "right_origin": null}
    ]}}"#;
    assert!(matches!(Event::from_json(json), Err(Error::MalformedEvent(_))));
}

#[test]
fn misfiled_block_is_malformed_after_decoding() {
    let json = r#"{"type": "insert", "state_vector": {}, "blocks": {"7": [
        {"id": {"client": 1, "clock": 0}, "content": "a", "deleted": false,
         "left_origin": null, "right_origin": null}
    ]}}"#;
    assert!(matches!(Event::from_json(json), Err(Error::MalformedEvent(_))));
}

#[test]
fn malformed_event_leaves_document_untouched() {
    let mut doc = Doc::new(1);
    doc.insert_text(0, "ok").unwrap();
    let before = doc.snapshot();

    let mut event = Doc::new(2).insert_text(0, "z").unwrap();
    event.blocks.get_mut(&2).unwrap()[0].content.clear();

    assert!(matches!(doc.apply(&event), Err(Error::MalformedEvent(_))));
    assert_eq!(doc.snapshot(), before);
    assert_eq!(doc.pending_len(), 0);
}
