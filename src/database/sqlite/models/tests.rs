use super::*;

#[test]
fn sender_display_matches_stored_text() {
    assert_eq!(Sender::User.to_string(), "user");
    assert_eq!(Sender::Assistant.to_string(), "assistant");
}

#[test]
fn sender_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&Sender::Assistant).expect("serialize"),
        "\"assistant\""
    );
    let parsed: Sender = serde_json::from_str("\"user\"").expect("deserialize");
    assert_eq!(parsed, Sender::User);
}
