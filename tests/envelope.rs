// tests/envelope.rs

use zpsexec::envelope::{ContinuationEnvelope, ResultEnvelope};
use zpsexec::reaction::Reaction;
use zpsexec_test_utils::builders::{ScriptBuilder, error_reaction};

#[test]
fn continuation_envelope_carries_the_script() {
    let script = ScriptBuilder::new()
        .generate("python")
        .execute_class("python", "Render")
        .build();

    let envelope = ContinuationEnvelope::from_script("script.json.2", &script).unwrap();
    assert_eq!(envelope.name, "script.json.2");
    assert_eq!(envelope.into_script().unwrap(), script);
}

#[test]
fn result_envelope_carries_the_reaction() {
    let reaction = error_reaction("ValueError", "bad frame range");
    let envelope = ResultEnvelope::from_reaction(&reaction).unwrap();

    let json: serde_json::Value = serde_json::from_slice(&envelope.payload).unwrap();
    assert_eq!(json["error"]["className"], "ValueError");

    assert_eq!(envelope.into_reaction().unwrap(), reaction);
}

#[test]
fn garbage_payload_is_rejected() {
    let envelope = ResultEnvelope {
        payload: b"not json".to_vec(),
    };
    assert!(envelope.into_reaction().is_err());
}

#[test]
fn spawn_failure_survives_the_trip() {
    let reaction = Reaction::spawn_failure("runner missing");
    let back = ResultEnvelope::from_reaction(&reaction)
        .unwrap()
        .into_reaction()
        .unwrap();
    let err = back.as_error().unwrap();
    assert_eq!(err.class_name, "SpawnError");
    assert_eq!(err.phase, "launch");
}
