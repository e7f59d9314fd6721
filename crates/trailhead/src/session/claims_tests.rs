// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn forge(payload: &serde_json::Value) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("eyJhbGciOiJSUzI1NiJ9.{encoded}.c2lnbmF0dXJl")
}

#[test]
fn decodes_standard_claims() {
    let claims = Claims::decode(&forge(&serde_json::json!({
        "sub": "u-1042",
        "name": "Amira Rossi",
        "email": "amira@example.com",
        "exp": 1_790_000_000u64,
        "iat": 1_789_996_400u64,
    })));
    assert_eq!(claims.subject(), Some("u-1042"));
    assert_eq!(claims.name(), Some("Amira Rossi"));
    assert_eq!(claims.email(), Some("amira@example.com"));
    assert_eq!(claims.expires_at(), Some(1_790_000_000));
    assert_eq!(claims.issued_at(), Some(1_789_996_400));
}

#[test]
fn wrong_segment_count_yields_empty() {
    let payload = URL_SAFE_NO_PAD.encode(r#"{"name":"A"}"#);
    assert!(Claims::decode(&payload).is_empty());
    assert!(Claims::decode(&format!("a.{payload}")).is_empty());
    assert!(Claims::decode(&format!("a.{payload}.c.d")).is_empty());
    assert!(Claims::decode("").is_empty());
}

#[test]
fn invalid_base64_yields_empty() {
    assert!(Claims::decode("a.!!not-base64!!.c").is_empty());
}

#[test]
fn padded_base64_yields_empty() {
    // The payload segment is unpadded base64url by contract.
    let padded = base64::engine::general_purpose::URL_SAFE.encode(r#"{"name":"A"}"#);
    assert!(padded.ends_with('='));
    assert!(Claims::decode(&format!("a.{padded}.c")).is_empty());
}

#[test]
fn invalid_json_yields_empty() {
    let encoded = URL_SAFE_NO_PAD.encode("{not json");
    assert!(Claims::decode(&format!("a.{encoded}.c")).is_empty());
}

#[test]
fn non_object_payload_yields_empty() {
    let encoded = URL_SAFE_NO_PAD.encode("[1,2,3]");
    assert!(Claims::decode(&format!("a.{encoded}.c")).is_empty());
}

#[test]
fn empty_string_claims_are_unknown() {
    let claims = Claims::decode(&forge(&serde_json::json!({ "name": "", "email": "" })));
    assert_eq!(claims.name(), None);
    assert_eq!(claims.email(), None);
    assert!(!claims.is_empty());
}

#[test]
fn non_numeric_expiry_is_unknown() {
    let claims = Claims::decode(&forge(&serde_json::json!({ "exp": "soon" })));
    assert_eq!(claims.expires_at(), None);
    let claims = Claims::decode(&forge(&serde_json::json!({ "exp": -5 })));
    assert_eq!(claims.expires_at(), None);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Decoding is total: no input may fail the calling operation.
        #[test]
        fn decode_never_fails(credential in ".{0,256}") {
            let _ = Claims::decode(&credential);
        }

        #[test]
        fn decode_tokenish_never_fails(credential in "[A-Za-z0-9_.=-]{0,128}") {
            let _ = Claims::decode(&credential);
        }
    }
}
