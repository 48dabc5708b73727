// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn set_env_round_trips_through_json() {
    let req = Request::SetEnv { entry: "FOO=bar".into() };
    let json = serde_json::to_string(&req).unwrap();
    let back: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(req, back);
}

#[test]
fn unrecognized_type_decodes_as_unknown() {
    let json = r#"{"type":"FROM_THE_FUTURE"}"#;
    let req: Request = serde_json::from_str(json).unwrap();
    assert_eq!(req, Request::Unknown);
}

#[test]
fn ping_has_no_payload() {
    let json = serde_json::to_string(&Request::Ping).unwrap();
    assert_eq!(json, r#"{"type":"Ping"}"#);
}
