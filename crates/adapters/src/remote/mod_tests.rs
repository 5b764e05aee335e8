// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    unauthorized = { 401 },
    forbidden = { 403 },
    not_found = { 404 },
)]
fn doomed_statuses_are_permanent(status: u16) {
    let err = RemoteError::Status {
        status,
        body: String::new(),
    };
    assert!(err.is_permanent());
}

#[parameterized(
    server_error = { 500 },
    unavailable = { 503 },
    rate_limited = { 429 },
    conflict = { 409 },
)]
fn transient_statuses_keep_retrying(status: u16) {
    let err = RemoteError::Status {
        status,
        body: String::new(),
    };
    assert!(!err.is_permanent());
}

#[test]
fn transport_errors_are_never_permanent() {
    let err = RemoteError::Transport("connection refused".into());
    assert!(!err.is_permanent());
    assert_eq!(err.status(), None);
}

#[test]
fn grant_parses_from_camel_case() {
    let raw = r#"{
        "token": "tok-1",
        "cmdChannel": "agent.cmd",
        "evtChannel": "agent.evt",
        "subscribeKey": "sub-k",
        "publishKey": "pub-k",
        "expiresIn": 900
    }"#;
    let grant: PubSubGrant = serde_json::from_str(raw).unwrap();
    assert_eq!(grant.cmd_channel, "agent.cmd");
    assert_eq!(grant.expires_in, 900);
}
