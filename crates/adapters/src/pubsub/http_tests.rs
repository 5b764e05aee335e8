// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    long_lived = { 900, 720 },
    one_hour = { 3600, 2880 },
)]
fn refresh_at_eighty_percent(expires_in: u64, expected: u64) {
    assert_eq!(
        refresh_delay(Duration::from_secs(expires_in)),
        Duration::from_secs(expected)
    );
}

#[parameterized(
    very_short = { 10 },
    sub_minute = { 60 },
    just_over = { 74 },
)]
fn refresh_never_sooner_than_one_minute(expires_in: u64) {
    assert_eq!(
        refresh_delay(Duration::from_secs(expires_in)),
        Duration::from_secs(60)
    );
}

#[tokio::test]
async fn starts_disconnected() {
    let remote = crate::remote::FakeRemote::new();
    let pubsub = HttpPubSub::new("http://localhost:0", remote).unwrap();
    assert!(!pubsub.connected());
}
