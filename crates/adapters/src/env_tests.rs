// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_apply_without_env() {
    // Not set in the test environment
    assert_eq!(http_timeout(), Duration::from_secs(30));
    assert_eq!(pubsub_poll_window(), Duration::from_secs(25));
    assert_eq!(pubsub_backoff(), Duration::from_secs(5));
}
