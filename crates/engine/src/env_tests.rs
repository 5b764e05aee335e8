// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn escalation_defaults() {
    assert_eq!(cancel_term_delay(), Duration::from_secs(10));
    assert_eq!(cancel_kill_delay(), Duration::from_secs(10));
    assert_eq!(close_grace(), Duration::from_secs(15));
    assert_eq!(spawn_timeout(), Duration::from_secs(30));
}

#[test]
fn outbox_defaults() {
    assert_eq!(outbox_max_retries(), 10);
    assert_eq!(outbox_flush_batch(), 50);
    assert_eq!(history_limit(), 20);
}
