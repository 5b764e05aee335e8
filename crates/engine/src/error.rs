// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime error type

use thiserror::Error;

/// Errors surfaced by runtime event handling.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("store error: {0}")]
    Store(#[from] milo_storage::StoreError),

    #[error("worker error: {0}")]
    Worker(#[from] milo_adapters::WorkerAdapterError),

    #[error("remote error: {0}")]
    Remote(#[from] milo_adapters::RemoteError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("skill store error: {0}")]
    Skills(#[from] milo_adapters::SkillStoreError),
}
