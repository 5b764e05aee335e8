// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn persona() -> PersonaRef {
    PersonaRef {
        persona_id: "helper".into(),
        persona_version_id: "v2".into(),
    }
}

#[test]
fn load_reads_the_cached_file() {
    let dir = tempdir().unwrap();
    let cache = PersonaCache::new(dir.path().to_path_buf());
    std::fs::write(dir.path().join("helper--v2.md"), "# Helper persona").unwrap();

    assert_eq!(cache.load(&persona()).as_deref(), Some("# Helper persona"));
}

#[test]
fn miss_returns_none() {
    let dir = tempdir().unwrap();
    let cache = PersonaCache::new(dir.path().to_path_buf());
    assert!(cache.load(&persona()).is_none());
}

#[test]
fn path_uses_double_dash_naming() {
    let cache = PersonaCache::new(PathBuf::from("/cache"));
    assert_eq!(
        cache.path_for(&persona()),
        PathBuf::from("/cache/helper--v2.md")
    );
}
