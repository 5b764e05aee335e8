// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_catalog_has_one_default_model() {
    let catalog = ModelCatalog::default();
    assert_eq!(catalog.models().iter().filter(|m| m.default).count(), 1);
    assert!(catalog.contains("balanced"));
    assert!(!catalog.contains("imaginary"));
}

#[test]
fn text_rendering_lists_every_model() {
    let catalog = ModelCatalog::new(vec![
        ModelInfo {
            id: "a".into(),
            label: "Alpha".into(),
            default: true,
        },
        ModelInfo {
            id: "b".into(),
            label: "Beta".into(),
            default: false,
        },
    ]);
    let text = catalog.as_text();
    assert!(text.contains("- a (Alpha, default)"));
    assert!(text.contains("- b (Beta)"));
}
