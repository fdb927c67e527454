// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn priority_sorts_lower_first_missing_last() {
    let mut worlds = vec![
        ("Zeta", None),
        ("Moon", Some(2u32)),
        ("Mars", Some(1)),
        ("Alpha", None),
    ];
    worlds.sort_by_key(|(name, prio)| priority_key(*prio, name));
    let names: Vec<_> = worlds.iter().map(|(n, _)| *n).collect();
    assert_eq!(names, vec!["Mars", "Moon", "Alpha", "Zeta"]);
}
