// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for CanonicalPath parsing and views

#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_core::CanonicalPath;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for allow_climb in [false, true] {
        let path = CanonicalPath::new(input, allow_climb);

        // Canonical form parses back to itself
        let again = CanonicalPath::new(path.as_str(), allow_climb);
        assert_eq!(again, path);

        for component in path.components() {
            assert!(!component.is_empty() && component != "." && component != "..");
        }
        if !allow_climb || path.is_absolute() {
            assert_eq!(path.climb_count(), 0);
        }

        // Every proper suffix view is its components joined by '/'
        for offset in 1..=path.len() {
            let view = path.view_from(offset);
            assert_eq!(view.as_str(), path.components()[offset..].join("/"));
            assert_eq!(view.len(), path.len() - offset);
        }

        let _ = path.join(path.view());
        let _ = path.name();
    }
});
