// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property-based testing support for [`SemanticVersion`] and [`VersionSet`].
//!
//! Requires the `proptest1` feature, matching the teacher crate's own feature name and pinned
//! `proptest` major version.

use crate::version::{PrereleaseId, SemanticVersion};
use proptest::prelude::*;

impl Arbitrary for SemanticVersion {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (
            0u64..20,
            0u64..20,
            0u64..20,
            prop::collection::vec(prerelease_id_strategy(), 0..3),
        )
            .prop_map(|(major, minor, patch, prerelease)| SemanticVersion {
                major,
                minor,
                patch,
                prerelease,
                build: String::new(),
            })
            .boxed()
    }
}

fn prerelease_id_strategy() -> impl Strategy<Value = PrereleaseId> {
    prop_oneof![
        (0u64..10).prop_map(PrereleaseId::Numeric),
        "[a-z]{1,6}".prop_map(PrereleaseId::AlphaNumeric),
    ]
}
