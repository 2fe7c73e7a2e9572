//! Fuzz target for skipfile rule compilation and matching.
//!
//! Arbitrary skipfile content must never panic the filter: malformed
//! lines are dropped with a report and matching stays total.

#![no_main]

use libfuzzer_sys::fuzz_target;

use reportdiff_domain::SkipFilter;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    // Skip excessively long inputs to avoid timeouts.
    if content.len() > 4096 {
        return;
    }

    let (filter, report) = SkipFilter::from_content(content);
    assert!(report.loaded <= filter.raw_lines().len());

    // Matching must be total over arbitrary paths.
    let _ = filter.should_skip("/src/a.cpp");
    let _ = filter.should_skip("");
    let _ = filter.should_skip(content);

    // Overwrite must behave like fresh construction.
    let again = filter.overwrite(content);
    assert_eq!(report, again);
});
