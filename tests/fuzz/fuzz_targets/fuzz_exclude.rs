#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Pattern compilation and matching must not panic on any input.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some((patterns, path)) = s.split_once('\n') {
            if let Ok(set) = covgate::exclude::ExclusionSet::parse(patterns) {
                let _ = set.matches(path);
            }
        }
    }
});
