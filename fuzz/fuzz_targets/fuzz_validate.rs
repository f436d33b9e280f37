// Fuzz target feeding arbitrary documents through the predicate validator.
#![no_main]

use libfuzzer_sys::fuzz_target;
use predicate_grammar::{validate, Validator};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    for validator in [Validator::default(), Validator::with_max_depth(3)] {
        if let Ok(predicate) = validator.validate(&value) {
            let rebuilt = predicate.to_value();
            assert_eq!(rebuilt, value);
            assert!(predicate.depth() <= validator.options().max_depth);
            assert_eq!(validate(&rebuilt).ok(), Some(predicate));
        }
    }
});
