#![no_main]

use libfuzzer_sys::fuzz_target;
use logtriage_correlator::{PatternClassifier, RuleLoader};

fuzz_target!(|data: &[u8]| {
    // YAML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(file) = RuleLoader::parse_yaml(yaml_str, "fuzz-input.yml") {
            // 검증을 통과한 파일은 분류기에 항상 추가 가능해야 함
            let mut classifier = PatternClassifier::new();
            assert!(classifier.extend(&file).is_ok());
        }
    }
});
