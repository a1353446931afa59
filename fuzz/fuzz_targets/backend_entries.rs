#![no_main]

use libfuzzer_sys::fuzz_target;
use logtriage_correlator::StaticBackendSource;
use logtriage_correlator::context::is_valid_request_id;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(source) = StaticBackendSource::from_json_str("fuzz", input) {
            // 채워진 요청 ID는 모두 유효성 검사를 통과해야 함
            for entry in source.entries() {
                if let Some(id) = &entry.request_id {
                    assert!(is_valid_request_id(id));
                }
            }
        }
    }
});
