#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        if let Ok(nodes) = nbfs::parse_xml_nodes(xml) {
            if let Ok(bytes) = nbfs::encode(&nodes) {
                let decoded = nbfs::decode(&bytes).expect("encoded nodes must decode");
                assert_eq!(decoded, nodes);
            }
        }
    }
});
