#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let opts = nbfs::CodecOptions::default();
    if let Ok(nodes) = nbfs::decode_with_options(data, &opts) {
        let _ = nbfs::nodes_to_xml(&nodes, nbfs::XmlStyle::Exploded);
        let _ = nbfs::encode(&nodes);
    }
    let _ = nbfs::decode_session_message(data, &opts);
});
