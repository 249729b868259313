#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };

    let settings = graft::Settings::new().with_max_depth(64);
    let deserializer = graft::JsonDeserializer::new().with_settings(settings);
    let _ = deserializer.value_from_str(text, None);
    let _ = deserializer.value_from_str(text, Some(&graft::TypeRef::Raw));

    if let Ok(tape) = graft::JsonTape::from_str(text) {
        let mut out = String::new();
        let mut writer = graft::TokenWriter::new(&mut out);
        for token in tape.tokens() {
            writer.write_token(token);
        }

        let _ = graft::JsonTape::from_str(&out);
    }
});
