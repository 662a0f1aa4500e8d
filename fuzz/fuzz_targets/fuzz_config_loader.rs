#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = toml::from_str::<servo_config::Config>(data) {
        if cfg.validate().is_ok() {
            // A valid record must survive a save/load cycle unchanged.
            if let Ok(text) = cfg.to_toml_string() {
                let again = servo_config::load_toml(&text).ok();
                assert_eq!(again.as_ref(), Some(&cfg));
            }
        }
    }
});
