//! Fuzz target: `SettingsEngine::poll`
//!
//! Drives arbitrary byte sequences into the settings protocol engine, split
//! at a fuzzer-chosen point to exercise resumption across polls.  Asserts
//! that it never panics and that the in-memory settings always match the
//! store.
//!
//! cargo fuzz run fuzz_settings_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermolight::app::ports::ByteSource;
use thermolight::serial::SettingsEngine;
use thermolight::settings::{DeviceSettings, MemoryStore};

struct Bytes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl ByteSource for Bytes<'_> {
    fn available(&mut self) -> usize {
        self.data.len() - self.pos
    }

    fn peek(&mut self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn read(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&cut, rest)) = data.split_first() else {
        return;
    };
    let (a, b) = rest.split_at(usize::from(cut).min(rest.len()));

    let mut engine = SettingsEngine::default();
    let mut settings = DeviceSettings::default();
    let mut store = MemoryStore::from_image(settings.to_image());

    for chunk in [a, b] {
        engine.poll(&mut Bytes { data: chunk, pos: 0 }, &mut settings, &mut store);
        assert_eq!(settings, DeviceSettings::load(&store), "settings drifted from store");
    }

    // A lone terminator must always return the parser to idle.
    engine.poll(&mut Bytes { data: b";", pos: 0 }, &mut settings, &mut store);
    assert!(engine.is_idle());
});
