//! Fuzz target: `console::parse`
//!
//! Drives arbitrary text into the console line parser and asserts that it
//! never panics and that every accepted command renders a JSON reply line.
//!
//! cargo fuzz run fuzz_console_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use phprobe::app::commands::CommandReply;
use phprobe::app::console::{self, ConsoleLine};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    for line in text.lines() {
        match console::parse(line) {
            Ok(ConsoleLine::Command(cmd)) => {
                // Table commands must map back to the word that produced them.
                if let Some(name) = cmd.name() {
                    assert_eq!(line.trim(), name);
                }
                let json = console::render_reply(&CommandReply::Done { persisted: true });
                assert!(json.starts_with('{') && json.ends_with('}'));
            }
            Ok(_) => {}
            Err(e) => {
                let json = console::render_error(&e.to_string());
                assert!(json.starts_with(r#"{"reply":"error""#));
            }
        }
    }
});
