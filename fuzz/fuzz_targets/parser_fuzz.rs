//! Compiler fuzz target: feed arbitrary text to the definition reader.
//! The reader must not panic; it should return Ok(()) or a CompileError.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let mut registry = configdef::VariableRegistry::new();
    let mut header = configdef::CHeaderConsumer::default();
    let mut ts = configdef::TsProjectConsumer::new();
    let mut state = configdef::ReaderState::new(&mut registry);
    let _ = state.read_definition(s, &mut [&mut header, &mut ts]);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
