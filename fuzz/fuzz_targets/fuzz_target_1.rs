#![no_main]
use libfuzzer_sys::fuzz_target;

use xml_event_codec::events::dispatch_all;
use xml_event_codec::{Compiler, Config, Interpreter, Recorder};

fuzz_target!(|data: &[u8]| {
    // arbitrary bytes must be rejected with an error, never with a panic
    let mut interpreter = Interpreter::with_consumer(Recorder::new());
    let _ = interpreter.deserialize(data);

    // whatever was delivered must survive a second trip
    let events = interpreter.take_consumer().unwrap().into_events();
    let mut compiler = Compiler::new();
    dispatch_all(&events, &mut compiler).unwrap();
    interpreter.set_consumer(Recorder::new());
    interpreter.deserialize(compiler.as_bytes()).unwrap();
    assert_eq!(interpreter.consumer().unwrap().events(), &events[..]);

    let mut checked = Interpreter::with_config(Config::default().with_checks(true));
    checked.set_consumer(Recorder::new());
    let _ = checked.deserialize(data);
});
