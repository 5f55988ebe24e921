#![no_main]

use libfuzzer_sys::fuzz_target;
use std::hint::black_box;
use xml_event_codec::events::{dispatch_all, Event};
use xml_event_codec::{Compiler, Config, Interpreter, Recorder};

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    config: Config,
    /// Events of several documents compiled by the same recycled compiler
    documents: Vec<Vec<Event>>,
}

fuzz_target!(|input: Input| {
    let mut compiler = Compiler::with_config(input.config.clone());
    let mut interpreter = Interpreter::with_config(input.config);
    interpreter.set_consumer(Recorder::new());

    for events in &input.documents {
        compiler.recycle();
        interpreter.recycle();
        interpreter.consumer_mut().unwrap().recycle();

        if dispatch_all(events, &mut compiler).is_err() {
            // rejected by checks: the accepted prefix must still replay
            let _ = black_box(interpreter.deserialize(compiler.as_bytes()));
            continue;
        }
        match interpreter.deserialize(compiler.as_bytes()) {
            Ok(()) => assert_eq!(interpreter.consumer().unwrap().events(), &events[..]),
            // an accepted but unfinished stream is only reported at its end
            Err(_) => assert!(compiler.config().check_well_formed),
        }
    }
});
