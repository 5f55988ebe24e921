use pretty_assertions::assert_eq;
use tokio::io::AsyncReadExt;
use xml_event_codec::errors::{DecodeError, MisuseError};
use xml_event_codec::events::dispatch_all;
use xml_event_codec::{Compiler, Error, Interpreter, Recorder};

mod helpers;
use helpers::sample_document;

#[tokio::test]
async fn roundtrip() {
    let events = sample_document();
    let mut compiler = Compiler::new();
    dispatch_all(&events, &mut compiler).unwrap();

    let mut stored = Vec::new();
    compiler.write_to_async(&mut stored).await.unwrap();
    assert_eq!(stored, compiler.as_bytes());

    let mut interpreter = Interpreter::with_consumer(Recorder::new());
    interpreter
        .deserialize_from_async(stored.as_slice())
        .await
        .unwrap();
    assert_eq!(interpreter.into_consumer().unwrap().into_events(), events);
}

/// Records split between reads are joined before replay
#[tokio::test]
async fn chunked_reader() {
    let events = sample_document();
    let mut compiler = Compiler::new();
    dispatch_all(&events, &mut compiler).unwrap();
    let blob = compiler.as_bytes();

    let mut interpreter = Interpreter::with_consumer(Recorder::new());
    for split in [1, 7, blob.len() / 2] {
        let reader = (&blob[..split]).chain(&blob[split..]);
        interpreter.deserialize_from_async(reader).await.unwrap();
        assert_eq!(interpreter.consumer().unwrap().events(), &events[..]);

        interpreter.recycle();
        interpreter.consumer_mut().unwrap().recycle();
    }
}

#[tokio::test]
async fn truncated() {
    let mut interpreter = Interpreter::with_consumer(Recorder::new());
    match interpreter.deserialize_from_async(&[7u8, 3, b'a'][..]).await {
        Err(Error::Decode(DecodeError::Truncated { offset: 1, .. })) => {}
        x => panic!("Expected `Err(Decode(Truncated))`, but got `{:?}`", x),
    }
}

#[tokio::test]
async fn no_consumer() {
    let mut interpreter = Interpreter::<Recorder>::new();
    match interpreter.deserialize_from_async(&[1u8][..]).await {
        Err(Error::Misuse(MisuseError::NoConsumer)) => {}
        x => panic!("Expected `Err(Misuse(NoConsumer))`, but got `{:?}`", x),
    }
}
