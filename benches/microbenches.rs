use criterion::{self, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pretty_assertions::assert_eq;
use xml_event_codec::codec::{write_varint, Cursor};
use xml_event_codec::events::{dispatch_all, Event, OwnedAttribute};
use xml_event_codec::{Attributes, Compiler, ContentHandler, Error, Interpreter};

static LOREM_IPSUM_TEXT: &str =
"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt
ut labore et dolore magna aliqua. Hac habitasse platea dictumst vestibulum rhoncus est pellentesque.
Risus ultricies tristique nulla aliquet enim tortor at. Fermentum odio eu feugiat pretium nibh ipsum.
Volutpat sed cras ornare arcu dui. Scelerisque fermentum dui faucibus in ornare quam. Arcu cursus
euismod quis viverra nibh cras pulvinar mattis. Sed viverra tellus in hac habitasse platea. Quis
commodo odio aenean sed. Cursus in hac habitasse platea dictumst quisque sagittis purus.";

/// A feed of `items` entries, each with attributes and some text
fn feed(items: usize) -> Vec<Event> {
    let mut events = vec![Event::StartDocument, Event::start("feed")];
    for i in 0..items {
        events.push(Event::StartElement {
            uri: String::new(),
            local_name: "entry".to_owned(),
            qname: "entry".to_owned(),
            attributes: vec![
                OwnedAttribute {
                    uri: String::new(),
                    local_name: "id".to_owned(),
                    qname: "id".to_owned(),
                    ty: "ID".to_owned(),
                    value: i.to_string(),
                },
                OwnedAttribute {
                    uri: String::new(),
                    local_name: "lang".to_owned(),
                    qname: "lang".to_owned(),
                    ty: "CDATA".to_owned(),
                    value: "en".to_owned(),
                },
            ],
        });
        events.push(Event::text(&LOREM_IPSUM_TEXT[..(i * 37) % LOREM_IPSUM_TEXT.len()]));
        events.push(Event::end("entry"));
    }
    events.push(Event::end("feed"));
    events.push(Event::EndDocument);
    events
}

/// Counts elements, ignoring everything else
#[derive(Default)]
struct Counter(usize);

impl ContentHandler for Counter {
    type Error = Error;

    fn start_element(&mut self, _: &str, _: &str, _: &str, _: Attributes) -> Result<(), Error> {
        self.0 += 1;
        Ok(())
    }
}

/// Benchmarks compiling documents of different sizes with a recycled compiler
fn compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for items in [1, 100, 10_000] {
        let events = feed(items);
        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &events, |b, events| {
            let mut compiler = Compiler::new();
            b.iter(|| {
                compiler.recycle();
                dispatch_all(criterion::black_box(events), &mut compiler).unwrap();
            })
        });
    }
    group.finish();
}

/// Benchmarks replaying documents of different sizes into a handler that
/// looks only at elements
fn replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    for items in [1, 100, 10_000] {
        let mut compiler = Compiler::new();
        dispatch_all(&feed(items), &mut compiler).unwrap();
        let blob = compiler.into_blob();

        group.throughput(Throughput::Bytes(blob.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &blob, |b, blob| {
            let mut interpreter = Interpreter::with_consumer(Counter::default());
            b.iter(|| {
                interpreter.consumer_mut().unwrap().0 = 0;
                interpreter.deserialize(criterion::black_box(blob)).unwrap();
                assert_eq!(interpreter.consumer().unwrap().0, items + 1);
            })
        });
    }
    group.finish();
}

/// Benchmarks the varint codec on values of different widths
fn varint(c: &mut Criterion) {
    let values: Vec<u64> = (0..64).map(|shift| (1u64 << shift) - 1).collect();
    let mut encoded = Vec::new();
    for v in &values {
        write_varint(&mut encoded, *v).unwrap();
    }

    let mut group = c.benchmark_group("varint");
    group.bench_function("write", |b| {
        let mut buf = Vec::with_capacity(encoded.len());
        b.iter(|| {
            buf.clear();
            for v in criterion::black_box(&values) {
                write_varint(&mut buf, *v).unwrap();
            }
        })
    });
    group.bench_function("read", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(criterion::black_box(&encoded));
            let mut sum = 0u64;
            while !cursor.is_empty() {
                sum = sum.wrapping_add(cursor.read_varint().unwrap());
            }
            sum
        })
    });
    group.finish();
}

criterion_group!(benches, compile, replay, varint);
criterion_main!(benches);
