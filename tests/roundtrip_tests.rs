//! Extract-and-merge round trips through the kv filter and the generic
//! writer.

mod common;

use common::{KvFilter, locale, parse_kv};
use indoc::indoc;
use locflow::event::{Event, MultiEvent, PipelineParameters};
use locflow::fragment::TextFragment;
use locflow::pipeline::{Pipeline, PipelineState};
use locflow::registry::FilterRegistry;
use locflow::resource::{DocumentPart, Ending, RawDocument, StartDocument, TextUnit};
use locflow::skeleton::GenericSkeleton;
use locflow::steps::{FilterStep, WriterStep};
use locflow::traits::{Filter, FilterWriter};
use locflow::writer::{GenericFilterWriter, LineBreak};

const SAMPLE: &str = indoc! {"
    # colors
    red=Rouge

    green=Vert
    blue=Bleu
"};

fn write_all(events: Vec<Event>, configure: impl FnOnce(&mut GenericFilterWriter)) -> Vec<u8> {
    let mut writer = GenericFilterWriter::new();
    configure(&mut writer);
    for event in events {
        writer.handle_event(event).unwrap();
    }
    writer.take_buffer().unwrap_or_default()
}

fn drain(filter: &mut KvFilter) -> Vec<Event> {
    let mut events = Vec::new();
    while filter.has_next() {
        events.push(filter.next_event());
    }
    events
}

#[test]
fn test_unmodified_stream_reproduces_document() {
    let events = parse_kv(SAMPLE, true);
    let bytes = write_all(events, |_| {});
    assert_eq!(bytes, SAMPLE.as_bytes());
}

#[test]
fn test_round_trip_without_trailing_line_break() {
    let text = "a=1\nb=2";
    let bytes = write_all(parse_kv(text, true), |_| {});
    assert_eq!(bytes, text.as_bytes());
}

#[test]
fn test_crlf_round_trip() {
    let text = "# c\r\nk=v\r\n";
    let bytes = write_all(parse_kv(text, true), |_| {});
    assert_eq!(bytes, text.as_bytes());
}

#[test]
fn test_utf8_bom_round_trip() {
    let mut original = vec![0xEF, 0xBB, 0xBF];
    original.extend_from_slice(b"a=1\n");

    let mut filter = KvFilter::new();
    filter
        .open(
            RawDocument::from_bytes(original.clone(), "UTF-8", locale("en")),
            true,
        )
        .unwrap();
    let bytes = write_all(drain(&mut filter), |_| {});
    assert_eq!(bytes, original);
}

#[test]
fn test_windows1252_round_trip() {
    let original = b"caf\xE9=caf\xE9\n".to_vec();

    let mut filter = KvFilter::new();
    filter
        .open(
            RawDocument::from_bytes(original.clone(), "windows-1252", locale("fr")),
            true,
        )
        .unwrap();
    let events = drain(&mut filter);

    // Decoded to Unicode in the stream.
    let unit = events
        .iter()
        .find_map(Event::as_text_unit)
        .expect("one text unit");
    assert_eq!(unit.source.plain_text(), "caf\u{e9}");

    // Re-encoded on the way out.
    let bytes = write_all(events, |_| {});
    assert_eq!(bytes, original);
}

#[test]
fn test_utf16le_round_trip() {
    let text = "a=1\n";
    let mut original = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        original.extend_from_slice(&unit.to_le_bytes());
    }

    let mut filter = KvFilter::new();
    filter
        .open(
            RawDocument::from_bytes(original.clone(), "UTF-16LE", locale("en")),
            true,
        )
        .unwrap();
    let bytes = write_all(drain(&mut filter), |_| {});
    assert_eq!(bytes, original);
}

#[test]
fn test_translated_output_for_target_locale() {
    let mut events = parse_kv("red=Red\nblue=Blue\n", true);
    for event in &mut events {
        if let Event::TextUnit(unit) = event {
            if unit.name.as_deref() == Some("red") {
                unit.set_target(locale("fr"), TextFragment::from("Rouge"));
            }
        }
    }

    let bytes = write_all(events, |writer| {
        writer.set_options(Some(locale("fr")), None);
    });
    // The unit without a French target falls back to its source.
    assert_eq!(bytes, b"red=Rouge\nblue=Blue\n");
}

#[test]
fn test_line_break_override() {
    let bytes = write_all(parse_kv("a=1\nb=2\n", true), |writer| {
        writer.set_line_break(LineBreak::CrLf);
    });
    assert_eq!(bytes, b"a=1\r\nb=2\r\n");
}

#[test]
fn test_without_skeleton_only_content_remains() {
    let bytes = write_all(parse_kv("# note\na=1\n", false), |_| {});
    assert_eq!(bytes, b"1");
}

#[test]
fn test_referent_written_at_reference_position() {
    let mut title = TextUnit::with_source("tu1", "TITLE");
    title.referent = true;

    let mut heading = DocumentPart::new("dp1");
    let mut skeleton = GenericSkeleton::new();
    skeleton.add("<h1>");
    skeleton.add_reference("tu1");
    skeleton.append("</h1>\n");
    heading.skeleton = Some(skeleton);

    let events = vec![
        Event::StartDocument(StartDocument::new("d1")),
        Event::TextUnit(title),
        Event::DocumentPart(heading),
        Event::EndDocument(Ending::new("d1")),
    ];
    let bytes = write_all(events, |_| {});
    assert_eq!(bytes, b"<h1>TITLE</h1>\n");
}

#[test]
fn test_single_propagation_group_is_written_out() {
    let mut group = MultiEvent::new();
    group.propagate_as_single = true;
    group.push(Event::TextUnit(TextUnit::with_source("tu1", "TITLE")));

    let events = vec![
        Event::StartDocument(StartDocument::new("d1")),
        Event::Multi(group),
        Event::EndDocument(Ending::new("d1")),
    ];
    let bytes = write_all(events, |_| {});
    assert_eq!(bytes, b"TITLE");
}

#[test]
fn test_path_output_and_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.txt");

    let mut writer = GenericFilterWriter::new();
    writer.set_output_path(&path);
    for event in parse_kv("a=1\n", true) {
        writer.handle_event(event).unwrap();
    }
    assert_eq!(std::fs::read(&path).unwrap(), b"a=1\n");

    // A second document through the same writer replaces the file.
    for event in parse_kv("b=2\n", true) {
        writer.handle_event(event).unwrap();
    }
    assert_eq!(std::fs::read(&path).unwrap(), b"b=2\n");
}

#[test]
fn test_filter_separator_parameter() {
    let mut parameters = locflow::Parameters::new();
    parameters.set_string("sep", ":");

    let mut filter = KvFilter::new();
    filter.set_parameters(parameters);
    filter
        .open(RawDocument::from_text("name:Val\n", locale("en")), true)
        .unwrap();
    let events = drain(&mut filter);

    let unit = events
        .iter()
        .find_map(Event::as_text_unit)
        .expect("one text unit");
    assert_eq!(unit.name.as_deref(), Some("name"));
    assert_eq!(unit.source.plain_text(), "Val");

    assert_eq!(write_all(events, |_| {}), b"name:Val\n");
}

#[test]
fn test_registry_pipeline_end_to_end() {
    let mut registry = FilterRegistry::new();
    registry.register_filter("kv", || Box::new(KvFilter::new()));
    registry.register_writer("generic", || Box::new(GenericFilterWriter::new()));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let mut pipeline = Pipeline::new();
    pipeline.set_id("extract-merge");
    pipeline.add_step(FilterStep::new(registry.create_filter("kv").unwrap()));
    pipeline.add_step(WriterStep::new(registry.create_writer("generic").unwrap()));

    pipeline.start_batch().unwrap();

    // Configure the writer in-band, then run the document.
    let mut parameters = PipelineParameters::new();
    parameters.output_path = Some(path.clone());
    pipeline
        .process(Event::PipelineParameters(parameters))
        .unwrap();

    let input = RawDocument::from_text("# hi\nname=Val\n", locale("en"));
    pipeline.process_raw_document(input).unwrap();
    pipeline.end_batch().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Succeeded);

    pipeline.destroy();
    assert_eq!(pipeline.state(), PipelineState::Destroyed);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\nname=Val\n");
}
