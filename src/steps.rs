//! Ready-made steps bridging filters and writers into a pipeline.

use crate::error::Result;
use crate::event::Event;
use crate::locale::LocaleId;
use crate::traits::{Filter, FilterWriter, PipelineStep};

/// Head-of-pipeline step that opens a [`Filter`] on each incoming
/// `RAW_DOCUMENT` and feeds the filter's event stream into the pipeline one
/// event per pass.
///
/// While the filter has events left the step reports not-done, so the
/// pipeline keeps polling it; every poll emits the next event of the
/// stream.
pub struct FilterStep {
    filter: Box<dyn Filter>,
    generate_skeleton: bool,
    opened: bool,
    done: bool,
}

impl FilterStep {
    pub fn new(filter: Box<dyn Filter>) -> Self {
        FilterStep {
            filter,
            generate_skeleton: true,
            opened: false,
            done: true,
        }
    }

    /// Whether the filter should attach skeleton to its resources. On by
    /// default; turn off when no writer needs to reproduce the document.
    pub fn set_generate_skeleton(&mut self, generate_skeleton: bool) {
        self.generate_skeleton = generate_skeleton;
    }

    fn next_from_filter(&mut self) -> Event {
        let event = self.filter.next_event();
        self.done = !self.filter.has_next();
        event
    }
}

impl PipelineStep for FilterStep {
    fn name(&self) -> &str {
        "raw-document-to-events"
    }

    fn description(&self) -> &str {
        "Opens a filter on each raw document and emits its event stream."
    }

    fn handle_event(&mut self, event: Event) -> Result<Event> {
        match event {
            Event::RawDocument(raw) => {
                self.filter.open(raw, self.generate_skeleton)?;
                self.opened = true;
                if self.filter.has_next() {
                    Ok(self.next_from_filter())
                } else {
                    self.done = true;
                    Ok(Event::NoOp)
                }
            }
            Event::EndBatchItem => {
                if self.opened {
                    self.filter.close();
                    self.opened = false;
                }
                self.done = true;
                Ok(Event::EndBatchItem)
            }
            Event::Canceled => {
                if self.opened {
                    self.filter.cancel();
                    self.done = true;
                }
                Ok(Event::Canceled)
            }
            other => {
                if self.opened && self.filter.has_next() {
                    Ok(self.next_from_filter())
                } else {
                    Ok(other)
                }
            }
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn cancel(&mut self) {
        self.filter.cancel();
    }

    fn destroy(&mut self) {
        if self.opened {
            self.filter.close();
            self.opened = false;
        }
    }
}

/// Tail-of-pipeline step handing every event to a [`FilterWriter`].
///
/// `PIPELINE_PARAMETERS` events reconfigure the writer in-band: output
/// path, encoding and target locale.
pub struct WriterStep {
    writer: Box<dyn FilterWriter>,
    locale: Option<LocaleId>,
    encoding: Option<String>,
}

impl WriterStep {
    pub fn new(writer: Box<dyn FilterWriter>) -> Self {
        WriterStep {
            writer,
            locale: None,
            encoding: None,
        }
    }

    /// Sets the output locale and encoding. `None` keeps the current value.
    pub fn set_options(&mut self, locale: Option<LocaleId>, encoding: Option<&str>) {
        if locale.is_some() {
            self.locale = locale;
        }
        if let Some(encoding) = encoding {
            self.encoding = Some(encoding.to_string());
        }
    }
}

impl PipelineStep for WriterStep {
    fn name(&self) -> &str {
        "events-to-document"
    }

    fn description(&self) -> &str {
        "Writes the event stream back out as a document."
    }

    fn handle_event(&mut self, event: Event) -> Result<Event> {
        match event {
            Event::PipelineParameters(parameters) => {
                if let Some(path) = &parameters.output_path {
                    self.writer.set_output_path(path);
                }
                if parameters.target_locale.is_some() {
                    self.locale = parameters.target_locale.clone();
                }
                if parameters.output_encoding.is_some() {
                    self.encoding = parameters.output_encoding.clone();
                }
                Ok(Event::PipelineParameters(parameters))
            }
            Event::StartDocument(resource) => {
                self.writer
                    .set_options(self.locale.clone(), self.encoding.as_deref());
                self.writer.handle_event(Event::StartDocument(resource))
            }
            other => {
                let out = self.writer.handle_event(other)?;
                if matches!(out, Event::EndDocument(_)) {
                    self.writer.close()?;
                }
                Ok(out)
            }
        }
    }

    fn cancel(&mut self) {
        self.writer.cancel();
    }

    fn destroy(&mut self) {
        if let Err(error) = self.writer.close() {
            log::warn!("writer close failed during destroy: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocaleId;
    use crate::resource::{Ending, RawDocument, StartDocument, TextUnit};

    /// Replays a fixed event list, like a filter parsing a document would.
    struct ScriptedFilter {
        events: Vec<Event>,
        position: usize,
        open_calls: usize,
        closed: bool,
    }

    impl ScriptedFilter {
        fn new(events: Vec<Event>) -> Self {
            ScriptedFilter {
                events,
                position: 0,
                open_calls: 0,
                closed: false,
            }
        }
    }

    impl Filter for ScriptedFilter {
        fn name(&self) -> &str {
            "scripted"
        }

        fn open(&mut self, _input: RawDocument, _generate_skeleton: bool) -> Result<()> {
            self.open_calls += 1;
            self.position = 0;
            Ok(())
        }

        fn has_next(&self) -> bool {
            self.position < self.events.len()
        }

        fn next_event(&mut self) -> Event {
            let event = self.events[self.position].clone();
            self.position += 1;
            event
        }

        fn close(&mut self) {
            self.closed = true;
        }

        fn cancel(&mut self) {
            self.position = self.events.len();
        }
    }

    fn document_events() -> Vec<Event> {
        vec![
            Event::StartDocument(StartDocument::new("d1")),
            Event::TextUnit(TextUnit::with_source("tu1", "hello")),
            Event::EndDocument(Ending::new("d1")),
        ]
    }

    fn raw() -> Event {
        Event::RawDocument(RawDocument::from_text("x", LocaleId::default()))
    }

    #[test]
    fn test_filter_step_emits_stream_one_event_per_pass() {
        let mut step = FilterStep::new(Box::new(ScriptedFilter::new(document_events())));
        assert!(step.is_done());

        let first = step.handle_event(raw()).unwrap();
        assert_eq!(first.kind().name(), "START_DOCUMENT");
        assert!(!step.is_done());

        let second = step.handle_event(Event::NoOp).unwrap();
        assert!(second.is_text_unit());
        assert!(!step.is_done());

        let third = step.handle_event(Event::NoOp).unwrap();
        assert_eq!(third.kind().name(), "END_DOCUMENT");
        assert!(step.is_done());

        // Drained: further events pass through untouched.
        let passed = step.handle_event(Event::NoOp).unwrap();
        assert!(passed.is_no_op());
    }

    #[test]
    fn test_filter_step_closes_filter_on_end_batch_item() {
        let mut step = FilterStep::new(Box::new(ScriptedFilter::new(document_events())));
        step.handle_event(raw()).unwrap();
        while !step.is_done() {
            step.handle_event(Event::NoOp).unwrap();
        }
        let out = step.handle_event(Event::EndBatchItem).unwrap();
        assert_eq!(out.kind().name(), "END_BATCH_ITEM");
    }

    #[test]
    fn test_filter_step_empty_stream() {
        let mut step = FilterStep::new(Box::new(ScriptedFilter::new(Vec::new())));
        let out = step.handle_event(raw()).unwrap();
        assert!(out.is_no_op());
        assert!(step.is_done());
    }

    #[test]
    fn test_writer_step_applies_pipeline_parameters() {
        use crate::event::PipelineParameters;
        use crate::writer::GenericFilterWriter;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut step = WriterStep::new(Box::new(GenericFilterWriter::new()));
        let mut parameters = PipelineParameters::new();
        parameters.output_path = Some(path.clone());
        step.handle_event(Event::PipelineParameters(parameters)).unwrap();

        for event in document_events() {
            step.handle_event(event).unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_writer_step_writes_to_stream() {
        use crate::writer::GenericFilterWriter;
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone)]
        struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

        impl Write for SharedBuffer {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().write(buf)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = SharedBuffer(Arc::new(Mutex::new(Vec::new())));
        let mut writer = GenericFilterWriter::new();
        writer.set_output_stream(Box::new(buffer.clone()));

        let mut step = WriterStep::new(Box::new(writer));
        for event in document_events() {
            step.handle_event(event).unwrap();
        }
        assert_eq!(buffer.0.lock().unwrap().as_slice(), b"hello");
    }
}
