#![allow(dead_code)]

//! A small line-based `key=value` filter used by the integration tests.

use std::collections::VecDeque;

use locflow::error::Result;
use locflow::event::Event;
use locflow::locale::LocaleId;
use locflow::parameters::Parameters;
use locflow::resource::{
    DocumentPart, Ending, RawDocument, StartDocument, TextUnit, detect_line_break,
};
use locflow::skeleton::GenericSkeleton;
use locflow::traits::Filter;

/// Parses documents of `key=value` lines. Lines starting with `#` and blank
/// lines are kept as document parts; everything else becomes a text unit
/// whose skeleton reproduces the `key=` prefix and the line break.
///
/// The separator can be overridden with the `sep` parameter.
pub struct KvFilter {
    events: VecDeque<Event>,
    parameters: Parameters,
}

impl KvFilter {
    pub fn new() -> Self {
        KvFilter {
            events: VecDeque::new(),
            parameters: Parameters::new(),
        }
    }

    fn separator(&self) -> String {
        self.parameters.get_string("sep").unwrap_or("=").to_string()
    }
}

impl Filter for KvFilter {
    fn name(&self) -> &str {
        "kv"
    }

    fn open(&mut self, input: RawDocument, generate_skeleton: bool) -> Result<()> {
        let separator = self.separator();
        let has_utf8_bom = input.has_utf8_bom()?;
        let text = input.read_to_string()?;
        let line_break = detect_line_break(&text);

        self.events.clear();

        let mut document = StartDocument::new("d1");
        document.locale = input.source_locale.clone();
        document.encoding = input.encoding.clone();
        document.has_utf8_bom = has_utf8_bom;
        document.line_break = line_break.to_string();
        self.events.push_back(Event::StartDocument(document));

        let lines: Vec<&str> = text.split(line_break).collect();
        let mut unit_count = 0;
        let mut part_count = 0;
        for (index, line) in lines.iter().enumerate() {
            let is_last = index == lines.len() - 1;
            if is_last && line.is_empty() {
                // The document ended with a line break already accounted for.
                break;
            }
            let suffix = if is_last { "" } else { line_break };

            let parsed = if line.starts_with('#') || line.trim().is_empty() {
                None
            } else {
                line.split_once(&separator)
            };
            match parsed {
                Some((key, value)) => {
                    unit_count += 1;
                    let mut unit = TextUnit::with_source(format!("tu{unit_count}"), value);
                    unit.name = Some(key.to_string());
                    if generate_skeleton {
                        let mut skeleton = GenericSkeleton::new();
                        skeleton.add(format!("{key}{separator}"));
                        skeleton.add_content_placeholder(None);
                        skeleton.append(suffix);
                        unit.skeleton = Some(skeleton);
                    }
                    self.events.push_back(Event::TextUnit(unit));
                }
                None => {
                    part_count += 1;
                    let mut part = DocumentPart::new(format!("dp{part_count}"));
                    if generate_skeleton {
                        part.skeleton = Some(GenericSkeleton::from(format!("{line}{suffix}").as_str()));
                    }
                    self.events.push_back(Event::DocumentPart(part));
                }
            }
        }

        self.events.push_back(Event::EndDocument(Ending::new("d1")));
        Ok(())
    }

    fn has_next(&self) -> bool {
        !self.events.is_empty()
    }

    fn next_event(&mut self) -> Event {
        match self.events.pop_front() {
            Some(event) => event,
            None => panic!("next_event called on a drained filter"),
        }
    }

    fn close(&mut self) {
        self.events.clear();
    }

    fn cancel(&mut self) {
        self.events.clear();
        self.events.push_back(Event::Canceled);
    }

    fn parameters(&self) -> Option<&Parameters> {
        Some(&self.parameters)
    }

    fn set_parameters(&mut self, parameters: Parameters) {
        self.parameters = parameters;
    }
}

pub fn locale(tag: &str) -> LocaleId {
    LocaleId::new(tag).unwrap()
}

/// Drains a filter opened on `text` into a vector of events.
pub fn parse_kv(text: &str, generate_skeleton: bool) -> Vec<Event> {
    let mut filter = KvFilter::new();
    filter
        .open(RawDocument::from_text(text, locale("en")), generate_skeleton)
        .unwrap();
    let mut events = Vec::new();
    while filter.has_next() {
        events.push(filter.next_event());
    }
    filter.close();
    events
}
