//! The seams of the framework: filters, writers, steps and observers.

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::event::Event;
use crate::locale::LocaleId;
use crate::parameters::Parameters;
use crate::resource::RawDocument;

/// Parses one document format into an event stream.
///
/// A filter is opened on a [`RawDocument`], then drained event by event:
///
/// ```text
/// filter.open(input, true)?;
/// while filter.has_next() {
///     let event = filter.next_event();
///     ...
/// }
/// filter.close();
/// ```
///
/// The first event of a well-formed stream is `START_DOCUMENT` and the last
/// one `END_DOCUMENT`.
pub trait Filter {
    /// Stable name of the filter, used as its registry key.
    fn name(&self) -> &str;

    /// Starts parsing an input document. With `generate_skeleton` set, the
    /// filter attaches skeleton to the resources it sends so a writer can
    /// reproduce the original file.
    fn open(&mut self, input: RawDocument, generate_skeleton: bool) -> Result<()>;

    /// True while the stream has events left.
    fn has_next(&self) -> bool;

    /// The next event of the stream.
    ///
    /// # Panics
    ///
    /// May panic when called after [`Self::has_next`] returned false.
    fn next_event(&mut self) -> Event;

    /// Releases the input document. Called once the stream is drained.
    fn close(&mut self);

    /// Stops parsing early; the next event should close the stream.
    fn cancel(&mut self);

    fn parameters(&self) -> Option<&Parameters> {
        None
    }

    fn set_parameters(&mut self, _parameters: Parameters) {}
}

/// Writes an event stream back out as a document.
///
/// Output destination and options are set before the first event arrives;
/// the writer opens its output on `START_DOCUMENT` and closes it on
/// `END_DOCUMENT`.
pub trait FilterWriter {
    /// Stable name of the writer, used as its registry key.
    fn name(&self) -> &str;

    fn set_output_path(&mut self, path: &Path);

    fn set_output_stream(&mut self, stream: Box<dyn Write + Send>);

    /// Sets the output locale and encoding. `None` keeps the current value.
    fn set_options(&mut self, locale: Option<LocaleId>, encoding: Option<&str>);

    /// Processes one event and passes it on.
    fn handle_event(&mut self, event: Event) -> Result<Event>;

    /// Finishes and releases the output. Safe to call more than once.
    fn close(&mut self) -> Result<()>;

    /// Abandons the output without finishing it.
    fn cancel(&mut self);
}

/// One stage of a pipeline.
///
/// The pipeline drives every event of the stream through `handle_event`.
/// A step that generates several events for one input returns them as a
/// `MULTI_EVENT`; a step that consumes events returns `NO_OP`.
pub trait PipelineStep {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn handle_event(&mut self, event: Event) -> Result<Event>;

    /// False while the step still has events to produce for the current
    /// batch item; the pipeline keeps feeding it `NO_OP` until done.
    fn is_done(&self) -> bool {
        true
    }

    /// Called when the pipeline is cancelled mid-run.
    fn cancel(&mut self) {}

    /// Called when the pipeline is destroyed; release held resources.
    fn destroy(&mut self) {}
}

/// Receives the terminal event of each pipeline pass.
pub trait Observer {
    fn update(&mut self, event: &Event);
}
