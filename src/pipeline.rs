//! The pipeline that drives events through an ordered chain of steps.
//!
//! A [`Pipeline`] owns its [`PipelineStep`]s in two lists: the active steps
//! still working on the current batch item, and the finished steps kept for
//! batch-level events and the next item. Each call to [`Pipeline::process`]
//! runs one batch item: the input event is driven through every step, steps
//! that produce further events are polled until done, and every terminal
//! event is delivered to the registered [`Observer`]s.
//!
//! A step may return a `MULTI_EVENT` to fan its output out; unless the
//! group is flagged to propagate as a single event, the pipeline expands it
//! and sends each contained event through the remaining steps on its own.

use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};

use crate::error::Result;
use crate::event::Event;
use crate::resource::RawDocument;
use crate::traits::{Observer, PipelineStep};

/// Lifecycle state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Built but not running.
    Paused,
    /// Driving events.
    Running,
    /// Stopped early by [`Pipeline::cancel`] or a `CANCELED` event.
    Cancelled,
    /// Finished a batch normally.
    Succeeded,
    /// Steps destroyed; the pipeline is no longer usable.
    Destroyed,
}

/// An ordered chain of steps plus the observers watching its output.
pub struct Pipeline {
    id: String,
    steps: VecDeque<Box<dyn PipelineStep>>,
    finished_steps: Vec<Box<dyn PipelineStep>>,
    observers: Vec<Box<dyn Observer>>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline {
            id: String::new(),
            steps: VecDeque::new(),
            finished_steps: Vec::new(),
            observers: Vec::new(),
            state: PipelineState::Paused,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Appends a step to the end of the chain.
    pub fn add_step(&mut self, step: impl PipelineStep + 'static) {
        self.steps.push_back(Box::new(step));
    }

    /// Every step of the pipeline, finished ones first, in chain order.
    pub fn steps(&self) -> Vec<&dyn PipelineStep> {
        self.finished_steps
            .iter()
            .map(Box::as_ref)
            .chain(self.steps.iter().map(Box::as_ref))
            .collect()
    }

    /// Drops all steps without destroying them.
    pub fn clear_steps(&mut self) {
        self.steps.clear();
        self.finished_steps.clear();
    }

    pub fn add_observer(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify_observers(&mut self, event: &Event) {
        for observer in &mut self.observers {
            observer.update(event);
        }
    }

    /// Restores the finished steps to the front of the active chain, in
    /// their original order.
    fn initialize(&mut self) {
        for step in self.finished_steps.drain(..).rev() {
            self.steps.push_front(step);
        }
    }

    /// Opens a batch: sends `START_BATCH` through every step.
    pub fn start_batch(&mut self) -> Result<()> {
        log::debug!("pipeline `{}`: start batch", self.id);
        self.state = PipelineState::Running;
        self.initialize();
        let mut event = Event::StartBatch;
        for step in self.steps.iter_mut() {
            event = step.handle_event(event)?;
        }
        self.notify_observers(&event);
        Ok(())
    }

    /// Closes the batch: sends `END_BATCH` through every finished step.
    pub fn end_batch(&mut self) -> Result<()> {
        log::debug!("pipeline `{}`: end batch", self.id);
        let mut event = Event::EndBatch;
        for step in self.finished_steps.iter_mut() {
            event = step.handle_event(event)?;
        }
        self.notify_observers(&event);
        self.state = PipelineState::Succeeded;
        Ok(())
    }

    /// Runs one batch item seeded with `input` and returns its terminal
    /// event. Surrounds the item with `START_BATCH_ITEM` and
    /// `END_BATCH_ITEM` deliveries to every step.
    pub fn process(&mut self, input: Event) -> Result<Event> {
        self.state = PipelineState::Running;
        self.initialize();

        let mut opening = Event::StartBatchItem;
        for step in self.steps.iter_mut() {
            opening = step.handle_event(opening)?;
        }
        self.notify_observers(&opening);

        let terminal = self.execute(input)?;

        // Whatever is still active is done with this item.
        while let Some(step) = self.steps.pop_front() {
            self.finished_steps.push(step);
        }

        let mut closing = Event::EndBatchItem;
        for step in self.finished_steps.iter_mut() {
            closing = step.handle_event(closing)?;
        }
        self.notify_observers(&closing);
        Ok(terminal)
    }

    /// Runs one batch item seeded with a raw document.
    pub fn process_raw_document(&mut self, raw: RawDocument) -> Result<Event> {
        self.process(Event::RawDocument(raw))
    }

    /// Stops the pipeline early and tells the active steps.
    pub fn cancel(&mut self) {
        log::debug!("pipeline `{}`: cancelled", self.id);
        self.state = PipelineState::Cancelled;
        for step in self.steps.iter_mut() {
            step.cancel();
        }
    }

    /// Destroys the finished steps and retires the pipeline.
    pub fn destroy(&mut self) {
        for step in self.finished_steps.iter_mut() {
            step.destroy();
        }
        self.state = PipelineState::Destroyed;
    }

    fn execute(&mut self, input: Event) -> Result<Event> {
        let mut event = input;
        while !self.steps.is_empty() && self.state != PipelineState::Cancelled {
            loop {
                event = self.drive(event, 0)?;
                if !event.is_no_op() {
                    self.notify_observers(&event);
                }
                let first_done = self.steps.front().is_none_or(|step| step.is_done());
                if first_done || self.state == PipelineState::Cancelled {
                    break;
                }
                // The head step still has events to produce; poke it again.
                event = Event::NoOp;
            }
            // Retire every leading done step in one pass, so a trailing
            // consumer does not see the same stream twice.
            while self.steps.front().is_some_and(|step| step.is_done()) {
                if let Some(step) = self.steps.pop_front() {
                    self.finished_steps.push(step);
                }
            }
        }
        Ok(event)
    }

    /// Sends one event through the steps from `from` on, expanding event
    /// groups into the downstream steps.
    fn drive(&mut self, event: Event, from: usize) -> Result<Event> {
        let mut event = event;
        let mut i = from;
        while i < self.steps.len() {
            if self.state == PipelineState::Cancelled {
                return Ok(Event::Canceled);
            }
            let output = self.steps[i].handle_event(event)?;
            match output {
                Event::Canceled => {
                    self.cancel();
                    return Ok(Event::Canceled);
                }
                Event::Multi(multi) if !multi.propagate_as_single => {
                    for sub in multi {
                        let out = self.drive(sub, i + 1)?;
                        if !out.is_no_op() {
                            self.notify_observers(&out);
                        }
                    }
                    return Ok(Event::NoOp);
                }
                other => event = other,
            }
            i += 1;
        }
        Ok(event)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}

impl Debug for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.steps().iter().map(|step| step.name()).collect();
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("steps", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PassStep {
        name: &'static str,
    }

    impl PipelineStep for PassStep {
        fn name(&self) -> &str {
            self.name
        }

        fn handle_event(&mut self, event: Event) -> Result<Event> {
            Ok(event)
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut pipeline = Pipeline::new();
        pipeline.add_step(PassStep { name: "a" });
        assert_eq!(pipeline.state(), PipelineState::Paused);

        pipeline.start_batch().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);

        pipeline.process(Event::NoOp).unwrap();
        pipeline.end_batch().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Succeeded);

        pipeline.destroy();
        assert_eq!(pipeline.state(), PipelineState::Destroyed);
    }

    #[test]
    fn test_cancel_state() {
        let mut pipeline = Pipeline::new();
        pipeline.add_step(PassStep { name: "a" });
        pipeline.cancel();
        assert_eq!(pipeline.state(), PipelineState::Cancelled);
    }

    #[test]
    fn test_steps_keep_chain_order_across_items() {
        let mut pipeline = Pipeline::new();
        pipeline.add_step(PassStep { name: "first" });
        pipeline.add_step(PassStep { name: "second" });

        let names = |p: &Pipeline| -> Vec<String> {
            p.steps().iter().map(|s| s.name().to_string()).collect()
        };
        assert_eq!(names(&pipeline), ["first", "second"]);

        pipeline.start_batch().unwrap();
        pipeline.process(Event::NoOp).unwrap();
        // All steps are finished now, still in order.
        assert_eq!(names(&pipeline), ["first", "second"]);

        // The next item restores them as active, in order.
        pipeline.process(Event::NoOp).unwrap();
        assert_eq!(names(&pipeline), ["first", "second"]);
    }

    #[test]
    fn test_clear_steps() {
        let mut pipeline = Pipeline::new();
        pipeline.add_step(PassStep { name: "a" });
        pipeline.clear_steps();
        assert!(pipeline.steps().is_empty());
    }
}
