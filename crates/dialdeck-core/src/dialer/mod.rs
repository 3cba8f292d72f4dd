pub mod queue;
pub mod recorder;
pub mod sequencer;

pub use queue::DialerQueue;
pub use recorder::{OutcomeRecorder, OutcomeSink, RecordError, SinkError, MAX_NOTES_CHARS};
pub use sequencer::{Advanced, DialerSequencer, SequenceError, StepState};
