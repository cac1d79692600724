//! Types and traits for recording run metadata and training metrics.
//!
//! [`Record`] is a container of key-value pairs with values of various
//! types ([`RecordValue`]). Agents emit records from their training loop
//! and from [`set_writer`](crate::Agent::set_writer), which logs the
//! agent's configuration as a "Hyperparameters" table. [`Recorder`] is the
//! sink interface; [`BufferedRecorder`] keeps records in memory and
//! [`NullRecorder`] discards them.
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
