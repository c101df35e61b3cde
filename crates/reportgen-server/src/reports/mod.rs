//! Report generation pipeline
//!
//! - `source`: fetches the dataset
//! - `encoder`: gzip CSV artifact
//! - `builder`: the build state machine
//! - `worker`: queue consumer driving the builder
//! - `links`: presigned download URLs for completed reports

pub mod builder;
pub mod encoder;
pub mod links;
pub mod source;
pub mod worker;

pub use builder::{BuildError, ReportBuilder};
pub use encoder::{encode_monsters, EncodeError, EncodedReport};
pub use links::{DownloadLinkResolver, LinkError};
pub use source::{CompendiumClient, DataSource, Monster, SourceError};
pub use worker::{
    MessageProcessor, ProcessError, ProcessOutcome, ReportWorker, WorkerError, WorkerOptions,
};
