//! Service layer for the inference engine integration.
//!
//! Contains the record and protocol traits and their HTTP implementation.

pub mod engine_client;
pub mod protocol;
pub mod records;

pub use engine_client::EngineClient;
pub use protocol::InterviewProtocol;
pub use records::CaseRecords;

/// Everything an interview session needs from the engine.
pub trait DiagnosisBackend: CaseRecords + InterviewProtocol {}

impl<T: CaseRecords + InterviewProtocol + ?Sized> DiagnosisBackend for T {}
