//! Audit pipeline: request tasks push records onto a bounded channel and a
//! single registrar task writes them to the record store.

mod records;
mod registrar;
mod store;

pub(crate) use records::{AuditRecord, StateRecord};
pub(crate) use registrar::{audit_channel, AuditSender, Registrar, DEFAULT_QUEUE_CAPACITY};
pub(crate) use store::{JsonlStore, NullStore, RecordStore};

#[cfg(test)]
pub(crate) use records::RecMessage;
#[cfg(test)]
pub(crate) use store::testing::MemoryStore;
