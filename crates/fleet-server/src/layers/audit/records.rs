use protocol::{Command, CommandResponse};
use serde::{Serialize, Serializer};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordKind {
    Command,
    ClusterState,
}

pub(crate) trait Record {
    fn set_timestamp(&mut self, tstp: SystemTime);

    fn kind(&self) -> RecordKind;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AuditRecord {
    pub(crate) username: Option<String>,
    pub(crate) command: Option<String>,
    pub(crate) command_options: Option<String>,
    pub(crate) command_result: Option<String>,
    pub(crate) command_error: Option<String>,
    #[serde(serialize_with = "rfc3339")]
    pub(crate) start_time: SystemTime,
    #[serde(serialize_with = "rfc3339")]
    pub(crate) end_time: SystemTime,
    #[serde(serialize_with = "rfc3339")]
    pub(crate) tstp: SystemTime,
}

impl AuditRecord {
    pub(crate) fn new(command: &Command, response: &CommandResponse) -> Self {
        Self {
            username: nullable(&command.user_id),
            command: nullable(&command.cmd_name),
            command_options: nullable(&command.joined_opts()),
            command_result: nullable(&response.cmd_result),
            command_error: nullable(&response.cmd_error),
            start_time: response.start_time,
            end_time: response.end_time,
            tstp: SystemTime::now(),
        }
    }
}

impl Record for AuditRecord {
    fn set_timestamp(&mut self, tstp: SystemTime) {
        self.tstp = tstp;
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Command
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StateRecord {
    pub(crate) username: Option<String>,
    pub(crate) cluster_name: Option<String>,
    pub(crate) cluster_status: Option<String>,
    #[serde(serialize_with = "rfc3339")]
    pub(crate) tstp: SystemTime,
}

impl StateRecord {
    pub(crate) fn new(username: &str, cluster_name: &str, cluster_status: &str) -> Self {
        Self {
            username: nullable(username),
            cluster_name: nullable(cluster_name),
            cluster_status: nullable(cluster_status),
            tstp: SystemTime::now(),
        }
    }
}

impl Record for StateRecord {
    fn set_timestamp(&mut self, tstp: SystemTime) {
        self.tstp = tstp;
    }

    fn kind(&self) -> RecordKind {
        RecordKind::ClusterState
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecMessage {
    Audit(AuditRecord),
    State(StateRecord),
}

impl RecMessage {
    pub(crate) fn record_mut(&mut self) -> &mut dyn Record {
        match self {
            Self::Audit(record) => record,
            Self::State(record) => record,
        }
    }

    pub(crate) fn kind(&self) -> RecordKind {
        match self {
            Self::Audit(record) => record.kind(),
            Self::State(record) => record.kind(),
        }
    }
}

impl From<AuditRecord> for RecMessage {
    fn from(record: AuditRecord) -> Self {
        Self::Audit(record)
    }
}

impl From<StateRecord> for RecMessage {
    fn from(record: StateRecord) -> Self {
        Self::State(record)
    }
}

fn nullable(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn rfc3339<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_rfc3339_nanos(*time))
}
