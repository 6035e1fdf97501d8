use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum PowerState {
    Running,
    Stopped,
    #[default]
    Unknown,
}

impl PowerState {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClusterEntry {
    pub(crate) name: String,
    pub(crate) resource_group: String,
    pub(crate) cluster_name: String,
    pub(crate) power_state: PowerState,
}

/// A managed cluster. Identity is fixed at load time; the cached power state
/// sits behind the entry's own lock.
#[derive(Debug)]
pub(crate) struct Entry {
    name: String,
    resource_group: String,
    cluster_name: String,
    power_state: Mutex<PowerState>,
}

impl Entry {
    pub(crate) fn new(seed: ClusterEntry) -> Self {
        Self {
            name: seed.name,
            resource_group: seed.resource_group,
            cluster_name: seed.cluster_name,
            power_state: Mutex::new(seed.power_state),
        }
    }

    pub(crate) fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub(crate) fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Entries without a resource group or cluster name cannot be addressed
    /// through the control API and are skipped by status/start/stop.
    pub(crate) fn is_addressable(&self) -> bool {
        !self.resource_group.is_empty() && !self.cluster_name.is_empty()
    }

    /// Exclusive access to the cached power state. Every mutation goes through
    /// this guard.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, PowerState> {
        self.power_state.lock().await
    }

    pub(crate) fn view(&self, power_state: PowerState) -> ClusterEntry {
        ClusterEntry {
            name: self.name.clone(),
            resource_group: self.resource_group.clone(),
            cluster_name: self.cluster_name.clone(),
            power_state,
        }
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> ClusterEntry {
        let state = *self.lock().await;
        self.view(state)
    }
}

#[derive(Debug, Default)]
pub(crate) struct EntryList {
    entries: Vec<Arc<Entry>>,
}

impl EntryList {
    pub(crate) fn new(seeds: impl IntoIterator<Item = ClusterEntry>) -> Self {
        Self {
            entries: seeds.into_iter().map(|seed| Arc::new(Entry::new(seed))).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn addressable(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.entries.iter().filter(|entry| entry.is_addressable())
    }

    pub(crate) fn find(&self, cluster_name: &str) -> Option<Arc<Entry>> {
        self.addressable()
            .find(|entry| entry.cluster_name == cluster_name)
            .cloned()
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> Vec<ClusterEntry> {
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            out.push(entry.snapshot().await);
        }
        out
    }

    pub(crate) fn config_table(&self) -> String {
        let name_width = column_width(self.entries.iter().map(|entry| entry.name.as_str()));
        let rg_width = column_width(self.entries.iter().map(|entry| entry.resource_group.as_str()));
        let cn_width = column_width(self.entries.iter().map(|entry| entry.cluster_name.as_str()));
        let name_span = "─".repeat(name_width + 2);
        let rg_span = "─".repeat(rg_width + 2);
        let cn_span = "─".repeat(cn_width + 2);

        let row = |name: &str, rg: &str, cn: &str| {
            format!("│ {name:<name_width$} │ {rg:<rg_width$} │ {cn:<cn_width$} │\n")
        };

        let mut table = String::new();
        table.push_str(&format!("╭{name_span}┬{rg_span}┬{cn_span}╮\n"));
        table.push_str(&row("Name", "Resource Group", "Cluster Name"));
        table.push_str(&format!("├{name_span}┼{rg_span}┼{cn_span}┤\n"));
        for entry in &self.entries {
            table.push_str(&row(&entry.name, &entry.resource_group, &entry.cluster_name));
        }
        table.push_str(&format!("╰{name_span}┴{rg_span}┴{cn_span}╯\n"));
        table
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.map(|value| value.chars().count()).fold(15, usize::max) + 2
}

#[cfg(test)]
pub(crate) fn seed(name: &str, cluster_name: &str, power_state: PowerState) -> ClusterEntry {
    ClusterEntry {
        name: name.to_string(),
        resource_group: format!("rg-{name}"),
        cluster_name: cluster_name.to_string(),
        power_state,
    }
}
