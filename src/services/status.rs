use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::hestia::{HestiaApi, StatusProbe};

/// Output of one `v-list-sys-*-status` command
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub cpu: ProbeReport,
    pub memory: ProbeReport,
    pub disk: ProbeReport,
    pub network: ProbeReport,
    pub collected_at: DateTime<Utc>,
}

impl SystemStatus {
    pub fn healthy(&self) -> bool {
        [&self.cpu, &self.memory, &self.disk, &self.network].iter().all(|p| p.ok)
    }
}

async fn probe(hestia: &dyn HestiaApi, probe: StatusProbe) -> ProbeReport {
    match hestia.system_status(probe).await {
        Ok(output) => ProbeReport {
            ok: true,
            output: Some(output),
            error: None,
        },
        Err(e) => {
            warn!("{} failed: {}", probe.command(), e);
            ProbeReport {
                ok: false,
                output: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// CPU is sampled alone first so the other probes do not skew it
pub async fn collect(hestia: &dyn HestiaApi) -> SystemStatus {
    let cpu = probe(hestia, StatusProbe::Cpu).await;
    let (memory, disk, network) = futures::join!(
        probe(hestia, StatusProbe::Memory),
        probe(hestia, StatusProbe::Disk),
        probe(hestia, StatusProbe::Network),
    );

    SystemStatus {
        cpu,
        memory,
        disk,
        network,
        collected_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hestia::HestiaError;
    use crate::testing::FakeHestia;

    #[tokio::test]
    async fn cpu_is_queried_before_the_rest() {
        let hestia = FakeHestia::new();
        let status = collect(&hestia).await;

        assert!(status.healthy());
        let commands = hestia.commands();
        assert_eq!(commands[0], "v-list-sys-cpu-status");
        assert_eq!(commands.len(), 4);
        assert_eq!(status.memory.output.as_deref(), Some("v-list-sys-memory-status ok"));
    }

    #[tokio::test]
    async fn failed_probe_is_reported_not_raised() {
        let hestia = FakeHestia::new().failing("v-list-sys-disk-status", HestiaError::Unexpected("boom".into()));
        let status = collect(&hestia).await;

        assert!(!status.healthy());
        assert!(!status.disk.ok);
        assert!(status.disk.error.as_deref().unwrap().contains("boom"));
        assert!(status.network.ok);
    }
}
