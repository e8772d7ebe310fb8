use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use netventory_audit::SecurityAuditor;
use netventory_rules::ServiceRuleTable;
use netventory_scan::{NmapLauncher, OutputParser, ProbeLauncher};
use netventory_types::{Device, HardwareInfo, Intensity, ScanConfig};
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::target::{TargetParseError, expand_targets};

/// Upper bound on concurrent host scans; small ranges use one worker per host.
const MAX_WORKERS: usize = 32;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid target range: {0}")]
    InvalidRange(#[from] TargetParseError),
}

/// Event emitted during a streaming scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Informational message for activity tracking.
    Log(String),
    /// One host finished parsing and scoring.
    DeviceFound {
        device: Box<Device>,
        hosts_completed: usize,
        hosts_total: usize,
    },
    /// Non-fatal error during the scan.
    Error(String),
    /// Entire scan completed; always the last event on a finished run.
    Complete {
        devices: Vec<Device>,
        elapsed: Duration,
    },
}

/// Best-effort scan progress counters.
///
/// Updated without synchronization beyond the atomics themselves; values are
/// for display only, never for control decisions.
#[derive(Debug, Default)]
pub struct ScanProgress {
    total: AtomicUsize,
    scanned: AtomicUsize,
    scanning: AtomicBool,
}

impl ScanProgress {
    fn begin(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.scanned.store(0, Ordering::Relaxed);
        self.scanning.store(true, Ordering::Relaxed);
    }

    fn record_completed(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self) {
        self.scanning.store(false, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.scanned.store(0, Ordering::Relaxed);
        self.scanning.store(false, Ordering::Relaxed);
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Relaxed)
    }

    /// Completed hosts as a percentage of the run's total.
    pub fn percent(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.scanned.load(Ordering::Relaxed) as f64 / total as f64 * 100.0
    }
}

type DeviceCallback = Box<dyn Fn(&Device) + Send + Sync>;

/// Orchestrates one scan run: expands the target range, fans host probes out
/// over a bounded worker pool, scores each parsed device, and collects the
/// results ordered by address.
pub struct ScanEngine {
    launcher: Arc<dyn ProbeLauncher>,
    auditor: Arc<SecurityAuditor>,
    progress: Arc<ScanProgress>,
    cancel: Mutex<CancellationToken>,
    callbacks: Mutex<Vec<DeviceCallback>>,
}

impl ScanEngine {
    pub fn new(launcher: Arc<dyn ProbeLauncher>, auditor: Arc<SecurityAuditor>) -> Self {
        Self {
            launcher,
            auditor,
            progress: Arc::new(ScanProgress::default()),
            cancel: Mutex::new(CancellationToken::new()),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Engine wired to the real nmap binary and the default rule catalog.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(NmapLauncher),
            Arc::new(SecurityAuditor::new(Arc::new(ServiceRuleTable::new()))),
        )
    }

    /// Register a handler invoked once per discovered device.
    ///
    /// A panicking handler is caught and logged; it never aborts the scan.
    pub fn on_device(&self, callback: impl Fn(&Device) + Send + Sync + 'static) {
        lock_unpoisoned(&self.callbacks).push(Box::new(callback));
    }

    pub fn progress(&self) -> &ScanProgress {
        &self.progress
    }

    /// Request cancellation: no new hosts start, in-flight probes are killed,
    /// and progress counters reset. Already-emitted devices are unaffected.
    pub fn stop(&self) {
        info!("scan stop requested");
        lock_unpoisoned(&self.cancel).cancel();
        self.progress.reset();
    }

    /// Run a scan to completion and return the devices sorted by address
    /// (numeric octet order).
    ///
    /// Thin wrapper around [`scan_streaming`](Self::scan_streaming) that
    /// collects events internally and drives the registered callbacks.
    pub async fn scan(&self, config: &ScanConfig) -> Result<Vec<Device>, EngineError> {
        let (tx, mut rx) = mpsc::channel(64);
        let cancel = self.fresh_token();

        let collect = async {
            let mut final_devices = None;
            while let Some(event) = rx.recv().await {
                match event {
                    ScanEvent::DeviceFound { ref device, .. } => {
                        // Gate on the token so no callback fires once stop()
                        // has returned, even for events already in flight.
                        if !cancel.is_cancelled() {
                            self.notify_device(device);
                        }
                    }
                    ScanEvent::Complete { devices, .. } => final_devices = Some(devices),
                    ScanEvent::Log(_) | ScanEvent::Error(_) => {}
                }
            }
            final_devices
        };

        let (run, devices) = tokio::join!(self.scan_streaming(config, tx, cancel.clone()), collect);
        run?;
        Ok(devices.unwrap_or_default())
    }

    /// Run a scan, emitting [`ScanEvent`]s as hosts complete.
    ///
    /// Events are sent best-effort; a dropped receiver never aborts the scan.
    /// On cancellation the outstanding workers are aborted, results that
    /// completed beforehand are kept, and a final `Complete` still fires.
    pub async fn scan_streaming(
        &self,
        config: &ScanConfig,
        tx: mpsc::Sender<ScanEvent>,
        cancel: CancellationToken,
    ) -> Result<(), EngineError> {
        let hosts = expand_targets(&config.target)?;
        let hosts_total = hosts.len();
        let overall_start = Instant::now();
        self.progress.begin(hosts_total);

        info!(
            target = %config.target,
            hosts = hosts_total,
            intensity = %config.intensity,
            "starting network scan"
        );
        let _ = tx
            .send(ScanEvent::Log(format!(
                "Scanning {hosts_total} hosts in {}",
                config.target
            )))
            .await;

        let semaphore = Arc::new(Semaphore::new(hosts_total.min(MAX_WORKERS)));
        let mut join_set: JoinSet<Option<Box<Device>>> = JoinSet::new();

        for host in hosts {
            let launcher = Arc::clone(&self.launcher);
            let auditor = Arc::clone(&self.auditor);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let tx = tx.clone();
            let intensity = config.intensity;
            let snmp_community = config.snmp_community.clone();

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return None,
                };
                // Observe cancellation before starting new work
                if cancel.is_cancelled() {
                    return None;
                }

                match scan_single_host(
                    launcher.as_ref(),
                    &auditor,
                    &host,
                    intensity,
                    &snmp_community,
                    &cancel,
                )
                .await
                {
                    Ok(device) => device.map(Box::new),
                    Err(e) => {
                        warn!(host = %host, error = %e, "host scan failed");
                        let _ = tx
                            .send(ScanEvent::Error(format!("scan failed for {host}: {e}")))
                            .await;
                        None
                    }
                }
            });
        }

        let mut devices: Vec<Device> = Vec::with_capacity(hosts_total);
        let mut hosts_completed = 0usize;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    join_set.abort_all();
                    // Keep results that completed before the abort
                    while let Some(result) = join_set.join_next().await {
                        if let Ok(Some(device)) = result {
                            devices.push(*device);
                        }
                    }
                    let _ = tx.send(ScanEvent::Log("scan cancelled".into())).await;
                    break;
                }
                result = join_set.join_next() => {
                    match result {
                        Some(Ok(maybe_device)) => {
                            hosts_completed += 1;
                            self.progress.record_completed();
                            if let Some(device) = maybe_device {
                                let _ = tx
                                    .send(ScanEvent::DeviceFound {
                                        device: device.clone(),
                                        hosts_completed,
                                        hosts_total,
                                    })
                                    .await;
                                devices.push(*device);
                            }
                        }
                        Some(Err(e)) => {
                            hosts_completed += 1;
                            self.progress.record_completed();
                            warn!(error = %e, "host scan task panicked");
                            let _ = tx
                                .send(ScanEvent::Error(format!("host scan task panicked: {e}")))
                                .await;
                        }
                        None => break,
                    }
                }
            }
        }

        devices.sort_by_key(|d| d.address_sort_key());

        let elapsed = overall_start.elapsed();
        info!(
            devices = devices.len(),
            elapsed_s = elapsed.as_secs_f64(),
            "scan complete"
        );
        let _ = tx.send(ScanEvent::Complete { devices, elapsed }).await;
        self.progress.finish();

        Ok(())
    }

    fn fresh_token(&self) -> CancellationToken {
        let mut guard = lock_unpoisoned(&self.cancel);
        *guard = CancellationToken::new();
        guard.clone()
    }

    fn notify_device(&self, device: &Device) {
        for callback in lock_unpoisoned(&self.callbacks).iter() {
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(device))).is_err() {
                error!(device = %device.address, "device callback panicked");
            }
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Probe one host: launch the scanner, stream its output into the parser,
/// then score the accumulated device.
///
/// Cancellation mid-stream kills the process and yields no device. A non-zero
/// exit keeps whatever was parsed. A scoring failure keeps the device
/// unassessed rather than dropping the host.
async fn scan_single_host(
    launcher: &dyn ProbeLauncher,
    auditor: &SecurityAuditor,
    host: &str,
    intensity: Intensity,
    snmp_community: &str,
    cancel: &CancellationToken,
) -> Result<Option<Device>, String> {
    let start = Instant::now();
    info!(host = %host, "scanning host");

    let mut probe = launcher
        .launch(host, intensity)
        .await
        .map_err(|e| e.to_string())?;
    let mut parser = OutputParser::new(host);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = probe.kill().await {
                    warn!(host = %host, error = %e, "failed to kill probe process");
                }
                return Ok(None);
            }
            line = probe.next_line() => match line.map_err(|e| e.to_string())? {
                Some(line) => parser.parse_line(&line),
                None => break,
            }
        }
    }

    match probe.wait().await {
        Ok(Some(0)) => {}
        Ok(code) => warn!(host = %host, ?code, "scanner exited non-zero"),
        Err(e) => warn!(host = %host, error = %e, "failed to reap scanner process"),
    }

    if cancel.is_cancelled() {
        return Ok(None);
    }

    let mut device = parser.into_device(start.elapsed().as_secs_f64());
    device.hardware = hardware_info(host, snmp_community);

    match auditor.audit(&device) {
        Ok(report) => {
            device.risk_level = Some(report.risk_level);
            device.risk_score = report.risk_score;
            device.vulnerabilities = report.vulnerabilities;
            device.recommendations = report.recommendations;
        }
        Err(e) => warn!(host = %host, error = %e, "audit failed, emitting device unassessed"),
    }

    info!(
        host = %host,
        open_ports = device.services.len(),
        risk_level = ?device.risk_level,
        elapsed_s = start.elapsed().as_secs_f64(),
        "host scan complete"
    );

    Ok(Some(device))
}

/// Hardware facts come from the SNMP enrichment collaborator; the engine only
/// attaches the placeholder it will fill in.
fn hardware_info(_host: &str, _snmp_community: &str) -> HardwareInfo {
    HardwareInfo::default()
}
