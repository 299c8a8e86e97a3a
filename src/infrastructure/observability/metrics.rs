// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const JOBS_SUBMITTED: &str = "crawl_jobs_submitted_total";
pub const JOBS_COMPLETED: &str = "crawl_jobs_completed_total";
pub const JOBS_FAILED: &str = "crawl_jobs_failed_total";
pub const JOBS_RETRIED: &str = "crawl_jobs_retried_total";
pub const PRODUCT_URLS: &str = "product_urls_discovered_total";
pub const JOB_DURATION: &str = "crawl_job_duration_seconds";
pub const ACTIVE_WORKERS: &str = "crawl_active_workers";
pub const CPU_USAGE: &str = "system_cpu_usage_ratio";
pub const MEMORY_USAGE: &str = "system_memory_usage_ratio";

/// Prometheus recorder 只能全局安装一次
static RECORDER_INSTALLED: AtomicBool = AtomicBool::new(false);

pub fn record_job_submitted() {
    counter!(JOBS_SUBMITTED).increment(1);
}

pub fn record_job_completed(product_urls: usize) {
    counter!(JOBS_COMPLETED).increment(1);
    counter!(PRODUCT_URLS).increment(product_urls as u64);
}

pub fn record_job_failed() {
    counter!(JOBS_FAILED).increment(1);
}

pub fn record_job_retried() {
    counter!(JOBS_RETRIED).increment(1);
}

pub fn record_job_duration(elapsed: Duration) {
    histogram!(JOB_DURATION).record(elapsed.as_secs_f64());
}

pub fn set_active_workers(count: usize) {
    gauge!(ACTIVE_WORKERS).set(count as f64);
}

fn describe_metrics() {
    describe_counter!(JOBS_SUBMITTED, "Total number of domain crawl jobs submitted");
    describe_counter!(JOBS_COMPLETED, "Total number of domain crawl jobs completed");
    describe_counter!(
        JOBS_FAILED,
        "Total number of domain crawl jobs that exhausted their retries"
    );
    describe_counter!(JOBS_RETRIED, "Total number of scheduled job retries");
    describe_counter!(PRODUCT_URLS, "Total number of product URLs discovered");
    describe_histogram!(JOB_DURATION, "Duration of a single crawl attempt in seconds");
    describe_gauge!(ACTIVE_WORKERS, "Number of running crawl workers");
    describe_gauge!(CPU_USAGE, "Current CPU usage ratio (0.0 to 1.0)");
    describe_gauge!(MEMORY_USAGE, "Current memory usage ratio (0.0 to 1.0)");
}

/// 指标采集器
///
/// 显式的生命周期对象：`start` 安装导出器并启动系统指标采样任务，`stop` 结束采样。
/// 由会话持有，不使用全局定时器。
pub struct MetricsCollector {
    settings: MetricsSettings,
    sampler: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl MetricsCollector {
    pub fn new(settings: MetricsSettings) -> Self {
        Self {
            settings,
            sampler: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sampler.is_some()
    }

    /// 启动采集，重复调用无效果
    pub fn start(&mut self) {
        if self.sampler.is_some() {
            return;
        }

        if self.settings.enabled {
            self.install_exporter();
        }
        describe_metrics();

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let period = Duration::from_secs(self.settings.sample_interval_secs.max(1));
        let handle = tokio::spawn(async move {
            let mut system = System::new_with_specifics(
                RefreshKind::nothing()
                    .with_cpu(CpuRefreshKind::everything())
                    .with_memory(MemoryRefreshKind::everything()),
            );
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => update_system_metrics(&mut system),
                    _ = stop_rx.changed() => break,
                }
            }
        });

        self.sampler = Some((stop_tx, handle));
    }

    /// 停止采样任务并等待其退出
    pub async fn stop(&mut self) {
        if let Some((stop_tx, handle)) = self.sampler.take() {
            let _ = stop_tx.send(true);
            if let Err(e) = handle.await {
                warn!("Metrics sampler exited abnormally: {}", e);
            }
        }
    }

    fn install_exporter(&self) {
        if RECORDER_INSTALLED.swap(true, Ordering::SeqCst) {
            return;
        }

        let addr: SocketAddr = match self.settings.listen_addr.parse() {
            Ok(addr) => addr,
            Err(e) => {
                warn!(
                    "Invalid metrics listen address '{}': {}",
                    self.settings.listen_addr, e
                );
                RECORDER_INSTALLED.store(false, Ordering::SeqCst);
                return;
            }
        };

        // Ignore error if address is already in use (for development/testing)
        if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
            warn!(
                "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
                e
            );
            return;
        }
        info!("Metrics exporter listening on {}", addr);
    }
}

fn update_system_metrics(system: &mut System) {
    system.refresh_cpu_all();
    system.refresh_memory();

    let cpu_usage = system.global_cpu_usage() / 100.0;
    gauge!(CPU_USAGE).set(cpu_usage as f64);
    if cpu_usage > 0.9 {
        error!(
            "CRITICAL: System CPU usage is extremely high: {:.2}%",
            cpu_usage * 100.0
        );
    }

    let total_mem = system.total_memory();
    if total_mem > 0 {
        let mem_usage = system.used_memory() as f64 / total_mem as f64;
        gauge!(MEMORY_USAGE).set(mem_usage);
        if mem_usage > 0.9 {
            error!(
                "CRITICAL: System memory usage is extremely high: {:.2}%",
                mem_usage * 100.0
            );
        }
    }
}
