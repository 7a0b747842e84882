use crate::collectors::{DeviceCollector, HostCollector, MetricSource, NvidiaGpu, SysinfoHost};
use crate::config::{OutputStyle, SamplerConfig};
use crate::render::{DelimitedRenderer, Renderer, TabularRenderer};
use crate::sample::{Sample, Timestamp};
use crate::schema::ColumnSchema;
use crate::sink::Sink;
use crate::utils::errors::SamplerError;
use chrono::{DateTime, Local};
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Subtracted from every pause to absorb the cost of measuring and scheduling
/// it. A calibration value, not a contract.
pub const DRIFT_CORRECTION: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Sampling,
    Stopped,
}

#[derive(Default)]
struct StopInner {
    requested: AtomicBool,
    notify: Notify,
}

/// Cloneable stop request shared between a sampler and whoever supervises it.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

impl StopSignal {
    /// Ask the loop to stop at its next iteration boundary. Wakes it if it is sleeping.
    pub fn request_stop(&self) {
        self.inner.requested.store(true, Ordering::Relaxed);
        self.inner.notify.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Relaxed)
    }

    async fn wait(&self) {
        self.inner.notify.notified().await
    }
}

/// Time to wait before the next poll so the period stays close to `interval`.
/// Overrunning iterations get no pause at all.
pub fn pause_after(interval: Duration, elapsed: Duration) -> Duration {
    interval
        .saturating_sub(elapsed)
        .saturating_sub(DRIFT_CORRECTION)
}

/// Periodic poll, render and write loop for one column schema.
pub struct Sampler<H: HostCollector, D: DeviceCollector> {
    config: SamplerConfig,
    schema: Arc<ColumnSchema>,
    source: MetricSource<H, D>,
    renderer: Box<dyn Renderer>,
    /// Headers written over the sampler's lifetime, across runs.
    header_count: usize,
    state: SamplerState,
    last_time: Option<DateTime<Local>>,
    stop: StopSignal,
}

impl Sampler<SysinfoHost, NvidiaGpu> {
    /// Sampler over the local host and whatever `nvidia-smi` reports.
    pub async fn with_system_collectors(config: SamplerConfig) -> Result<Self, SamplerError> {
        Self::create(config, SysinfoHost::new(), NvidiaGpu::new()).await
    }
}

impl<H: HostCollector, D: DeviceCollector> Sampler<H, D> {
    /// Validates the configuration, discovers devices and fixes the schema.
    /// The sink is not touched until a run starts.
    pub async fn create(config: SamplerConfig, host: H, devices: D) -> Result<Self, SamplerError> {
        config.validate()?;
        let source = MetricSource::discover(host, devices).await;
        let schema = Arc::new(ColumnSchema::build(
            config.date_format.as_deref(),
            config.show_units,
            source.device_count(),
        ));

        let renderer: Box<dyn Renderer> = match config.resolved_style() {
            OutputStyle::Delimited => {
                Box::new(DelimitedRenderer::new(&schema, config.separator.clone()))
            }
            OutputStyle::Tabular => Box::new(TabularRenderer::new(&schema)),
        };

        Ok(Self {
            config,
            schema,
            source,
            renderer,
            header_count: 0,
            state: SamplerState::Idle,
            last_time: None,
            stop: StopSignal::default(),
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn schema(&self) -> Arc<ColumnSchema> {
        Arc::clone(&self.schema)
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn header_count(&self) -> usize {
        self.header_count
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Poll every source once. Device failures show up as missing readings.
    pub async fn sample(&mut self) -> Sample {
        let at = self.next_time();
        let host = self.source.poll_host();
        let gpus = self
            .source
            .poll_devices()
            .await
            .into_rows(self.schema.device_count());

        Sample {
            timestamp: Timestamp::from_datetime(&at, self.config.date_format.as_deref()),
            host,
            gpus,
        }
    }

    /// Sample in the foreground. `n_iter` overrides the configured iteration limit.
    /// Returns the number of rows written.
    pub async fn run(&mut self, n_iter: Option<u64>) -> Result<u64, SamplerError> {
        let mut sink = Sink::open(self.config.file.as_deref())?;
        self.drive(&mut sink, n_iter).await
    }

    /// Open the sink, then sample on a background task.
    pub fn start(mut self, n_iter: Option<u64>) -> Result<SamplerHandle, SamplerError> {
        let mut sink = Sink::open(self.config.file.as_deref())?;
        let stop = self.stop_signal();
        let task = tokio::spawn(async move { self.drive(&mut sink, n_iter).await });
        Ok(SamplerHandle { stop, task })
    }

    async fn drive(&mut self, sink: &mut Sink, n_iter: Option<u64>) -> Result<u64, SamplerError> {
        let limit = n_iter.or(self.config.iter_limit).filter(|n| *n > 0);
        let interval = self.config.refresh_interval;
        let stop = self.stop_signal();

        self.state = SamplerState::Sampling;
        info!(
            "Sampling {} column(s) every {:?}, limit {:?}",
            self.schema.len(),
            interval,
            limit
        );

        let result = self.sample_loop(sink, limit, interval, &stop).await;
        self.state = SamplerState::Stopped;

        if let Ok(rows) = &result {
            info!("Sampling stopped after {} row(s)", rows);
        }
        result
    }

    async fn sample_loop(
        &mut self,
        sink: &mut Sink,
        limit: Option<u64>,
        interval: Duration,
        stop: &StopSignal,
    ) -> Result<u64, SamplerError> {
        let mut rows: u64 = 0;
        loop {
            if stop.is_requested() {
                info!("Stop requested");
                break;
            }
            let started = Instant::now();

            if self.header_due() {
                sink.emit(&self.renderer.render_header())?;
                self.header_count += 1;
            }
            let sample = self.sample().await;
            sink.emit(&self.renderer.render_row(&sample))?;
            rows += 1;
            debug!("Wrote row {}", rows);

            if limit.is_some_and(|n| rows >= n) {
                break;
            }

            let pause = pause_after(interval, started.elapsed());
            if !pause.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = stop.wait() => {}
                }
            }
        }
        Ok(rows)
    }

    fn header_due(&self) -> bool {
        self.config.show_header && (self.header_count == 0 || !self.config.header_only_once)
    }

    /// Wall-clock time that never goes backwards within the session.
    fn next_time(&mut self) -> DateTime<Local> {
        let now = Local::now();
        let at = match self.last_time {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        self.last_time = Some(at);
        at
    }
}

/// A sampler running on a background task.
pub struct SamplerHandle {
    stop: StopSignal,
    task: JoinHandle<Result<u64, SamplerError>>,
}

impl SamplerHandle {
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end and return the number of rows written.
    pub async fn join(self) -> Result<u64, SamplerError> {
        self.task
            .await
            .map_err(|e| SamplerError::Task(e.to_string()))?
    }
}
