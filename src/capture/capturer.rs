use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::capture::double_buffer::DoubleBuffer;
use crate::capture::source::ScreenSource;
use crate::capture::stats::{CaptureStats, CaptureStatsSnapshot};
use crate::common::Frame;
use crate::config::CaptureConfig;
use crate::error::CaptureError;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Non-blocking access to the most recent frame. The seam between the
/// capture core and decision-making.
pub trait FrameAcquirer: Send + Sync {
    fn latest_frame(&self) -> Result<Frame, CaptureError>;
}

/// Decouples the OS-level screen read from consumption cadence.
///
/// `start()` launches two cooperating tasks: a fixed-interval capture task
/// that performs one blocking screen read per tick, and a swap task that
/// drains the publish queue into the double buffer. The queue is small and
/// non-blocking on the producer side: if the swap task lags, new captures are
/// dropped, not queued. Freshest frame wins.
pub struct DoubleBufferedCapturer {
    source: Arc<dyn ScreenSource>,
    buffer: Arc<DoubleBuffer>,
    stats: Arc<CaptureStats>,
    config: CaptureConfig,
    cancel: Mutex<CancellationToken>,
    tasks: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
    running: AtomicBool,
}

impl DoubleBufferedCapturer {
    pub fn new(source: Arc<dyn ScreenSource>, config: CaptureConfig) -> Self {
        let initial = Frame::blank(config.region.width.max(1), config.region.height.max(1));
        Self {
            source,
            buffer: Arc::new(DoubleBuffer::new(initial)),
            stats: Arc::new(CaptureStats::default()),
            config,
            cancel: Mutex::new(CancellationToken::new()),
            tasks: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// Launch the capture and swap tasks. Fails if already running.
    pub fn start(&self) -> Result<(), CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStarted);
        }

        let cancel = CancellationToken::new();
        let (frame_tx, frame_rx) = mpsc::channel(self.config.frame_queue_size.max(1));

        let capture_task = Self::start_capture_task(
            Arc::clone(&self.source),
            Arc::clone(&self.stats),
            frame_tx,
            self.config.target_fps,
            cancel.clone(),
        );
        let swap_task = Self::start_swap_task(Arc::clone(&self.buffer), frame_rx, cancel.clone());

        *self.cancel.lock().unwrap() = cancel;
        *self.tasks.lock().unwrap() = Some((capture_task, swap_task));
        tracing::info!(
            target_fps = self.config.target_fps,
            queue = self.config.frame_queue_size,
            "capture core started"
        );
        Ok(())
    }

    fn start_capture_task(
        source: Arc<dyn ScreenSource>,
        stats: Arc<CaptureStats>,
        frame_tx: mpsc::Sender<Frame>,
        target_fps: f64,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        // The guard keeps a misconfigured cadence from panicking the ticker.
        let period = Duration::from_secs_f64(1.0 / target_fps.max(0.001));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The capture loop runs sequentially regardless of skipped ticks,
            // so a slow screen read never spawns overlapping reads.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let read_source = Arc::clone(&source);
                let started = tokio::time::Instant::now();
                match tokio::task::spawn_blocking(move || read_source.capture()).await {
                    Ok(Ok(frame)) => {
                        stats.record_capture(started.elapsed());
                        match frame_tx.try_send(frame) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                // Drop frame to keep real-time
                                stats.record_dropped();
                                tracing::warn!("dropping frame: swap queue full");
                            }
                            Err(TrySendError::Closed(_)) => {
                                tracing::warn!("frame queue closed, stopping capture loop");
                                break;
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        stats.record_error();
                        tracing::debug!("capture failed: {e}");
                    }
                    Err(e) => {
                        stats.record_error();
                        tracing::error!("capture worker failed: {e}");
                    }
                }
            }
            tracing::info!("capture task exited");
        })
    }

    fn start_swap_task(
        buffer: Arc<DoubleBuffer>,
        mut frame_rx: mpsc::Receiver<Frame>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    frame = frame_rx.recv() => match frame {
                        // Frames arrive in completion order; last write wins.
                        Some(frame) => buffer.publish(frame),
                        None => break,
                    }
                }
            }
            tracing::info!("swap task exited");
        })
    }

    /// Signal cancellation, wait (bounded) for both tasks, release the
    /// buffered frames. Safe to call twice and after a failed `start()`.
    pub async fn stop(&self) -> Result<(), CaptureError> {
        self.cancel.lock().unwrap().cancel();
        self.running.store(false, Ordering::SeqCst);

        let tasks = self.tasks.lock().unwrap().take();
        let timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
        let mut timed_out = false;
        if let Some((capture_task, swap_task)) = tasks {
            for mut task in [capture_task, swap_task] {
                match tokio::time::timeout(timeout, &mut task).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!("capture task join failed: {e}"),
                    Err(_) => {
                        task.abort();
                        timed_out = true;
                    }
                }
            }
        }

        // Force-release regardless of how the tasks exited.
        self.buffer.release();

        if timed_out {
            tracing::warn!("capture tasks did not exit within {timeout:?}");
            return Err(CaptureError::ShutdownTimeout(timeout));
        }
        tracing::info!("capture core stopped");
        Ok(())
    }

    /// Owned copy of the currently active slot; never blocks beyond the copy.
    pub fn latest_frame(&self) -> Result<Frame, CaptureError> {
        self.buffer.latest()
    }

    /// Poll the ready flag until the first capture lands or `timeout` passes.
    /// Used at startup so the first decision never races an empty buffer.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<(), CaptureError> {
        let deadline = tokio::time::Instant::now() + timeout;
        while !self.buffer.is_ready() {
            if tokio::time::Instant::now() >= deadline {
                return Err(CaptureError::ReadyTimeout(timeout));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.stats.snapshot()
    }
}

impl FrameAcquirer for DoubleBufferedCapturer {
    fn latest_frame(&self) -> Result<Frame, CaptureError> {
        DoubleBufferedCapturer::latest_frame(self)
    }
}

impl Drop for DoubleBufferedCapturer {
    fn drop(&mut self) {
        self.cancel.lock().unwrap().cancel();
    }
}
