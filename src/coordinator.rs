use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::capture::{DoubleBufferedCapturer, ScreenSource, XcapScreenSource};
use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::{
    BoardStateExtractor, DecisionEngine, DecisionLoop, LuminanceGridExtractor, PredictionModel,
    UniformFallbackModel,
};

/// Wires the capture core, the decision engine and the decision loop
/// together and owns their lifecycle.
pub struct Coordinator {
    capturer: Arc<DoubleBufferedCapturer>,
    engine: Arc<DecisionEngine>,
    decision_loop: Arc<DecisionLoop>,
    loop_task: Mutex<Option<JoinHandle<()>>>,
    startup_timeout: Duration,
    shutdown_timeout: Duration,
}

impl Coordinator {
    /// Start the capture core, wait for the first frame, then start the
    /// decision loop. A capture core that never becomes ready is the one
    /// startup condition that aborts the pipeline.
    pub async fn start(&self) -> Result<(), AppError> {
        self.capturer.start()?;
        if let Err(e) = self.capturer.wait_for_ready(self.startup_timeout).await {
            self.capturer.stop().await.ok();
            return Err(e.into());
        }

        let decision_loop = Arc::clone(&self.decision_loop);
        let task = tokio::spawn(async move { decision_loop.run().await });
        *self.loop_task.lock().unwrap() = Some(task);
        tracing::info!("coordinator started");
        Ok(())
    }

    /// Cancel the loop, wait for it, stop the capture core. Idempotent.
    pub async fn stop(&self) -> Result<(), AppError> {
        self.decision_loop.cancel();
        let task = self.loop_task.lock().unwrap().take();
        if let Some(mut task) = task {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("decision loop task failed: {e}"),
                Err(_) => {
                    tracing::warn!("decision loop did not exit in time, aborting");
                    task.abort();
                }
            }
        }
        self.capturer.stop().await?;
        tracing::info!("coordinator stopped");
        Ok(())
    }

    pub fn capturer(&self) -> &DoubleBufferedCapturer {
        &self.capturer
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn decision_loop(&self) -> &DecisionLoop {
        &self.decision_loop
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.decision_loop.cancel();
        if let Some(task) = self.loop_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    source: Option<Arc<dyn ScreenSource>>,
    extractor: Option<Box<dyn BoardStateExtractor>>,
    model: Option<Box<dyn PredictionModel>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            source: None,
            extractor: None,
            model: None,
        }
    }

    // Replaces the default xcap screen source.
    pub fn source(mut self, source: Arc<dyn ScreenSource>) -> Self {
        self.source = Some(source);
        self
    }

    // Replaces the default luminance-grid extractor.
    pub fn extractor(mut self, extractor: Box<dyn BoardStateExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    // Replaces the uniform fallback model.
    pub fn model(mut self, model: Box<dyn PredictionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        let configuration = self.configuration;
        if configuration.capture.target_fps <= 0.0 || configuration.decision.target_fps <= 0.0 {
            return Err(AppError::Config(
                "target_fps must be positive".to_string(),
            ));
        }
        if configuration.board.rows == 0 || configuration.board.cols == 0 {
            return Err(AppError::Config(
                "board dimensions must be positive".to_string(),
            ));
        }

        let source = self.source.unwrap_or_else(|| {
            Arc::new(XcapScreenSource::new(configuration.capture.region))
        });
        let extractor = self.extractor.unwrap_or_else(|| {
            Box::new(LuminanceGridExtractor::new(
                configuration.board.rows,
                configuration.board.cols,
            ))
        });
        let model = self.model.unwrap_or_else(|| {
            tracing::warn!("no prediction model wired, using uniform fallback");
            Box::new(UniformFallbackModel::new(
                (configuration.board.rows * configuration.board.cols) as usize,
            ))
        });

        let capturer = Arc::new(DoubleBufferedCapturer::new(
            source,
            configuration.capture.clone(),
        ));
        let engine = Arc::new(DecisionEngine::new(
            Arc::clone(&capturer) as _,
            extractor,
            model,
            &configuration.decision,
        ));
        let decision_loop = Arc::new(DecisionLoop::new(
            Arc::clone(&engine),
            &configuration.decision,
        ));

        Ok(Coordinator {
            capturer,
            engine,
            decision_loop,
            loop_task: Mutex::new(None),
            startup_timeout: Duration::from_millis(configuration.decision.startup_timeout_ms),
            shutdown_timeout: Duration::from_millis(configuration.capture.shutdown_timeout_ms),
        })
    }
}
