//! Application Coordinator
//!
//! Drives the stroke recorder from pointer events and hands every finished
//! stroke to a background worker that owns the digit model. Outcomes come
//! back over a channel and are applied on the UI thread.

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::canvas::{CanvasSize, Point, SketchEvent, StrokePath, StrokeRecorder};
use crate::shared::{ClassifyOutcome, ClassifyRequest, DisplayResult, DisplayState, Phase, ToWorker};
use crate::vision::{run_pipeline, DigitModel, PreprocessConfig};

/// Called by the worker after it posts an outcome, e.g. to wake the UI
pub type RepaintNotifier = Box<dyn Fn() + Send>;

/// Presentation controller for the sketch-and-classify loop
pub struct DigitController {
    /// Current stroke
    recorder: StrokeRecorder,
    /// What the UI shows
    display: DisplayState,
    /// Drawing surface size
    canvas: CanvasSize,
    /// Pixels per canvas unit for rasterization
    scale: f32,
    /// Channel to the worker
    to_worker: Sender<ToWorker>,
    /// Channel from the worker
    from_worker: Receiver<ClassifyOutcome>,
    /// Handle to the worker thread
    worker_handle: Option<JoinHandle<()>>,
    /// Id for the next request
    next_id: u64,
    /// Request whose outcome we are waiting for
    pending: Option<u64>,
}

impl DigitController {
    /// Create a controller and start its worker
    pub fn new(model: Box<dyn DigitModel>, config: PreprocessConfig, canvas: CanvasSize) -> Result<Self> {
        Self::with_notifier(model, config, canvas, None)
    }

    /// Create a controller whose worker calls `notifier` after every outcome
    pub fn with_notifier(
        model: Box<dyn DigitModel>,
        config: PreprocessConfig,
        canvas: CanvasSize,
        notifier: Option<RepaintNotifier>,
    ) -> Result<Self> {
        let (to_worker, requests) = unbounded();
        let (outcomes, from_worker) = unbounded();

        let handle = std::thread::Builder::new()
            .name("classifier".to_string())
            .spawn(move || {
                info!("Classifier thread starting ({})", model.name());
                worker_loop(model, config, requests, outcomes, notifier);
                info!("Classifier thread exiting");
            })
            .context("Failed to spawn classifier thread")?;

        Ok(Self {
            recorder: StrokeRecorder::new(),
            display: DisplayState::default(),
            canvas,
            scale: 1.0,
            to_worker,
            from_worker,
            worker_handle: Some(handle),
            next_id: 1,
            pending: None,
        })
    }

    /// Update the drawing surface geometry used for the next stroke
    pub fn set_canvas(&mut self, canvas: CanvasSize, scale: f32) {
        if canvas != self.canvas || scale != self.scale {
            debug!("Canvas resized to {}x{} at scale {}", canvas.width, canvas.height, scale);
        }
        self.canvas = canvas;
        self.scale = scale;
    }

    /// Forward one drawing surface event
    pub fn handle(&mut self, event: SketchEvent) {
        match event {
            SketchEvent::Down(point) => self.pointer_down(point),
            SketchEvent::Drag(point) => self.pointer_drag(point),
            SketchEvent::Up => self.pointer_up(),
        }
    }

    /// Start a new stroke; always returns to drawing
    pub fn pointer_down(&mut self, point: Point) {
        self.recorder.begin(point);
        self.display.phase = Phase::Drawing;
    }

    /// Extend the current stroke
    pub fn pointer_drag(&mut self, point: Point) {
        if !self.recorder.is_active() {
            self.pointer_down(point);
            return;
        }
        self.recorder.extend(point);
    }

    /// Finish the stroke and submit it for classification
    pub fn pointer_up(&mut self) {
        let Some(path) = self.recorder.end() else {
            return;
        };

        let id = self.next_id;
        self.next_id += 1;

        let request = ClassifyRequest {
            id,
            path,
            canvas: self.canvas,
            scale: self.scale,
        };

        debug!("Submitting stroke {} ({} points)", id, request.path.len());

        if self.to_worker.send(ToWorker::Classify(request)).is_err() {
            error!("Classifier thread is gone; cannot classify stroke {}", id);
            self.pending = None;
            self.display.set_result(DisplayResult::error_message("classifier stopped"));
            self.display.phase = Phase::Displaying;
            return;
        }

        self.pending = Some(id);
        self.display.phase = Phase::Classifying;
    }

    /// Replace the preprocessing configuration for later strokes
    pub fn update_preprocess(&self, config: PreprocessConfig) {
        if self.to_worker.send(ToWorker::UpdateConfig(config)).is_err() {
            warn!("Classifier thread is gone; dropping config update {:?}", config);
        }
    }

    /// Apply any outcomes the worker has posted. Returns true if the
    /// display changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.from_worker.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// Block until the pending stroke has a result or `timeout` elapses.
    /// Returns true if nothing is pending afterwards.
    pub fn wait_for_result(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.from_worker.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.apply(outcome);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    self.pending = None;
                    self.display.set_result(DisplayResult::error_message("classifier stopped"));
                    self.display.phase = Phase::Displaying;
                }
            }
        }
        true
    }

    fn apply(&mut self, outcome: ClassifyOutcome) -> bool {
        if self.pending != Some(outcome.id) {
            debug!("Dropping superseded outcome for stroke {}", outcome.id);
            return false;
        }
        self.pending = None;

        let result = match &outcome.result {
            Ok(classification) => DisplayResult::success(classification),
            Err(e) => DisplayResult::failure(e),
        };
        self.display.set_result(result);

        // A new stroke may already be in progress
        if self.display.phase == Phase::Classifying {
            self.display.phase = Phase::Displaying;
        }
        true
    }

    /// Current display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn phase(&self) -> Phase {
        self.display.phase
    }

    /// Stroke to draw on the canvas
    pub fn path(&self) -> &StrokePath {
        self.recorder.path()
    }

    /// True while a stroke is waiting for its result
    pub fn is_classifying(&self) -> bool {
        self.pending.is_some()
    }

    /// Check if the worker thread is alive
    pub fn is_worker_running(&self) -> bool {
        self.worker_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for DigitController {
    fn drop(&mut self) {
        let _ = self.to_worker.send(ToWorker::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Receive requests until shutdown, one inference per stroke
fn worker_loop(
    mut model: Box<dyn DigitModel>,
    mut config: PreprocessConfig,
    requests: Receiver<ToWorker>,
    outcomes: Sender<ClassifyOutcome>,
    notifier: Option<RepaintNotifier>,
) {
    for message in requests.iter() {
        match message {
            ToWorker::Classify(request) => {
                let result = run_pipeline(
                    &request.path,
                    request.canvas,
                    request.scale,
                    &config,
                    model.as_mut(),
                );

                match &result {
                    Ok(c) => info!(
                        "Stroke {} classified as {} in {} ms",
                        request.id, c.label, c.processing_time_ms
                    ),
                    Err(e) => warn!("Stroke {} failed at {} stage: {}", request.id, e.stage(), e),
                }

                if outcomes.send(ClassifyOutcome { id: request.id, result }).is_err() {
                    break;
                }
                if let Some(notify) = &notifier {
                    notify();
                }
            }
            ToWorker::UpdateConfig(new_config) => {
                debug!("Preprocess config updated: {:?}", new_config);
                config = new_config;
            }
            ToWorker::Shutdown => break,
        }
    }
}
