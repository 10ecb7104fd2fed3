//! Classifier lifecycle: a shared handle that is either ready (one backend
//! behind a mutex, so at most one inference runs at a time) or unavailable
//! with the reason it failed to load.

use std::fmt::{self, Display};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbImage;
use schemars::JsonSchema;
use scope_common::process::run_with_deadline;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    algorithms::prepare_input,
    error::{OutlineError, Result},
    traits::{ClassifierInput, MaskClassifier},
    types::BinaryMask,
};

enum State {
    Ready(Mutex<Box<dyn MaskClassifier>>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClassifierStatus {
    Ready,
    Unavailable { reason: String },
}

/// Cloneable, reference-counted classifier handle
#[derive(Clone)]
pub struct ClassifierHandle {
    state: Arc<State>,
}

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("status", &self.status())
            .finish()
    }
}

impl ClassifierHandle {
    pub fn ready(classifier: impl MaskClassifier + 'static) -> Self {
        Self {
            state: Arc::new(State::Ready(Mutex::new(Box::new(classifier)))),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: Arc::new(State::Unavailable(reason.into())),
        }
    }

    /// Run a one-time fallible initialisation. A failure is recorded on the
    /// handle instead of being returned, so region growing keeps working.
    pub fn load<C, E, F>(init: F) -> Self
    where
        C: MaskClassifier + 'static,
        E: Display,
        F: FnOnce() -> std::result::Result<C, E>,
    {
        match init() {
            Ok(classifier) => {
                info!(classifier = classifier.name(), "classifier loaded");
                Self::ready(classifier)
            }
            Err(e) => {
                error!(error = %e, "classifier failed to load");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state, State::Ready(_))
    }

    pub fn status(&self) -> ClassifierStatus {
        match &*self.state {
            State::Ready(_) => ClassifierStatus::Ready,
            State::Unavailable(reason) => ClassifierStatus::Unavailable { reason: reason.clone() },
        }
    }

    /// Resize, normalise, infer, and binarize strictly above `threshold`.
    /// The returned mask is `size`x`size` regardless of the frame size.
    pub fn classify(&self, image: &RgbImage, size: u32, threshold: f32) -> Result<BinaryMask> {
        let classifier = match &*self.state {
            State::Ready(classifier) => classifier,
            State::Unavailable(reason) => return Err(OutlineError::ModelUnavailable(reason.clone())),
        };

        let input = prepare_input(image, size);
        let probs = {
            let mut guard = classifier
                .lock()
                .map_err(|_| OutlineError::Classifier("classifier lock poisoned".to_string()))?;
            debug!(classifier = guard.name(), size, "running inference");
            guard.infer(&input)?
        };

        let expected = size as usize * size as usize;
        if probs.len() != expected {
            return Err(OutlineError::Classifier(format!(
                "expected {} probabilities, got {}",
                expected,
                probs.len()
            )));
        }

        BinaryMask::from_probabilities(size, size, &probs, threshold)
    }
}

/// Classifier backed by a closure
pub struct FnClassifier<F> {
    name: String,
    func: F,
}

impl<F> FnClassifier<F>
where
    F: FnMut(&ClassifierInput) -> Result<Vec<f32>> + Send,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> MaskClassifier for FnClassifier<F>
where
    F: FnMut(&ClassifierInput) -> Result<Vec<f32>> + Send,
{
    fn infer(&mut self, input: &ClassifierInput) -> Result<Vec<f32>> {
        (self.func)(input)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Classifier running as an external process per call. The tensor is
/// written to stdin as little-endian `f32`; the probability map is read
/// back from stdout in the same encoding. The input size is passed in the
/// `SCOPE_INFERENCE_SIZE` environment variable.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandClassifier {
    /// Fails when `program` cannot be found, which callers feed into
    /// [`ClassifierHandle::load`]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Result<Self> {
        let program = program.into();
        let exists = std::path::Path::new(&program).exists()
            || Command::new("which")
                .arg(&program)
                .output()
                .map(|out| out.status.success())
                .unwrap_or(false);
        if !exists {
            return Err(OutlineError::ModelUnavailable(format!(
                "classifier executable not found: {}",
                program
            )));
        }
        Ok(Self { program, args, timeout })
    }
}

impl MaskClassifier for CommandClassifier {
    fn infer(&mut self, input: &ClassifierInput) -> Result<Vec<f32>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("SCOPE_INFERENCE_SIZE", input.size.to_string());

        let payload: Vec<u8> = input.tensor.iter().flat_map(|v| v.to_le_bytes()).collect();
        let output = run_with_deadline(cmd, Some(payload), self.timeout)?;

        if output.stdout.len() % 4 != 0 {
            return Err(OutlineError::Classifier(format!(
                "classifier output of {} bytes is not a whole number of f32 values",
                output.stdout.len()
            )));
        }

        Ok(output
            .stdout
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
