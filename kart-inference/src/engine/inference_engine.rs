use anyhow::{bail, Context, Result};
use log::info;
use ort::session::Session;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::str::FromStr;

const INTRA_THREADS: usize = 4;

pub struct OnnxSession {
    pub(crate) session: Session,
    pub(crate) executor: ExecutionProvider,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionProvider {
    CPU,
    CUDA(i32),
    TensorRT(i32),
}

impl Display for ExecutionProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionProvider::CPU => write!(f, "cpu"),
            ExecutionProvider::CUDA(id) => write!(f, "cuda:{}", id),
            ExecutionProvider::TensorRT(id) => write!(f, "tensorrt:{}", id),
        }
    }
}

/// Parses `cpu`, `cuda`, `cuda:<device>`, `tensorrt` or `tensorrt:<device>`.
impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let (name, device) = match lowered.split_once(':') {
            Some((name, device)) => {
                let device = device
                    .parse::<i32>()
                    .with_context(|| format!("invalid device id in execution provider {s:?}"))?;
                (name.to_string(), device)
            }
            None => (lowered, 0),
        };

        match name.as_str() {
            "cpu" => Ok(ExecutionProvider::CPU),
            "cuda" => Ok(ExecutionProvider::CUDA(device)),
            "tensorrt" | "trt" => Ok(ExecutionProvider::TensorRT(device)),
            other => bail!("unknown execution provider {other:?}"),
        }
    }
}

impl Deref for OnnxSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for OnnxSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl OnnxSession {
    pub fn new(url: impl AsRef<Path>, executor: ExecutionProvider) -> Result<Self> {
        let url = url.as_ref();
        let session = Session::builder()?
            .with_intra_threads(INTRA_THREADS)?
            .with_execution_providers([match executor {
                ExecutionProvider::CUDA(id) => {
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()
                }
                ExecutionProvider::TensorRT(id) => {
                    ort::execution_providers::TensorRTExecutionProvider::default()
                        .with_device_id(id)
                        .build()
                        .error_on_failure()
                }
                ExecutionProvider::CPU => ort::execution_providers::CPUExecutionProvider::default()
                    .build()
                    .error_on_failure(),
            }])?
            .commit_from_file(url)
            .with_context(|| format!("failed to load model {}", url.display()))?;

        info!("Loaded {} on {}", url.display(), executor);
        Ok(OnnxSession { session, executor })
    }

    pub fn executor(&self) -> ExecutionProvider {
        self.executor
    }
}
