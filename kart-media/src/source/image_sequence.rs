use crate::source::FrameSource;
use crate::Frame;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Replays the image files of a directory, in file name order, as if they came from a camera.
#[derive(Debug)]
pub struct ImageSequence {
    frames: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
}

impl ImageSequence {
    pub fn open(folder: impl AsRef<Path>, looping: bool) -> Result<Self> {
        let folder = folder.as_ref();
        let mut frames = std::fs::read_dir(folder)
            .with_context(|| format!("cannot list frame directory {}", folder.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && is_supported(path))
            .collect::<Vec<_>>();
        frames.sort();

        if frames.is_empty() {
            bail!("no png/jpeg frames in {}", folder.display());
        }
        info!("Replaying {} frames from {}", frames.len(), folder.display());

        Ok(Self {
            frames,
            cursor: 0,
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

impl FrameSource for ImageSequence {
    fn capture(&mut self) -> Result<Frame> {
        if self.cursor >= self.frames.len() {
            if !self.looping {
                bail!("frame sequence exhausted after {} frames", self.frames.len());
            }
            self.cursor = 0;
        }

        let path = &self.frames[self.cursor];
        self.cursor += 1;
        debug!("Reading frame {}", path.display());

        Frame::open_file(path)
    }

    fn release(&mut self) {
        self.cursor = self.frames.len();
        self.looping = false;
    }
}
