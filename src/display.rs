//! Display boundary and the headless file backend.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::DynamicImage;
use tokio::runtime::RuntimeFlavor;

use crate::config::{DisplayBackend, DisplaySettings};
use crate::error::{FrameError, Result};

/// Something that shows one image at a time.
pub trait Display {
    /// Replace what is on screen.
    fn update(&mut self, image: &DynamicImage) -> Result<()>;

    /// Release hardware or files on shutdown.
    fn cleanup(&mut self);
}

/// Run a synchronous, possibly slow display operation from async code.
///
/// On a multi-threaded runtime the worker is handed off with
/// `block_in_place`; elsewhere `f` simply runs inline.
pub fn blocking_section<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Open the configured backend. Failure here is fatal to the process.
pub fn open(settings: &DisplaySettings) -> Result<Box<dyn Display>> {
    tracing::debug!(
        show_details = settings.show_details,
        show_artist_and_album = settings.show_artist_and_album,
        show_play_state = settings.show_play_state,
        "Display options"
    );
    match settings.backend {
        DisplayBackend::File => Ok(Box::new(FileDisplay::new(settings)?)),
        #[cfg(feature = "sdl")]
        DisplayBackend::Sdl => Ok(Box::new(crate::renderer::SdlDisplay::new(settings)?)),
        #[cfg(not(feature = "sdl"))]
        DisplayBackend::Sdl => Err(FrameError::DisplaySetup(
            "sdl backend requested but this build lacks the `sdl` feature".into(),
        )),
    }
}

/// Writes each frame to a PNG for an external viewer or framebuffer tool.
///
/// Frames are scaled to fit the panel and swapped in with a rename, so readers
/// never see a partial file.
pub struct FileDisplay {
    output_path: PathBuf,
    caption_path: Option<(PathBuf, String)>,
    width: u32,
    height: u32,
}

impl FileDisplay {
    pub fn new(settings: &DisplaySettings) -> Result<Self> {
        let dir = match settings.output_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        if !dir.is_dir() {
            return Err(FrameError::DisplaySetup(format!(
                "output directory {} does not exist",
                dir.display()
            )));
        }

        let caption_path = settings
            .overlay_text
            .as_ref()
            .map(|text| (settings.output_path.with_extension("txt"), text.clone()));

        tracing::info!(
            "File display writing {}x{} frames to {}",
            settings.width,
            settings.height,
            settings.output_path.display()
        );
        Ok(Self {
            output_path: settings.output_path.clone(),
            caption_path,
            width: settings.width,
            height: settings.height,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.output_path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl Display for FileDisplay {
    fn update(&mut self, image: &DynamicImage) -> Result<()> {
        let frame = image.resize(self.width, self.height, FilterType::Lanczos3);
        let tmp = self.temp_path();
        frame
            .save_with_format(&tmp, image::ImageFormat::Png)
            .map_err(|e| FrameError::Display(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.output_path)
            .map_err(|e| FrameError::Display(format!("swap {}: {}", self.output_path.display(), e)))?;

        if let Some((path, text)) = &self.caption_path {
            fs::write(path, text)
                .map_err(|e| FrameError::Display(format!("write {}: {}", path.display(), e)))?;
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        tracing::debug!("Shutting down file display");
        if let Some((path, _)) = &self.caption_path {
            let _ = fs::remove_file(path);
        }
    }
}
