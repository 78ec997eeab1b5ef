use adorable_core::gateways::image::ImageProcessor;
use anyhow::{bail, Result};
use std::{ffi::OsString, path::Path, process::Command};

/// Creates thumbnails with ImageMagick's `convert`.
#[derive(Debug, Clone)]
pub struct ImageMagick {
    program: String,
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self {
            program: "convert".to_owned(),
        }
    }
}

impl ImageMagick {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn thumbnail_args(src: &Path, dst: &Path, width: u32, height: u32) -> Vec<OsString> {
    vec![
        src.into(),
        "-auto-orient".into(),
        "-thumbnail".into(),
        format!("{width}x{height}>").into(),
        dst.into(),
    ]
}

impl ImageProcessor for ImageMagick {
    fn thumbnail(&self, src: &Path, dst: &Path, width: u32, height: u32) -> Result<()> {
        let output = Command::new(&self.program)
            .args(thumbnail_args(src, dst, width, height))
            .output()?;
        if !output.status.success() {
            bail!(
                "Failed to create thumbnail of {}: {}",
                src.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        log::debug!("Created {width}x{height} thumbnail {}", dst.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_thumbnail_arguments() {
        let args = thumbnail_args(Path::new("in.jpg"), Path::new("out.jpg"), 200, 100);
        assert_eq!(
            args,
            ["in.jpg", "-auto-orient", "-thumbnail", "200x100>", "out.jpg"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn missing_program_fails() {
        let im = ImageMagick::new("adorable-no-such-program");
        assert!(im
            .thumbnail(Path::new("a.jpg"), Path::new("b.jpg"), 10, 10)
            .is_err());
    }
}
