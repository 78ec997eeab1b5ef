use std::path::Path;

pub trait ImageProcessor {
    /// Writes a thumbnail that fits into `width` x `height`.
    fn thumbnail(&self, src: &Path, dst: &Path, width: u32, height: u32) -> anyhow::Result<()>;
}
