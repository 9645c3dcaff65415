use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEncoder {
    /// `ffmpeg` on PATH, fed raw RGBA frames on stdin.
    Ffmpeg,
    /// Numbered PNG files in a `<stem>_frames` directory.
    PngSequence,
}

impl VideoEncoder {
    /// Preference order when opening a recorder.
    pub const FALLBACK_ORDER: [VideoEncoder; 2] = [Self::Ffmpeg, Self::PngSequence];

    /// The encoder to switch to when this one stops mid-recording.
    pub fn fallback(self) -> Option<VideoEncoder> {
        let pos = Self::FALLBACK_ORDER.iter().position(|e| *e == self)?;
        Self::FALLBACK_ORDER.get(pos + 1).copied()
    }
}

trait FrameSink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn output(&self) -> &Path;

    /// Whether the backing process is gone, so further writes cannot land.
    fn has_exited(&mut self) -> bool {
        false
    }
}

fn open_sink(
    encoder: VideoEncoder,
    path: &Path,
    width: u32,
    height: u32,
    fps: u32,
) -> Result<Box<dyn FrameSink>> {
    Ok(match encoder {
        VideoEncoder::Ffmpeg => Box::new(FfmpegSink::spawn(path, width, height, fps)?),
        VideoEncoder::PngSequence => Box::new(PngSequenceSink::create(path, width, height)?),
    })
}

struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    path: PathBuf,
}

impl FfmpegSink {
    fn spawn(path: &Path, width: u32, height: u32, fps: u32) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"])
            .arg("-s")
            .arg(format!("{}x{}", width, height))
            .arg("-r")
            .arg(fps.to_string())
            .args(["-i", "-", "-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn ffmpeg")?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdin unavailable"))?;
        Ok(Self {
            child,
            stdin: Some(stdin),
            path: path.to_path_buf(),
        })
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("ffmpeg already closed"))?;
        stdin.write_all(rgba).context("ffmpeg pipe write failed")
    }

    fn close(&mut self) -> Result<()> {
        // Closing stdin signals end of stream.
        drop(self.stdin.take());
        let status = self.child.wait().context("failed waiting for ffmpeg")?;
        if !status.success() {
            bail!("ffmpeg exited with {}", status);
        }
        Ok(())
    }

    fn output(&self) -> &Path {
        &self.path
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

struct PngSequenceSink {
    dir: PathBuf,
    width: u32,
    height: u32,
    index: usize,
}

impl PngSequenceSink {
    fn create(path: &Path, width: u32, height: u32) -> Result<Self> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let dir = path.with_file_name(format!("{}_frames", stem));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self {
            dir,
            width,
            height,
            index: 0,
        })
    }
}

impl FrameSink for PngSequenceSink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<()> {
        self.index += 1;
        let file = self.dir.join(format!("frame_{:06}.png", self.index));
        image::save_buffer(&file, rgba, self.width, self.height, image::ColorType::Rgba8)
            .with_context(|| format!("failed to write {}", file.display()))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn output(&self) -> &Path {
        &self.dir
    }
}

/// Best-effort per-frame capture. Write failures are counted, never propagated.
///
/// If ffmpeg dies mid-recording the remaining frames go to a PNG sequence next
/// to the requested path.
pub struct VideoRecorder {
    sink: Box<dyn FrameSink>,
    encoder: VideoEncoder,
    path: PathBuf,
    width: u32,
    height: u32,
    fps: u32,
    frames: usize,
    failures: usize,
    closed: bool,
}

impl VideoRecorder {
    /// Opens the first encoder that works, or `None` if recording is unavailable.
    pub fn open(path: &Path, width: u32, height: u32, fps: u32) -> Option<Self> {
        for encoder in VideoEncoder::FALLBACK_ORDER {
            match Self::open_with(encoder, path, width, height, fps) {
                Ok(rec) => {
                    println!(
                        "Recording video to {} at {} fps ({:?})",
                        rec.sink.output().display(),
                        fps,
                        encoder
                    );
                    return Some(rec);
                }
                Err(e) => log::warn!("{:?} video output unavailable: {:#}", encoder, e),
            }
        }
        println!("Video recording unavailable");
        None
    }

    pub fn open_with(
        encoder: VideoEncoder,
        path: &Path,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let sink = open_sink(encoder, path, width, height, fps)?;
        Ok(Self::with_sink(sink, encoder, path, width, height, fps))
    }

    fn with_sink(
        sink: Box<dyn FrameSink>,
        encoder: VideoEncoder,
        path: &Path,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Self {
        Self {
            sink,
            encoder,
            path: path.to_path_buf(),
            width,
            height,
            fps,
            frames: 0,
            failures: 0,
            closed: false,
        }
    }

    pub fn encoder(&self) -> VideoEncoder {
        self.encoder
    }

    pub fn output(&self) -> &Path {
        self.sink.output()
    }

    /// Captures one RGBA frame of the recorder's size; mismatched or failed frames are skipped.
    pub fn capture(&mut self, rgba: &[u8]) {
        let expected = self.width as usize * self.height as usize * 4;
        if rgba.len() != expected {
            self.skip(anyhow!("frame is {} bytes, expected {}", rgba.len(), expected));
            return;
        }

        if self.sink.has_exited() {
            self.switch_encoder(&anyhow!("{:?} exited early", self.encoder));
        }
        let result = match self.sink.write_frame(rgba) {
            Ok(()) => Ok(()),
            Err(e) if self.switch_encoder(&e) => self.sink.write_frame(rgba),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => self.frames += 1,
            Err(e) => self.skip(e),
        }
    }

    fn skip(&mut self, reason: anyhow::Error) {
        if self.failures == 0 {
            log::debug!("Skipping video frame: {:#}", reason);
        }
        self.failures += 1;
    }

    /// Replaces a failed sink with the next encoder in the fallback order.
    fn switch_encoder(&mut self, reason: &anyhow::Error) -> bool {
        let Some(next) = self.encoder.fallback() else {
            return false;
        };
        match open_sink(next, &self.path, self.width, self.height, self.fps) {
            Ok(sink) => {
                let mut old = std::mem::replace(&mut self.sink, sink);
                if let Err(e) = old.close() {
                    log::debug!("Closing {:?} output: {:#}", self.encoder, e);
                }
                log::warn!(
                    "{:?} video output failed ({:#}), continuing as {:?} in {}",
                    self.encoder,
                    reason,
                    next,
                    self.sink.output().display()
                );
                self.encoder = next;
                true
            }
            Err(e) => {
                log::warn!("{:?} video output unavailable: {:#}", next, e);
                false
            }
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Finalizes the output and returns the number of frames written.
    pub fn finish(mut self) -> usize {
        self.close();
        self.frames
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.sink.close() {
            Ok(()) => println!(
                "Video saved: {} ({} frames)",
                self.sink.output().display(),
                self.frames
            ),
            Err(e) => println!("Error finalizing video: {:#}", e),
        }
        if self.failures > 0 {
            log::warn!("{} video frames could not be captured", self.failures);
        }
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stands in for an ffmpeg process that died after the recorder opened.
    struct DeadEncoderSink {
        path: PathBuf,
        exited: bool,
    }

    impl FrameSink for DeadEncoderSink {
        fn write_frame(&mut self, _rgba: &[u8]) -> Result<()> {
            bail!("broken pipe")
        }

        fn close(&mut self) -> Result<()> {
            bail!("encoder exited with status 1")
        }

        fn output(&self) -> &Path {
            &self.path
        }

        fn has_exited(&mut self) -> bool {
            self.exited
        }
    }

    fn png_recorder(path: &Path) -> VideoRecorder {
        VideoRecorder::open_with(VideoEncoder::PngSequence, path, 4, 2, 30).unwrap()
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(VideoEncoder::Ffmpeg.fallback(), Some(VideoEncoder::PngSequence));
        assert_eq!(VideoEncoder::PngSequence.fallback(), None);
    }

    #[test]
    fn test_dead_ffmpeg_switches_to_png_frames() {
        for exited in [true, false] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("run.mp4");
            let sink = Box::new(DeadEncoderSink {
                path: path.clone(),
                exited,
            });
            let mut rec = VideoRecorder::with_sink(sink, VideoEncoder::Ffmpeg, &path, 4, 2, 30);

            let frame = vec![255u8; 4 * 2 * 4];
            rec.capture(&frame);
            rec.capture(&frame);
            assert_eq!(rec.encoder(), VideoEncoder::PngSequence);
            assert_eq!(rec.failures(), 0);
            assert_eq!(rec.finish(), 2);

            let frames = dir.path().join("run_frames");
            assert!(frames.join("frame_000001.png").exists());
            assert!(frames.join("frame_000002.png").exists());
        }
    }

    #[test]
    fn test_failed_png_write_has_no_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.mp4");
        let sink = Box::new(DeadEncoderSink {
            path: path.clone(),
            exited: false,
        });
        let mut rec = VideoRecorder::with_sink(sink, VideoEncoder::PngSequence, &path, 4, 2, 30);
        rec.capture(&[0u8; 4 * 2 * 4]);
        assert_eq!(rec.frames(), 0);
        assert_eq!(rec.failures(), 1);
        assert_eq!(rec.encoder(), VideoEncoder::PngSequence);
    }

    #[test]
    fn test_png_sequence_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.mp4");
        let mut rec = png_recorder(&path);
        let frame = vec![255u8; 4 * 2 * 4];
        rec.capture(&frame);
        rec.capture(&frame);
        let out = rec.output().to_path_buf();
        assert_eq!(rec.finish(), 2);

        assert_eq!(out, dir.path().join("run_frames"));
        assert!(out.join("frame_000001.png").exists());
        assert!(out.join("frame_000002.png").exists());
    }

    #[test]
    fn test_wrong_size_frame_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.mp4");
        let mut rec = png_recorder(&path);
        rec.capture(&[0u8; 3]);
        assert_eq!(rec.frames(), 0);
        assert_eq!(rec.failures(), 1);
    }
}
