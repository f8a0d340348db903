use crate::model::Volume;
use anyhow::{Context, Result};
use rodio::source::EmptyCallback;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Flag raised by the audio thread when the current track runs out. The
/// main loop is the only consumer.
#[derive(Debug, Clone, Default)]
pub struct CompletionSignal {
    raised: Arc<AtomicBool>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

pub trait AudioDevice {
    fn play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self, paused: bool);
    /// Stops playback and raises the completion signal.
    fn halt(&mut self);
    /// Stops playback without raising the completion signal.
    fn stop(&mut self);
    fn set_position(&mut self, seconds: f64) -> Result<()>;
    fn set_volume(&mut self, volume: Volume);
    fn completion_signal(&self) -> CompletionSignal;
    fn current_track(&self) -> Option<&Path>;
    fn is_paused(&self) -> bool;
}

pub struct RodioDevice {
    stream: OutputStream,
    sink: Sink,
    current: Option<PathBuf>,
    volume: Volume,
    signal: CompletionSignal,
    generation: Arc<AtomicU64>,
}

impl RodioDevice {
    pub fn new() -> Result<Self> {
        let stream = open_output_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        Ok(Self {
            stream,
            sink,
            current: None,
            volume: Volume::new(crate::model::MAX_VOLUME),
            signal: CompletionSignal::new(),
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl AudioDevice for RodioDevice {
    fn play(&mut self, path: &Path) -> Result<()> {
        let generation = self.next_generation();
        self.sink.stop();
        self.signal.take();
        self.sink = Sink::connect_new(self.stream.mixer());

        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.sink.append(source);

        let signal = self.signal.clone();
        let current_generation = Arc::clone(&self.generation);
        self.sink.append(EmptyCallback::new(Box::new(move || {
            if current_generation.load(Ordering::SeqCst) == generation {
                signal.raise();
            }
        })));

        self.sink.set_volume(self.volume.as_gain());
        self.current = Some(path.to_path_buf());
        debug!(path = %path.display(), "device playing");
        Ok(())
    }

    fn pause(&mut self, paused: bool) {
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
    }

    fn halt(&mut self) {
        self.stop();
        self.signal.raise();
    }

    fn stop(&mut self) {
        self.next_generation();
        self.sink.stop();
        self.current = None;
    }

    fn set_position(&mut self, seconds: f64) -> Result<()> {
        if self.current.is_none() {
            anyhow::bail!("no active track");
        }
        self.sink
            .try_seek(Duration::from_secs_f64(seconds.max(0.0)))
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))
    }

    fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.sink.set_volume(volume.as_gain());
    }

    fn completion_signal(&self) -> CompletionSignal {
        self.signal.clone()
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }
}

fn open_output_stream() -> Result<OutputStream> {
    let mut stream = with_silenced_stderr(|| {
        OutputStreamBuilder::from_default_device()
            .context("failed to open default system output stream")?
            .with_error_callback(|_| {})
            .open_stream_or_fallback()
            .context("failed to start default output stream")
    })?;
    stream.log_on_drop(false);
    Ok(stream)
}

// ALSA prints device probing chatter to stderr, over the terminal UI.
#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

#[derive(Debug, Default)]
pub struct NullDevice {
    current: Option<PathBuf>,
    paused: bool,
    volume: Option<Volume>,
    position: f64,
    signal: CompletionSignal,
    fail_playback: bool,
    fail_seek: bool,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_playback(mut self) -> Self {
        self.fail_playback = true;
        self
    }

    pub fn with_failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn volume(&self) -> Option<Volume> {
        self.volume
    }
}

impl AudioDevice for NullDevice {
    fn play(&mut self, path: &Path) -> Result<()> {
        if self.fail_playback {
            anyhow::bail!("failed to load music '{}'", path.display());
        }
        self.current = Some(path.to_path_buf());
        self.paused = false;
        self.position = 0.0;
        Ok(())
    }

    fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn halt(&mut self) {
        self.stop();
        self.signal.raise();
    }

    fn stop(&mut self) {
        self.current = None;
        self.paused = false;
        self.position = 0.0;
    }

    fn set_position(&mut self, seconds: f64) -> Result<()> {
        if self.current.is_none() {
            anyhow::bail!("no active track");
        }
        if self.fail_seek {
            anyhow::bail!("seeking is not supported for this track");
        }
        self.position = seconds.max(0.0);
        Ok(())
    }

    fn set_volume(&mut self, volume: Volume) {
        self.volume = Some(volume);
    }

    fn completion_signal(&self) -> CompletionSignal {
        self.signal.clone()
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
