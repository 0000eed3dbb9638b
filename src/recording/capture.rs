//! Microphone capture capability.
//!
//! Defines the capture interface consumed by the recording controller and its
//! cpal-backed implementation. Audio is captured from the configured input
//! device at its native sample rate, downmixed to mono, and delivered to the
//! observer as ordered binary fragments whose concatenation is a complete WAV
//! object.
//!
//! Ordering contract: every fragment is delivered, in capture order, before
//! `on_finalized` fires. Payload assembly therefore always sees the complete
//! fragment set for the session.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Upper bound on a single delivered fragment.
const FRAGMENT_BYTES: usize = 64 * 1024;

/// Receives capture output from a [`CaptureSource`].
///
/// `on_fragment` is invoked once per fragment in capture order;
/// `on_finalized` fires exactly once, after the last fragment.
pub trait CaptureObserver {
    fn on_fragment(&mut self, data: Vec<u8>);
    fn on_finalized(&mut self);
}

/// An exclusive audio-input capture device.
///
/// `start` acquires the device and begins capturing; `stop` finalizes the
/// capture and delivers all pending fragments to the observer, followed by
/// the finalize notification. Dropping the source releases the device.
pub trait CaptureSource {
    /// Acquires the input device and begins capturing.
    ///
    /// # Errors
    /// - If the device is unavailable or access is denied
    /// - If the audio stream cannot be configured or started
    fn start(&mut self) -> Result<()>;

    /// Finalizes the capture, delivering all fragments then `on_finalized`.
    fn stop(&mut self, observer: &mut dyn CaptureObserver) -> Result<()>;
}

/// cpal-backed microphone capture.
///
/// Captures i16 PCM from a specified or default input device, averaging
/// multi-channel audio down to mono. Samples accumulate on the audio thread;
/// at stop they are encoded as an in-memory WAV and handed to the observer
/// in bounded fragments.
pub struct MicCapture {
    /// Device name, numeric index, or "default"
    device_name: String,
    /// Actual capture sample rate, updated from the device on start
    sample_rate: u32,
    /// Recorded mono i16 samples
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active input stream, held for the duration of the capture
    stream: Option<cpal::Stream>,
}

impl MicCapture {
    /// Creates a capture source for the given device and requested rate.
    ///
    /// The actual rate may differ based on device capabilities; the WAV
    /// fragments always carry the device's real rate.
    pub fn new(device_name: String, requested_sample_rate: u32) -> Self {
        Self {
            device_name,
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        }
    }

    fn open_device(&self) -> Result<cpal::Device> {
        suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })
    }

    fn downmix_to_mono(data: &[i16], samples_arc: &Arc<Mutex<Vec<i16>>>, num_channels: usize) {
        let mut samples = samples_arc.lock().unwrap();

        match num_channels {
            1 => {
                samples.extend_from_slice(data);
            }
            2 => {
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    samples.push(((left + right) / 2) as i16);
                }
            }
            _ => {
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    samples.push((sum / num_channels as i32) as i16);
                }
            }
        }
    }
}

impl CaptureSource for MicCapture {
    fn start(&mut self) -> Result<()> {
        let device = self.open_device()?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }
        self.sample_rate = device_sample_rate;

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            num_channels
        );

        self.samples.lock().unwrap().clear();
        let samples_arc = Arc::clone(&self.samples);

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                Self::downmix_to_mono(data, &samples_arc, num_channels);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    fn stop(&mut self, observer: &mut dyn CaptureObserver) -> Result<()> {
        // Dropping the stream ends delivery into the sample buffer, so the
        // drain below sees every captured sample.
        self.stream = None;

        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Capture finalized: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        let wav = encode_wav(&samples, self.sample_rate)?;
        for fragment in wav.chunks(FRAGMENT_BYTES) {
            observer.on_fragment(fragment.to_vec());
        }
        observer.on_finalized();

        Ok(())
    }
}

/// Encodes mono i16 samples as a complete in-memory WAV object.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        } else {
            return Err(anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            ));
        }
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'vmemo list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wav_round_trips_through_hound() {
        let samples: Vec<i16> = vec![0, 100, -100, i16::MAX, i16::MIN];
        let bytes = encode_wav(&samples, 16000).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn encode_wav_handles_empty_capture() {
        let bytes = encode_wav(&[], 44100).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn downmix_averages_stereo_pairs() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        MicCapture::downmix_to_mono(&[100, 200, -50, 50], &samples, 2);
        assert_eq!(*samples.lock().unwrap(), vec![150, 0]);
    }

    #[test]
    fn downmix_passes_mono_through() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        MicCapture::downmix_to_mono(&[1, 2, 3], &samples, 1);
        assert_eq!(*samples.lock().unwrap(), vec![1, 2, 3]);
    }
}
