//! Realtime output through CPAL.
//!
//! The stream callback pulls mono samples from a [`SharedMixer`], clips them
//! to `[-1, 1]` and duplicates them into every device channel. The control
//! side starts and stops sessions on the same mixer through [`AudioOutput`].

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info, warn};

use crate::buffer::SampleBuffer;
use crate::error::{SynthError, SynthResult};
use crate::graph::Generator;
use crate::mixer::{PlaybackMode, SessionId, SharedMixer};
use crate::output::AudioOutput;

/// Device selection. `None` fields fall back to the device defaults.
#[derive(Clone, Debug, Default)]
pub struct OutputOptions {
    pub device_name: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

/// Names of every output device on the default host.
pub fn list_output_devices() -> SynthResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(|e| SynthError::output(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn pick_device(opts: &OutputOptions) -> SynthResult<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = &opts.device_name {
        let devices = host.output_devices().map_err(|e| SynthError::output(e.to_string()))?;
        for d in devices {
            if d.name().map(|n| n == *name).unwrap_or(false) {
                return Ok(d);
            }
        }
        return Err(SynthError::output(format!("requested device not found: {name}")));
    }
    host.default_output_device()
        .ok_or_else(|| SynthError::output("no default output device"))
}

fn choose_config(device: &cpal::Device, opts: &OutputOptions) -> SynthResult<cpal::SupportedStreamConfig> {
    let out_err = |e: &dyn std::fmt::Display| SynthError::output(e.to_string());

    // If nothing requested, default is already concrete.
    if opts.sample_rate.is_none() && opts.channels.is_none() {
        return device.default_output_config().map_err(|e| out_err(&e));
    }

    // Score each supported range by distance from the request.
    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs().map_err(|e| out_err(&e))? {
        let sr_min = range.min_sample_rate().0;
        let sr_max = range.max_sample_rate().0;

        let ch_pen = opts.channels.map_or(0, |c| u64::from(range.channels().abs_diff(c)));
        let sr_pen = opts.sample_rate.map_or(0, |sr| {
            if (sr_min..=sr_max).contains(&sr) { 0 } else { u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))) }
        });

        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or_else(|| SynthError::output("no supported output configs"))?;
    let pick_sr = match opts.sample_rate {
        Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
        None => range.max_sample_rate(),
    };
    Ok(range.with_sample_rate(pick_sr))
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mixer: SharedMixer,
) -> SynthResult<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(cfg.channels).max(1);
    device
        .build_output_stream(
            cfg,
            move |output: &mut [T], _| {
                let mut m = mixer.lock();
                for frame in output.chunks_mut(channels) {
                    let s = m.next().clamp(-1.0, 1.0);
                    let v: T = T::from_sample(s);
                    for ch in frame.iter_mut() { *ch = v; }
                }
            },
            |e: cpal::StreamError| warn!("audio stream error: {e}"),
            None,
        )
        .map_err(|e| SynthError::output(e.to_string()))
}

/// A live device stream mixing sessions from a [`SharedMixer`].
///
/// Dropping it tears the stream down and silences every session.
pub struct CpalOutput {
    mixer: SharedMixer,
    device_name: String,
    config: cpal::StreamConfig,
    _stream: cpal::Stream,
}

impl CpalOutput {
    /// Open a device, start its stream and return an output ready for sessions.
    pub fn open(opts: &OutputOptions) -> SynthResult<Self> {
        let device = pick_device(opts)?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_owned());
        let sup_cfg = choose_config(&device, opts)?;
        let sample_format = sup_cfg.sample_format();
        let config: cpal::StreamConfig = sup_cfg.config();

        let mixer = SharedMixer::new(config.sample_rate.0)?;
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer.clone())?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer.clone())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer.clone())?,
            other => return Err(SynthError::output(format!("unsupported device sample format: {other:?}"))),
        };
        stream.play().map_err(|e| SynthError::output(e.to_string()))?;

        info!(device = %device_name, sample_rate = config.sample_rate.0, channels = config.channels, "audio stream started");
        Ok(Self { mixer, device_name, config, _stream: stream })
    }

    #[inline] pub fn device_name(&self) -> &str { &self.device_name }
    #[inline] pub fn channels(&self) -> u16 { self.config.channels }
    #[inline] pub fn mixer(&self) -> &SharedMixer { &self.mixer }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.mixer.lock().clear();
        debug!(device = %self.device_name, "audio stream closed");
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self, buffer: &SampleBuffer, mode: PlaybackMode, gain: f32) -> SessionId {
        self.mixer.start(buffer, mode, gain)
    }

    fn set_gain(&mut self, session: SessionId, gain: f32) {
        self.mixer.set_gain(session, gain);
    }

    fn stop(&mut self, session: SessionId) {
        self.mixer.stop(session);
    }
}
