use std::io::Write;

use crate::errors::DashboardError;

/// Sound played when a new notification becomes visible.
pub trait AudibleCue {
    fn play(&mut self) -> Result<(), DashboardError>;
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudibleCue for TerminalBell {
    fn play(&mut self) -> Result<(), DashboardError> {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| DashboardError::AudioCue {
                reason: e.to_string(),
            })
    }
}

/// Used when the operator disabled notification sounds.
#[derive(Debug, Default)]
pub struct Silent;

impl AudibleCue for Silent {
    fn play(&mut self) -> Result<(), DashboardError> {
        Ok(())
    }
}

#[cfg(feature = "sound")]
pub use tone::Tone;

#[cfg(feature = "sound")]
mod tone {
    use std::{sync::mpsc, thread, time::Duration};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SizedSample};
    use log::{error, warn};

    use super::{AudibleCue, TerminalBell};
    use crate::errors::DashboardError;

    const FREQUENCY_HZ: f32 = 800.;
    const DURATION_S: f32 = 0.5;
    const START_GAIN: f32 = 0.3;
    const END_GAIN: f32 = 0.01;

    /// A short sine "ding" on the default output device. Rings the terminal bell instead when no
    /// output stream can be opened.
    #[derive(Debug, Default)]
    pub struct Tone {
        fallback: TerminalBell,
    }

    impl AudibleCue for Tone {
        fn play(&mut self) -> Result<(), DashboardError> {
            let (started_tx, started_rx) = mpsc::channel();
            // the stream has to outlive this call, so it is owned by a short-lived thread
            thread::spawn(move || match start_stream() {
                Ok(stream) => {
                    let _ = started_tx.send(Ok(()));
                    thread::sleep(Duration::from_secs_f32(DURATION_S + 0.1));
                    drop(stream);
                }
                Err(e) => {
                    let _ = started_tx.send(Err(e));
                }
            });
            let started = started_rx
                .recv()
                .map_err(audio_error)
                .and_then(|started| started);
            if let Err(e) = started {
                warn!("{}, ringing the terminal bell", e);
                return self.fallback.play();
            }
            Ok(())
        }
    }

    /// Sample generator for the decaying sine, interleaved over `channels`.
    pub(super) struct ToneWriter {
        sample_rate: f32,
        channels: usize,
        sample_clock: f32,
    }

    impl ToneWriter {
        pub(super) fn new(sample_rate: f32, channels: usize) -> Self {
            Self {
                sample_rate,
                channels: channels.max(1),
                sample_clock: 0.,
            }
        }

        fn next_value(&mut self) -> f32 {
            let t = self.sample_clock / self.sample_rate;
            self.sample_clock += 1.;
            if t < DURATION_S {
                let gain = START_GAIN * (END_GAIN / START_GAIN).powf(t / DURATION_S);
                (t * FREQUENCY_HZ * std::f32::consts::TAU).sin() * gain
            } else {
                0.
            }
        }

        pub(super) fn write<T: Sample + FromSample<f32>>(&mut self, data: &mut [T]) {
            for frame in data.chunks_mut(self.channels) {
                let value = T::from_sample(self.next_value());
                for sample in frame.iter_mut() {
                    *sample = value;
                }
            }
        }
    }

    fn audio_error(e: impl ToString) -> DashboardError {
        DashboardError::AudioCue {
            reason: e.to_string(),
        }
    }

    fn start_stream() -> Result<cpal::Stream, DashboardError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| audio_error("no default output device"))?;
        let supported = device.default_output_config().map_err(audio_error)?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let stream = match sample_format {
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config)?,
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config)?,
            other => {
                return Err(audio_error(format!("unsupported sample format {:?}", other)));
            }
        };
        stream.play().map_err(audio_error)?;
        Ok(stream)
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream, DashboardError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let mut writer = ToneWriter::new(config.sample_rate.0 as f32, config.channels as usize);
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| writer.write(data),
                |e| error!("Notification sound stream error: {}", e),
                None,
            )
            .map_err(audio_error)
    }

}
