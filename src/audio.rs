//! Sound effects synthesized with rodio

use blockfall::sound::{Sound, SoundPlayer};
use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;
use tracing::{debug, warn};

/// Notes of a sound effect as (frequency Hz, length ms)
fn notes(sound: Sound) -> &'static [(f32, u64)] {
    match sound {
        Sound::Lock => &[(220.0, 40)],
        Sound::RowClear => &[(523.25, 60), (659.25, 60), (783.99, 90)],
        Sound::TetrisClear => &[(523.25, 60), (659.25, 60), (783.99, 60), (1046.5, 180)],
        Sound::GameOver => &[(392.0, 150), (329.63, 150), (261.63, 300)],
        Sound::Click => &[(880.0, 25)],
    }
}

/// Plays tones on the default output device
pub struct TonePlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
}

impl TonePlayer {
    /// Open the default output device. `None` when there is none.
    pub fn new(volume: u32) -> Option<Self> {
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(output) => output,
            Err(e) => {
                warn!("No audio output, sound disabled: {}", e);
                return None;
            }
        };
        debug!("Audio output opened, volume {}", volume);
        Some(Self {
            _stream: stream,
            stream_handle,
            volume: (volume as f32 / 100.0).clamp(0.0, 1.0),
        })
    }
}

impl SoundPlayer for TonePlayer {
    fn play(&mut self, sound: Sound) {
        if self.volume <= 0.0 {
            return;
        }
        let Ok(sink) = Sink::try_new(&self.stream_handle) else {
            return;
        };
        sink.set_volume(self.volume);
        for &(freq, ms) in notes(sound) {
            sink.append(
                SineWave::new(freq)
                    .take_duration(Duration::from_millis(ms))
                    .amplify(0.3),
            );
        }
        sink.detach();
    }
}
