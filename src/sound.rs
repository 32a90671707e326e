//! Named sound events the game fires

/// Sound effect triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    /// A piece locked into the field
    Lock,
    /// One to three rows cleared
    RowClear,
    /// Four or more rows cleared at once
    TetrisClear,
    GameOver,
    /// Menu or overlay command
    Click,
}

/// Fire-and-forget sound playback
pub trait SoundPlayer {
    fn play(&mut self, sound: Sound);
}

/// Plays nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&mut self, _sound: Sound) {}
}

/// Keeps every sound it is asked to play, for inspection
#[derive(Debug, Clone, Default)]
pub struct SoundLog {
    pub played: Vec<Sound>,
}

impl SoundPlayer for SoundLog {
    fn play(&mut self, sound: Sound) {
        self.played.push(sound);
    }
}

impl<P: SoundPlayer + ?Sized> SoundPlayer for Box<P> {
    fn play(&mut self, sound: Sound) {
        (**self).play(sound);
    }
}
