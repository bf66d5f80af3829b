use std::time::Duration;

use crate::scoring::ScoreEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SoundKind {
    Correct,
    Error,
    Combo,
    Achievement,
    LevelUp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sound {
    pub kind: SoundKind,
    /// 0.0 to 1.0
    pub volume: f32,
    pub playback_rate: f32,
}

impl Sound {
    fn new(kind: SoundKind, volume: f32, playback_rate: f32) -> Self {
        Self {
            kind,
            volume,
            playback_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub lasts: Duration,
}

/// What the front end should play and show for one score event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cue {
    pub sound: Option<Sound>,
    pub banner: Option<Banner>,
}

fn rate_for_combo(combo: u32, per: f32) -> f32 {
    (1.0 + combo as f32 / per).min(2.0)
}

/// Map a score event to its cue. Sounds are dropped when sound is disabled; banners never are.
pub fn cue_for(event: &ScoreEvent, sound_enabled: bool) -> Cue {
    let (sound, banner) = match event {
        ScoreEvent::Correct { combo } => (
            Some(Sound::new(SoundKind::Correct, 0.3, rate_for_combo(*combo, 100.0))),
            None,
        ),
        ScoreEvent::Incorrect => (Some(Sound::new(SoundKind::Error, 0.2, 1.0)), None),
        ScoreEvent::ComboMilestone { combo, multiplier } => (
            Some(Sound::new(SoundKind::Combo, 0.5, rate_for_combo(*combo, 50.0))),
            Some(Banner {
                text: format!("{combo}x COMBO! ({multiplier}x points)"),
                lasts: Duration::from_secs(1),
            }),
        ),
        ScoreEvent::LevelUp { level } => (
            Some(Sound::new(SoundKind::LevelUp, 1.0, 1.0)),
            Some(Banner {
                text: format!("Level up! Now level {level}"),
                lasts: Duration::from_secs(2),
            }),
        ),
        ScoreEvent::AchievementUnlocked { name, .. } => (
            Some(Sound::new(SoundKind::Achievement, 1.0, 1.0)),
            Some(Banner {
                text: format!("Achievement unlocked: {name}"),
                lasts: Duration::from_secs(3),
            }),
        ),
        ScoreEvent::SessionComplete { wpm, accuracy } => (
            None,
            Some(Banner {
                text: format!("Finished! {wpm} wpm at {accuracy}%"),
                lasts: Duration::from_secs(3),
            }),
        ),
    };

    Cue {
        sound: sound.filter(|_| sound_enabled),
        banner,
    }
}
