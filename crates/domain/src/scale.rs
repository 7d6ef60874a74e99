use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleType {
    Chromatic,
    #[default]
    Major,
    Minor,
    Pentatonic,
    Blues,
}

impl ScaleType {
    pub const ALL: [ScaleType; 5] = [
        ScaleType::Chromatic,
        ScaleType::Major,
        ScaleType::Minor,
        ScaleType::Pentatonic,
        ScaleType::Blues,
    ];

    /// Ascending semitone offsets within one octave, always starting at 0.
    pub fn offsets(self) -> &'static [i32] {
        match self {
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::Pentatonic => &[0, 2, 4, 7, 9],
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    pub fn degree_of(self, pitch_class: i32) -> Option<usize> {
        self.offsets().iter().position(|&offset| offset == pitch_class)
    }

    pub fn contains(self, midi: i32) -> bool {
        self.degree_of(midi.rem_euclid(12)).is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScaleType::Chromatic => "CHROMATIC",
            ScaleType::Major => "MAJOR",
            ScaleType::Minor => "MINOR",
            ScaleType::Pentatonic => "PENTATONIC",
            ScaleType::Blues => "BLUES",
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ScaleType::ALL
            .into_iter()
            .find(|scale| scale.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown scale {value:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_ascending_and_rooted() {
        for scale in ScaleType::ALL {
            let offsets = scale.offsets();
            assert_eq!(offsets[0], 0);
            assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(offsets.iter().all(|&o| (0..12).contains(&o)));
        }
        assert_eq!(ScaleType::Chromatic.offsets().len(), 12);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("major".parse::<ScaleType>().unwrap(), ScaleType::Major);
        assert_eq!("BLUES".parse::<ScaleType>().unwrap(), ScaleType::Blues);
        assert!("dorian".parse::<ScaleType>().is_err());
    }

    #[test]
    fn serializes_as_upper_case() {
        let json = serde_json::to_string(&ScaleType::Pentatonic).unwrap();
        assert_eq!(json, "\"PENTATONIC\"");
    }

    #[test]
    fn membership() {
        assert!(ScaleType::Major.contains(64));
        assert!(!ScaleType::Major.contains(61));
        assert_eq!(ScaleType::Minor.degree_of(3), Some(2));
    }
}
