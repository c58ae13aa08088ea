//! File-name heuristics for sample libraries
//!
//! Sample packs rarely carry useful tags, but their file names usually say
//! what the sample is: `808_Sub_Cmin_140.wav`, `Top Loop 03 (Am).wav`.

use wavevault_core::{Instrument, SampleKind};

/// Samples shorter than this are treated as one-shots
pub const ONE_SHOT_MAX_SECS: f64 = 2.5;

/// Ordered keyword table; the first instrument with a matching keyword wins
const INSTRUMENT_KEYWORDS: &[(Instrument, &[&str])] = &[
    (Instrument::Kick, &["kick"]),
    (Instrument::Snare, &["snare", "clap", "rim"]),
    (Instrument::HiHat, &["hat", "cymbal", "ride", "crash"]),
    (Instrument::Bass, &["bass", "808"]),
    (Instrument::Percussion, &["perc", "conga", "bongo"]),
    (Instrument::Vocal, &["voc", "acapella"]),
    (Instrument::Fx, &["fx", "riser", "noise"]),
    (Instrument::Pad, &["pad"]),
    (Instrument::Synth, &["synth", "lead"]),
];

/// Guess the instrument from a file name (case-insensitive substring match)
pub fn guess_instrument(file_name: &str) -> Option<Instrument> {
    let lower = file_name.to_lowercase();
    INSTRUMENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(instrument, _)| *instrument)
}

/// Loop when the name says so, otherwise by duration
pub fn guess_sample_kind(file_name: &str, duration_secs: f64) -> SampleKind {
    if file_name.to_lowercase().contains("loop") || duration_secs >= ONE_SHOT_MAX_SECS {
        SampleKind::Loop
    } else {
        SampleKind::OneShot
    }
}

/// Parse a musical key out of a file name
///
/// Tokens such as `Cmin`, `F#maj`, `Am` or `Bbm` give a key with its mode.
/// Failing that, a lone upper-case note token (`_C_`, ` G# `) is read as major.
/// Returns strings like `"C Minor"` or `"F# Major"`.
pub fn key_from_file_name(file_name: &str) -> Option<String> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains(' ') => stem,
        _ => file_name,
    };

    let tokens: Vec<&str> = stem
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
        .filter(|t| !t.is_empty())
        .collect();

    tokens
        .iter()
        .find_map(|token| key_with_mode(token))
        .or_else(|| tokens.iter().find_map(|token| lone_note(token)))
}

fn key_with_mode(token: &str) -> Option<String> {
    let lower = token.to_ascii_lowercase();
    let letter = lower.chars().next().filter(|c| ('a'..='g').contains(c))?;
    let rest = &lower[1..];

    // Prefer reading a second character as an accidental: "bbm" is B-flat minor
    if let Some(accidental) = rest.chars().next().filter(|c| *c == '#' || *c == 'b') {
        if let Some(mode) = parse_mode(&rest[1..]) {
            return Some(format!("{}{} {}", letter.to_ascii_uppercase(), accidental, mode));
        }
    }

    parse_mode(rest).map(|mode| format!("{} {}", letter.to_ascii_uppercase(), mode))
}

fn parse_mode(s: &str) -> Option<&'static str> {
    match s {
        "maj" | "major" => Some("Major"),
        "m" | "min" | "minor" => Some("Minor"),
        _ => None,
    }
}

fn lone_note(token: &str) -> Option<String> {
    let mut chars = token.chars();
    let letter = chars.next().filter(|c| ('A'..='G').contains(c))?;
    match (chars.next(), chars.next()) {
        (None, _) => Some(format!("{letter} Major")),
        (Some('#'), None) => Some(format!("{letter}# Major")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_keywords() {
        assert_eq!(guess_instrument("Big_KICK_01.wav"), Some(Instrument::Kick));
        assert_eq!(guess_instrument("clap tight.wav"), Some(Instrument::Snare));
        assert_eq!(guess_instrument("OpenHat.wav"), Some(Instrument::HiHat));
        assert_eq!(guess_instrument("808 sub.wav"), Some(Instrument::Bass));
        assert_eq!(guess_instrument("conga hit.wav"), Some(Instrument::Percussion));
        assert_eq!(guess_instrument("Vocal Chop.wav"), Some(Instrument::Vocal));
        assert_eq!(guess_instrument("white noise riser.wav"), Some(Instrument::Fx));
        assert_eq!(guess_instrument("warm pad.wav"), Some(Instrument::Pad));
        assert_eq!(guess_instrument("lead 3.wav"), Some(Instrument::Synth));
        assert_eq!(guess_instrument("untitled.wav"), None);
    }

    #[test]
    fn earlier_instrument_wins() {
        // "kick" is checked before "bass"
        assert_eq!(guess_instrument("bass_kick.wav"), Some(Instrument::Kick));
    }

    #[test]
    fn sample_kind_by_name_then_duration() {
        assert_eq!(guess_sample_kind("hit.wav", 0.4), SampleKind::OneShot);
        assert_eq!(guess_sample_kind("hit.wav", 2.5), SampleKind::Loop);
        assert_eq!(guess_sample_kind("Drum LOOP.wav", 0.4), SampleKind::Loop);
    }

    #[test]
    fn keys_with_mode() {
        assert_eq!(key_from_file_name("bass_Cmin_120.wav").as_deref(), Some("C Minor"));
        assert_eq!(key_from_file_name("Pad F#maj.wav").as_deref(), Some("F# Major"));
        assert_eq!(key_from_file_name("Top Loop (Am).wav").as_deref(), Some("A Minor"));
        assert_eq!(key_from_file_name("chord bbm.wav").as_deref(), Some("Bb Minor"));
        assert_eq!(key_from_file_name("keys_Ebmajor.aif").as_deref(), Some("Eb Major"));
    }

    #[test]
    fn lone_note_is_major() {
        assert_eq!(key_from_file_name("Bass_G_140.wav").as_deref(), Some("G Major"));
        assert_eq!(key_from_file_name("stab C# 01.wav").as_deref(), Some("C# Major"));
    }

    #[test]
    fn no_key() {
        assert_eq!(key_from_file_name("kick_01.wav"), None);
        assert_eq!(key_from_file_name("Drum Loop.wav"), None);
        // lower-case single letters are too ambiguous
        assert_eq!(key_from_file_name("take a break.wav"), None);
    }
}
