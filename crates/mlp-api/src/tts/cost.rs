//! Price and duration estimates for speech synthesis.

use super::model::TtsModel;

/// USD per 1 000 characters for `tts-1`
pub const TTS_1_PRICE_PER_1K: f64 = 0.015;

/// USD per 1 000 characters for `tts-1-hd`
pub const TTS_1_HD_PRICE_PER_1K: f64 = 0.03;

/// Average speaking rate at speed 1.0
pub const WORDS_PER_SECOND: f64 = 2.5;

/// Characters billed by the provider: Unicode scalar values, not bytes.
pub fn character_count(text: &str) -> usize {
    text.chars().count()
}

pub const fn price_per_1k(model: TtsModel) -> f64 {
    match model {
        TtsModel::Tts1 => TTS_1_PRICE_PER_1K,
        TtsModel::Tts1Hd => TTS_1_HD_PRICE_PER_1K,
    }
}

/// `(characters / 1000) * price`
pub fn estimate_cost(characters: usize, model: TtsModel) -> f64 {
    characters as f64 / 1000.0 * price_per_1k(model)
}

/// Seconds of audio for `text` read at `speed`.
pub fn estimate_duration_secs(text: &str, speed: f64) -> f64 {
    let words = text.split_whitespace().count() as f64;
    if speed <= 0.0 {
        return 0.0;
    }
    words / WORDS_PER_SECOND / speed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_cost_boundaries_tts_1() {
        assert!(close(estimate_cost(0, TtsModel::Tts1), 0.0));
        assert!(close(estimate_cost(999, TtsModel::Tts1), 0.014985));
        assert!(close(estimate_cost(1000, TtsModel::Tts1), 0.015));
        assert!(close(estimate_cost(1001, TtsModel::Tts1), 0.015015));
    }

    #[test]
    fn test_cost_boundaries_tts_1_hd() {
        assert!(close(estimate_cost(0, TtsModel::Tts1Hd), 0.0));
        assert!(close(estimate_cost(999, TtsModel::Tts1Hd), 0.02997));
        assert!(close(estimate_cost(1000, TtsModel::Tts1Hd), 0.03));
        assert!(close(estimate_cost(1001, TtsModel::Tts1Hd), 0.03003));
    }

    #[test]
    fn test_character_count_uses_scalar_values() {
        assert_eq!(character_count(""), 0);
        assert_eq!(character_count("héllo"), 5);
        assert_eq!("héllo".len(), 6);
        assert_eq!(character_count("日本語"), 3);
    }

    #[test]
    fn test_duration() {
        // 10 words at 2.5 words per second
        let text = "one two three four five six seven eight nine ten";
        assert!(close(estimate_duration_secs(text, 1.0), 4.0));
        assert!(close(estimate_duration_secs(text, 2.0), 2.0));
        assert!(close(estimate_duration_secs(text, 0.5), 8.0));
        assert!(close(estimate_duration_secs("   ", 1.0), 0.0));
    }
}
