//! Offline comment generator: continues a prompt with sampled outlook phrases.

use super::{InferenceError, TextGenerator};
use crate::rng::SeedDeriver;
use rand::seq::SliceRandom;
use rand::Rng;

const PHRASES: &[&str] = &[
    "shows strong momentum after a record quarter.",
    "could see further upside as margins expand.",
    "is trading near its 52-week high on heavy volume.",
    "analysts expect steady growth in the coming year.",
    "remains a solid buy for long-term investors.",
    "faces pressure from rising input costs.",
    "may slump further as demand weakens.",
    "posted a surprise loss and guidance was cut.",
    "looks volatile with debt concerns weighing on sentiment.",
    "is stuck in a sideways range ahead of results.",
    "is flat for the week with little news flow.",
    "management commentary was in line with estimates.",
    "benefits from a recovery in domestic consumption.",
    "sees headwinds from regulatory changes.",
    "outperform rating reiterated by brokers.",
    "could underperform if the monsoon disappoints.",
];

/// Chance of ending the comment after each phrase.
const STOP_PROBABILITY: f64 = 0.35;

/// Prompt continuation from a fixed phrase bank.
///
/// Each prompt gets its own RNG stream derived from the master seed, so the
/// same prompt always yields the same comment for a given seed.
#[derive(Debug, Clone)]
pub struct PhraseGenerator {
    seeds: SeedDeriver,
    max_words: usize,
}

impl PhraseGenerator {
    pub fn new(seeds: SeedDeriver, max_words: usize) -> Self {
        Self { seeds, max_words }
    }
}

impl TextGenerator for PhraseGenerator {
    fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(InferenceError::Generation("empty prompt".into()));
        }

        let mut rng = self.seeds.rng_for(prompt);
        let mut words: Vec<&str> = prompt.split_whitespace().collect();

        while words.len() < self.max_words {
            let Some(phrase) = PHRASES.choose(&mut rng) else {
                break;
            };
            words.extend(phrase.split_whitespace());
            if rng.gen_bool(STOP_PROBABILITY) {
                break;
            }
        }

        words.truncate(self.max_words);
        Ok(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64, max_words: usize) -> PhraseGenerator {
        PhraseGenerator::new(SeedDeriver::new(seed), max_words)
    }

    #[test]
    fn continues_the_prompt() {
        let text = generator(1, 40).generate("FOO stock outlook:").unwrap();
        assert!(text.starts_with("FOO stock outlook:"));
        assert!(text.split_whitespace().count() > 3);
    }

    #[test]
    fn respects_word_cap() {
        for seed in 0..20 {
            let text = generator(seed, 8).generate("FOO stock outlook:").unwrap();
            assert!(text.split_whitespace().count() <= 8, "too long: {text}");
        }
    }

    #[test]
    fn same_seed_same_comment() {
        let a = generator(9, 40).generate("BAR stock outlook:").unwrap();
        let b = generator(9, 40).generate("BAR stock outlook:").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_prompt_fails() {
        assert!(matches!(
            generator(1, 40).generate("   "),
            Err(InferenceError::Generation(_))
        ));
    }
}
