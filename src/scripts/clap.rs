//! "I'd clap that" reactions to adjective + noun pairs.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::tagger::{PosTagger, TaggedWord};
use super::ScriptContext;

/// First adjective directly followed by a noun.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjectiveNounPair {
    pub adjective: String,
    pub noun: String,
    pub is_plural: bool,
}

/// Find the first `JJ*` tag immediately followed by an `NN*` tag with a
/// different surface word.
pub fn find_adjective_noun_pair(words: &[TaggedWord]) -> Option<AdjectiveNounPair> {
    words.windows(2).find_map(|pair| {
        let (first, second) = (&pair[0], &pair[1]);
        if first.tag.starts_with("JJ") && second.tag.starts_with("NN") && first.text != second.text
        {
            Some(AdjectiveNounPair {
                adjective: first.text.clone(),
                noun: second.text.clone(),
                is_plural: second.tag == "NNS" || second.tag == "NNPS",
            })
        } else {
            None
        }
    })
}

/// Format the reaction line.
pub fn clap_response(pair: &AdjectiveNounPair) -> String {
    let article = if pair.is_plural { "those" } else { "that" };
    format!(
        "I'd clap {} {} {}!",
        article,
        pair.adjective.to_lowercase(),
        pair.noun.to_lowercase()
    )
}

/// Passive script: occasionally claps for something in chat.
pub struct ClapThatScript {
    tagger: Arc<dyn PosTagger>,
    reply_chance_percent: u32,
    rng: Mutex<StdRng>,
}

impl ClapThatScript {
    pub fn new(tagger: Arc<dyn PosTagger>, reply_chance_percent: u32) -> Self {
        Self::with_rng(tagger, reply_chance_percent, StdRng::from_entropy())
    }

    pub fn with_rng(tagger: Arc<dyn PosTagger>, reply_chance_percent: u32, rng: StdRng) -> Self {
        Self {
            tagger,
            reply_chance_percent: reply_chance_percent.clamp(1, 100),
            rng: Mutex::new(rng),
        }
    }

    fn roll(&self) -> u32 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..100),
            Err(poisoned) => poisoned.into_inner().gen_range(0..100),
        }
    }

    pub async fn try_handle(&self, ctx: &ScriptContext<'_>) -> Option<String> {
        if ctx.message.trim().is_empty() || ctx.username.trim().is_empty() {
            return None;
        }
        if ctx.message.trim_start().starts_with('!') {
            return None;
        }

        let roll = self.roll();
        if roll >= self.reply_chance_percent {
            debug!(
                user = %ctx.username,
                "ClapThat: skipped (roll {} >= {})", roll, self.reply_chance_percent
            );
            return None;
        }

        let words = match self.tagger.tag(ctx.message).await {
            Ok(words) => words,
            Err(e) => {
                warn!("ClapThat: tagging failed: {}", e);
                return None;
            }
        };

        let Some(pair) = find_adjective_noun_pair(&words) else {
            debug!("ClapThat: no adjective + noun pair in \"{}\"", ctx.message);
            return None;
        };

        let response = clap_response(&pair);
        debug!("ClapThat: responding with \"{}\"", response);
        Some(response)
    }
}
