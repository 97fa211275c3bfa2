//! Fixed vocabularies for the generic-response strategies, overridable from a
//! TOML file, and the per-conversation record of canned phrases already used.

use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::dialog::Context;

/// Side-channel key holding the canned phrases already emitted, per label
/// family.
pub const USED_PHRASES_KEY: &str = "used_generic_phrases";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Filler acknowledgment words for Register predictions.
    pub registers: Vec<String>,
    /// Confirmation questions for mid-length Confirm phrases.
    pub confirmations: Vec<String>,
    /// Canned phrases for Affirm predictions.
    pub affirmations: Vec<String>,
    /// Canned phrases for Agree predictions.
    pub agreements: Vec<String>,
    /// Canned phrases for Check predictions.
    pub checks: Vec<String>,
    /// Attention-getters used when no candidate survives.
    pub greetings: Vec<String>,
    /// Question words that open an interrogative utterance.
    pub interrogatives: Vec<String>,
    /// Speech-function labels the generic skill knows how to answer.
    pub supported_labels: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            registers: strings(&[
                "God", "Gosh", "Hm", "Hmm", "Hunh", "Mhm", "Mm", "Oh", "Okay", "Unhunh", "Well",
                "Yeah", "Yes", "whoa", "yeah",
            ]),
            confirmations: strings(&[
                "Oh really?",
                "Oh yeah?",
                "Sure?",
                "Are you sure?",
                "Are you serious?",
                "Yeah?",
            ]),
            affirmations: strings(&[
                "Oh definitely.",
                "Yeah.",
                "Kind of.",
                "Unhunh",
                "Yeah I think so",
                "Really.",
                "Right.",
                "That's what it was.",
            ]),
            agreements: strings(&[
                "Right.",
                "Exactly.",
                "True.",
                "Fair enough.",
                "I agree.",
                "Sure.",
            ]),
            checks: strings(&[
                "Really?",
                "Is that right?",
                "Is that so?",
                "You mean it?",
                "Did you now?",
            ]),
            greetings: strings(&[
                "Hi",
                "Hello",
                "Well hello there!",
                "Look what the cat dragged in!",
            ]),
            interrogatives: strings(&[
                "whose", "what", "which", "who", "whom", "why", "where", "when", "how",
            ]),
            supported_labels: strings(&[
                "Register", "Check", "Confirm", "Monitor", "Affirm", "Agree", "Clarify",
            ]),
        }
    }
}

impl Vocabulary {
    /// The canned phrase list for a predicted label, keyed by its family.
    pub fn canned(&self, label: &str) -> Option<(&'static str, &[String])> {
        if label.contains("Check") {
            Some(("Check", &self.checks))
        } else if label.contains("Affirm") {
            Some(("Affirm", &self.affirmations))
        } else if label.contains("Agree") {
            Some(("Agree", &self.agreements))
        } else {
            None
        }
    }
}

/// Pick a random phrase not yet emitted in this conversation for the given
/// label family, and record it as used. Once the list is exhausted the record
/// is reset and phrases rotate again. An unreadable record starts fresh.
pub fn next_unused(ctx: &mut Context, family: &str, options: &[String]) -> Option<String> {
    if options.is_empty() {
        return None;
    }

    let mut used: Vec<String> = ctx
        .misc
        .get(USED_PHRASES_KEY)
        .and_then(|entry| entry.get(family))
        .and_then(|list| serde_json::from_value(list.clone()).ok())
        .unwrap_or_default();

    let mut unused: Vec<&String> = options
        .iter()
        .filter(|option| !used.contains(option))
        .collect();
    if unused.is_empty() {
        used.clear();
        unused = options.iter().collect();
    }

    let choice = (*unused.choose(&mut rand::thread_rng())?).clone();
    used.push(choice.clone());

    let record = ctx
        .misc
        .entry(USED_PHRASES_KEY.to_string())
        .or_insert_with(|| serde_json::json!({}));
    if let Some(map) = record.as_object_mut() {
        map.insert(family.to_string(), serde_json::json!(used));
    }

    Some(choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_through_unused_phrases() {
        let mut ctx = Context::new("test");
        let options = strings(&["one", "two", "three"]);

        let mut seen = Vec::new();
        for _ in 0..3 {
            let phrase = next_unused(&mut ctx, "Check", &options).expect("options are non-empty");
            assert!(!seen.contains(&phrase), "phrase {phrase:?} repeated early");
            seen.push(phrase);
        }

        // Exhausted: the record resets and phrases come around again.
        assert!(next_unused(&mut ctx, "Check", &options).is_some());
    }

    #[test]
    fn tracks_label_families_independently() {
        let mut ctx = Context::new("test");
        let options = strings(&["only"]);

        assert_eq!(next_unused(&mut ctx, "Check", &options).as_deref(), Some("only"));
        assert_eq!(next_unused(&mut ctx, "Agree", &options).as_deref(), Some("only"));
    }

    #[test]
    fn parses_a_vocabulary_override() {
        let vocabulary: Vocabulary = toml::from_str(
            r#"
            registers = ["Ah"]
            "#,
        )
        .expect("override is valid TOML");

        assert_eq!(vocabulary.registers, vec!["Ah".to_string()]);
        // Unspecified lists keep their defaults.
        assert!(!vocabulary.greetings.is_empty());
    }

    #[test]
    fn maps_labels_to_canned_families() {
        let vocabulary = Vocabulary::default();
        assert_eq!(
            vocabulary.canned("React.Respond.Support.Check").map(|(family, _)| family),
            Some("Check")
        );
        assert!(vocabulary.canned("Register").is_none());
    }
}
