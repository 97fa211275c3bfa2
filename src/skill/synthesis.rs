//! The four response-synthesis strategies, keyed on the predicted
//! speech-function label.

use rand::seq::SliceRandom;

use crate::dialog::Context;
use crate::nlp::{self, PosTag};
use crate::phrasebook::{self, Vocabulary};

/// Register: a random filler word, or with `repeat_last_word` the capitalized
/// last word of the prior phrase followed by a period.
pub fn register_response(
    previous_phrase: &str,
    vocabulary: &Vocabulary,
    repeat_last_word: bool,
) -> Option<String> {
    if repeat_last_word {
        nlp::words(previous_phrase)
            .last()
            .map(|word| format!("{}.", nlp::capitalize(word)))
    } else {
        vocabulary.registers.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Confirm: echo the last token of a long phrase, pronoun-flip a short one,
/// otherwise a random confirmation question.
pub fn confirm_response(previous_phrase: &str, vocabulary: &Vocabulary) -> String {
    let tokens = nlp::words(previous_phrase);
    if tokens.len() > 5 {
        format!("{}?", nlp::capitalize(&tokens[tokens.len() - 1]))
    } else if tokens.len() < 4 {
        let mut phrase = previous_phrase.to_string();
        if tokens.iter().any(|token| token == "you") {
            phrase = phrase.replace("you", "me");
        }
        if phrase.contains("I ") {
            phrase = phrase.replace('I', "you");
        }
        format!("{phrase}?")
    } else {
        vocabulary
            .confirmations
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| "Sure?".to_string())
    }
}

/// Clarify: ask back about a noun, a preposition, or the opening word.
///
/// The branch choice is reassigned on every token, so the last token's
/// classification decides which question is asked.
pub fn clarify_response(previous_phrase: &str) -> String {
    let tagged = nlp::pos_tag(previous_phrase);
    let first_tag = tagged.first().map(|(_, tag)| *tag);
    let first_word = tagged
        .first()
        .map(|(word, _)| word.clone())
        .unwrap_or_default();

    let mut next_sent = "What?".to_string();
    for (word, tag) in &tagged {
        next_sent = if matches!(tag, PosTag::Noun | PosTag::ProperNoun) {
            format!("What {word}?")
        } else if *tag == PosTag::Preposition {
            format!("{} what?", nlp::capitalize(word))
        } else if matches!(first_tag, Some(PosTag::ProperNoun | PosTag::Pronoun)) {
            let opener = first_word.to_lowercase();
            if opener == "i" || opener == "we" {
                "You what?".to_string()
            } else if opener != "what" {
                format!("{first_word} what?")
            } else {
                "What?".to_string()
            }
        } else {
            "What?".to_string()
        };
    }
    next_sent
}

/// Synthesize one candidate for a predicted label. Checks run in a fixed
/// order and each overwrites the previous result, so when several labels
/// match one prediction the last check wins: Clarify over Agree over Affirm
/// over Confirm over Check over Register.
pub fn generate_response(
    ctx: &mut Context,
    predicted: &str,
    previous_phrase: &str,
    vocabulary: &Vocabulary,
    repeat_register: bool,
) -> Option<String> {
    let mut response = None;
    if predicted.contains("Register") {
        response = register_response(previous_phrase, vocabulary, repeat_register);
    }
    if predicted.contains("Check") {
        response = canned_response(ctx, predicted, vocabulary);
    }
    if predicted.contains("Confirm") {
        response = Some(confirm_response(previous_phrase, vocabulary));
    }
    if predicted.contains("Affirm") {
        response = canned_response(ctx, predicted, vocabulary);
    }
    if predicted.contains("Agree") {
        response = canned_response(ctx, predicted, vocabulary);
    }
    if predicted.contains("Clarify") {
        response = Some(clarify_response(previous_phrase));
    }
    response
}

fn canned_response(ctx: &mut Context, predicted: &str, vocabulary: &Vocabulary) -> Option<String> {
    let (family, options) = vocabulary.canned(predicted)?;
    phrasebook::next_unused(ctx, family, options)
}
