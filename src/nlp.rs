//! Tokenization and part-of-speech tagging for the response heuristics.
//!
//! Rule-based: static closed-class tables, a capitalization heuristic for
//! proper nouns and suffix heuristics for the open classes. Covers exactly
//! what the synthesis rules consume.

use std::sync::LazyLock;

use regex::Regex;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w']+|[^\w\s]+").expect("word pattern is valid"));

/// Split text into word and punctuation tokens.
pub fn words(text: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(text)
        .map(|token| token.as_str().to_string())
        .collect()
}

/// Split text into sentence fragments, keeping the terminator with its
/// fragment.
pub fn sentences(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();

    for character in text.chars() {
        current.push(character);
        if matches!(character, '.' | '!' | '?') {
            let fragment = current.trim();
            if !fragment.is_empty() {
                fragments.push(fragment.to_string());
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        fragments.push(rest.to_string());
    }
    fragments
}

/// First character uppercased, the rest lowercased.
pub fn capitalize(word: &str) -> String {
    let mut characters = word.chars();
    match characters.next() {
        Some(first) => first.to_uppercase().chain(characters.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosTag {
    Noun,
    ProperNoun,
    Pronoun,
    Preposition,
    Verb,
    Adverb,
    Function,
    Punct,
}

const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his",
    "she", "her", "hers", "it", "its", "we", "us", "our", "ours", "they", "them", "their",
    "theirs", "this", "that", "these", "those", "who", "whom", "whose", "what", "which",
    "someone", "something", "anyone", "anything", "everyone", "everything", "nobody", "nothing",
];

const PREPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beneath", "beside", "between", "beyond", "by", "down", "during", "for",
    "from", "in", "inside", "into", "near", "of", "off", "on", "onto", "out", "outside", "over",
    "past", "through", "to", "toward", "under", "until", "up", "upon", "with", "within",
    "without",
];

const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "the", "some", "any", "no", "every", "each", "either", "neither", "both", "all",
    "and", "but", "or", "nor", "so", "yet", "because", "although", "though", "while", "if",
    "unless", "since", "am", "is", "are", "was", "were", "be", "been", "being", "do", "does",
    "did", "done", "have", "has", "had", "will", "would", "can", "could", "shall", "should",
    "may", "might", "must", "not", "oh", "hi", "hello", "hey", "wow", "yeah", "ok", "okay",
    "hmm", "hm", "well", "please", "thanks",
];

const ADVERBS: &[&str] = &[
    "very", "really", "quite", "too", "also", "just", "now", "then", "here", "there", "always",
    "never", "often", "sometimes", "soon", "still", "already", "again", "maybe", "perhaps",
    "why", "where", "when", "how", "today", "tomorrow", "yesterday",
];

const COMMON_VERBS: &[&str] = &[
    "go", "goes", "went", "gone", "going", "get", "gets", "got", "gotten", "say", "says",
    "said", "make", "makes", "made", "know", "knows", "knew", "known", "think", "thinks",
    "thought", "take", "takes", "took", "taken", "see", "sees", "saw", "seen", "come", "comes",
    "came", "want", "wants", "like", "likes", "talk", "talks", "buy", "buys", "bought", "tell",
    "tells", "told", "feel", "feels", "felt", "look", "looks", "give", "gives", "gave", "find",
    "finds", "found", "need", "needs", "try", "tries", "ask", "asks", "leave", "leaves",
    "left", "put", "puts", "mean", "means", "meant", "keep", "keeps", "kept", "let", "lets",
    "hear", "hears", "heard", "run", "runs", "ran", "sit", "sits", "sat", "stand", "stands",
    "stood", "lose", "loses", "lost", "pay", "pays", "paid", "meet", "meets", "met", "speak",
    "speaks", "spoke", "read", "reads", "write", "writes", "wrote", "eat", "eats", "ate",
];

fn classify(token: &str, position: usize) -> PosTag {
    if !token.chars().any(char::is_alphanumeric) {
        return PosTag::Punct;
    }

    let lower = token.to_lowercase();
    if PRONOUNS.contains(&lower.as_str()) {
        return PosTag::Pronoun;
    }
    if PREPOSITIONS.contains(&lower.as_str()) {
        return PosTag::Preposition;
    }
    if FUNCTION_WORDS.contains(&lower.as_str()) {
        return PosTag::Function;
    }
    if ADVERBS.contains(&lower.as_str()) {
        return PosTag::Adverb;
    }
    if COMMON_VERBS.contains(&lower.as_str()) {
        return PosTag::Verb;
    }
    // Capitalization marks proper nouns everywhere but sentence-initially.
    if position > 0 && token.chars().next().is_some_and(char::is_uppercase) {
        return PosTag::ProperNoun;
    }
    if lower.ends_with("ly") && lower.len() > 3 {
        return PosTag::Adverb;
    }
    if (lower.ends_with("ing") || lower.ends_with("ed")) && lower.len() > 4 {
        return PosTag::Verb;
    }
    PosTag::Noun
}

/// Tag every token of the phrase. Punctuation tokens are kept.
pub fn pos_tag(text: &str) -> Vec<(String, PosTag)> {
    words(text)
        .into_iter()
        .enumerate()
        .map(|(position, token)| {
            let tag = classify(&token, position);
            (token, tag)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_words_and_punctuation() {
        assert_eq!(
            words("i'm fine, how are you?"),
            vec!["i'm", "fine", ",", "how", "are", "you", "?"]
        );
    }

    #[test]
    fn splits_sentences_keeping_terminators() {
        assert_eq!(
            sentences("It was great. Do you agree? Sure"),
            vec!["It was great.", "Do you agree?", "Sure"]
        );
    }

    #[test]
    fn capitalizes_like_a_title() {
        assert_eq!(capitalize("guitar"), "Guitar");
        assert_eq!(capitalize("NYC"), "Nyc");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn tags_nouns_pronouns_and_prepositions() {
        let tags = pos_tag("I left the guitar in Paris");
        assert_eq!(tags[0], ("I".to_string(), PosTag::Pronoun));
        assert_eq!(tags[1], ("left".to_string(), PosTag::Verb));
        assert_eq!(tags[2], ("the".to_string(), PosTag::Function));
        assert_eq!(tags[3], ("guitar".to_string(), PosTag::Noun));
        assert_eq!(tags[4], ("in".to_string(), PosTag::Preposition));
        assert_eq!(tags[5], ("Paris".to_string(), PosTag::ProperNoun));
    }

    #[test]
    fn sentence_initial_capital_is_not_a_proper_noun() {
        let tags = pos_tag("Guitars sound nice");
        assert_eq!(tags[0].1, PosTag::Noun);
    }
}
