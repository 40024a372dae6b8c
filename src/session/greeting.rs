//! Canned greetings answered without the AI provider.

use crate::clock::DayPeriod;

const GREETING_WORDS: [&str; 5] = ["hello", "hi", "hey", "hlo", "greetings"];
const GREETING_PHRASES: [&str; 4] = ["good morning", "good afternoon", "good evening", "good day"];
const ADDRESSEES: [&str; 4] = ["there", "all", "bot", "cholan"];

/// True when the whole message is a bare greeting such as "Hello!" or
/// "good morning". Greetings followed by a question go to the provider.
#[must_use]
pub fn is_greeting(text: &str) -> bool {
    let normalized: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = normalized.split_whitespace().collect();

    match words.as_slice() {
        [word] => GREETING_WORDS.contains(word),
        [word, addressee] if GREETING_WORDS.contains(word) => ADDRESSEES.contains(addressee),
        _ => GREETING_PHRASES.contains(&words.join(" ").as_str()),
    }
}

#[must_use]
pub fn greeting_reply(period: DayPeriod) -> String {
    format!("{period}! 🌾 Welcome to Cholan AI! How can I help you with your agricultural needs today?")
}
