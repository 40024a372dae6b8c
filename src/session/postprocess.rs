//! Formatting applied to every provider reply before it reaches the user.

/// Upper bound on reply length, in characters.
pub const MAX_REPLY_CHARS: usize = 1000;
const ELLIPSIS: &str = "...";
const SHORT_REPLY_CHARS: usize = 50;
const DOMAIN_KEYWORDS: [&str; 2] = ["agricultur", "farm"];
const DECORATIVE_SUFFIX: &str = " 🌱";

/// Drop blank lines, trim each line, cap the length and decorate terse replies.
#[must_use]
pub fn tidy(raw: &str) -> String {
    let mut reply = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if reply.chars().count() > MAX_REPLY_CHARS {
        let keep = MAX_REPLY_CHARS - ELLIPSIS.len();
        reply = reply.chars().take(keep).collect::<String>();
        reply.push_str(ELLIPSIS);
        log::warn!("Response truncated to {MAX_REPLY_CHARS} characters");
    }

    let lowered = reply.to_lowercase();
    if reply.chars().count() < SHORT_REPLY_CHARS
        && !DOMAIN_KEYWORDS.iter().any(|k| lowered.contains(k))
    {
        reply.push_str(DECORATIVE_SUFFIX);
    }

    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_lines_and_trims() {
        let raw = "  Rotate your crops yearly to keep soil healthy.  \n\n\n   Legumes fix nitrogen for the next season.\n  \n";
        assert_eq!(
            tidy(raw),
            "Rotate your crops yearly to keep soil healthy.\nLegumes fix nitrogen for the next season."
        );
    }

    #[test]
    fn long_replies_are_truncated_with_ellipsis() {
        let raw = "a".repeat(1500);
        let reply = tidy(&raw);
        assert_eq!(reply.chars().count(), MAX_REPLY_CHARS);
        assert!(reply.ends_with("..."));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let raw = "🌾".repeat(1200);
        let reply = tidy(&raw);
        assert_eq!(reply.chars().count(), MAX_REPLY_CHARS);
        assert!(reply.ends_with("..."));
    }

    #[test]
    fn reply_at_limit_is_untouched() {
        let raw = "b".repeat(MAX_REPLY_CHARS);
        assert_eq!(tidy(&raw), raw);
    }

    #[test]
    fn short_generic_reply_gets_suffix() {
        assert_eq!(tidy("Sure, happy to help."), "Sure, happy to help. 🌱");
    }

    #[test]
    fn short_domain_reply_has_no_suffix() {
        assert_eq!(tidy("Farm tip: mulch early."), "Farm tip: mulch early.");
        assert_eq!(tidy("Agriculture is great."), "Agriculture is great.");
    }

    #[test]
    fn long_enough_reply_has_no_suffix() {
        let raw = "Water tomatoes deeply twice a week rather than a little every day.";
        assert_eq!(tidy(raw), raw);
    }
}
