/// Punctuation removed before a title becomes an identifier.
const DISALLOWED: &[char] = &['!', '?', ':', ',', '\'', '(', ')', '[', ']'];

/// Scraped identifiers whose catalog entry lives under a different slug.
const ALIASES: &[(&str, &str)] = &[
    ("marvels-agents-of-s-h-i-e-l-d", "marvel-s-agents-of-s-h-i-e-l-d"),
    ("house-of-cards-2013", "house-of-cards"),
    ("the-office-us", "the-office"),
    ("shingeki-no-kyojin", "attack-on-titan"),
    ("one-punch-man", "onepunch-man"),
    ("boku-no-hero-academia", "my-hero-academia"),
    ("rezero-starting-life-in-another-world", "re-zero-kara-hajimeru-isekai-seikatsu"),
];

/// Turn a dotted release title into a readable one.
pub fn normalize_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive the identifier used to correlate listings and catalog entries.
pub fn slugify(title: &str) -> String {
    let stripped: String = title
        .replace(" - ", " ")
        .chars()
        .filter(|c| !DISALLOWED.contains(c))
        .collect();
    let slug = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    match alias(&slug) {
        Some(canonical) => canonical.to_owned(),
        None => slug,
    }
}

fn alias(slug: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(scraped, _)| *scraped == slug)
        .map(|(_, canonical)| *canonical)
}
