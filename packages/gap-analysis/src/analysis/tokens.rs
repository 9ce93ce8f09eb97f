//! Text tokenization shared by the parser and the diff engines.
//!
//! Japanese text has no spaces, so CJK runs are treated as tokens in their
//! own right and counted per character for word counts.

/// Han, Hiragana, Katakana (including half-width and the prolonged sound mark).
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
        | '\u{31F0}'..='\u{31FF}'
        | '\u{3400}'..='\u{4DBF}' // CJK Extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK Unified
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF66}'..='\u{FF9F}' // Half-width Katakana
    )
}

/// Latin words plus individual CJK characters.
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for c in text.chars() {
        if is_cjk(c) {
            count += 1;
            in_word = false;
        } else if c.is_alphanumeric() {
            if !in_word {
                count += 1;
                in_word = true;
            }
        } else if !(in_word && (c == '\'' || c == '-')) {
            in_word = false;
        }
    }
    count
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used to compare headings across documents.
pub fn heading_key(text: &str) -> String {
    collapse_whitespace(text)
        .trim_end_matches(['?', '？', ':', '：', '.', '。'])
        .to_lowercase()
}

/// Content tokens: CJK runs of at least 2 characters and lowercase Latin
/// words of at least 3 characters. Order of appearance is kept.
pub fn tokenize(text: &str) -> Vec<String> {
    const MIN_CJK: usize = 2;
    const MIN_LATIN: usize = 3;

    #[derive(PartialEq)]
    enum Run {
        None,
        Cjk,
        Latin,
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut run = Run::None;

    let mut flush = |current: &mut String, run: &Run| {
        let len = current.chars().count();
        let keep = match run {
            Run::Cjk => len >= MIN_CJK,
            Run::Latin => len >= MIN_LATIN && !current.chars().all(|c| c.is_ascii_digit()),
            Run::None => false,
        };
        if keep {
            tokens.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for c in text.chars() {
        let next = if is_cjk(c) {
            Run::Cjk
        } else if c.is_alphanumeric() {
            Run::Latin
        } else {
            Run::None
        };
        if next != run {
            flush(&mut current, &run);
            run = next;
        }
        if run != Run::None {
            current.extend(c.to_lowercase());
        }
    }
    flush(&mut current, &run);

    tokens
}
