//! Response Formatter
//!
//! Everything the tutor says passes through [`format_for_speech`] before it is
//! handed to the speech synthesizer. The output carries no structural markup,
//! spells every number out as words and holds at most [`MAX_SENTENCES`]
//! sentences.

/// Upper bound on sentences in a single spoken response.
pub const MAX_SENTENCES: usize = 3;

const MARKUP_CHARS: &[char] = &['*', '#', '`', '[', ']', '{', '}', '<', '>', '|', '~', '\\', '^', '_'];

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("e.g.", "for example"),
    ("i.e.", "that is"),
    ("etc.", "etcetera"),
    ("vs.", "versus"),
    ("approx.", "approximately"),
    ("Mrs.", "Misses"),
    ("Mr.", "Mister"),
    ("Ms.", "Miss"),
    ("Dr.", "Doctor"),
    ("Prof.", "Professor"),
];

const SYMBOLS: &[(&str, &str)] = &[
    ("&", " and "),
    ("%", " percent"),
    ("+", " plus "),
    ("=", " equals "),
    ("@", " at "),
];

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(u64, &str); 6] = [
    (1_000_000_000_000_000_000, "quintillion"),
    (1_000_000_000_000_000, "quadrillion"),
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

/// Renders arbitrary response text into plain, speakable prose.
pub fn format_for_speech(text: &str) -> String {
    let text = strip_markup(text);
    let text = expand_symbols(&text);
    let text = spell_out_numbers(&text);
    let text = tidy_whitespace(&text);
    truncate_sentences(&text, MAX_SENTENCES)
}

/// Returns true if `text` still holds characters a speech engine would read
/// out literally (markup or pictographs).
pub fn contains_markup(text: &str) -> bool {
    text.chars()
        .any(|c| MARKUP_CHARS.contains(&c) || is_pictograph(c))
}

/// Keeps the first `max` sentences of `text`.
pub fn truncate_sentences(text: &str, max: usize) -> String {
    split_sentences(text)
        .into_iter()
        .take(max)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spells a whole number out in English words, e.g. `42` → `forty-two`.
pub fn spell_number(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts = Vec::new();
    let mut rest = n;
    for (scale, name) in SCALES {
        if rest >= scale {
            parts.push(format!("{} {}", spell_below_thousand(rest / scale), name));
            rest %= scale;
        }
    }
    if rest > 0 {
        parts.push(spell_below_thousand(rest));
    }
    parts.join(" ")
}

/// Replaces every run of digits in `text` with words.
///
/// Handles thousands separators (`1,000`), decimals (`3.5`), ordinals (`21st`)
/// and digits glued to letters (`c1` → `c one`).
pub fn spell_out_numbers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !c.is_ascii_digit() {
            out.push(c);
            i += 1;
            continue;
        }

        if out.chars().last().is_some_and(char::is_alphabetic) {
            out.push(' ');
        }

        let mut digits = String::new();
        while i < chars.len() {
            if chars[i].is_ascii_digit() {
                digits.push(chars[i]);
                i += 1;
            } else if chars[i] == ',' && is_thousands_group(&chars, i + 1) {
                i += 1;
            } else {
                break;
            }
        }

        let mut words = spell_digit_run(&digits);
        if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
            i += 1;
            let mut fraction = Vec::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                fraction.push(digit_word(chars[i]));
                i += 1;
            }
            words = format!("{} point {}", words, fraction.join(" "));
        } else if let Some(len) = ordinal_suffix_len(&chars, i) {
            words = ordinal(&words);
            i += len;
        }

        out.push_str(&words);
        if chars.get(i).is_some_and(|c| c.is_alphanumeric()) {
            out.push(' ');
        }
    }

    out
}

fn strip_markup(text: &str) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut in_fence = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        // Code is never spoken.
        if in_fence || line.is_empty() {
            continue;
        }

        let line = strip_list_marker(line.trim_start_matches('#').trim_start());
        let cleaned: String = line
            .chars()
            .map(|c| if c == '_' { ' ' } else { c })
            .filter(|c| !MARKUP_CHARS.contains(c) && !is_pictograph(*c))
            .collect();
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            pieces.push(cleaned.to_string());
        }
    }

    let mut out = String::new();
    for piece in pieces {
        if !out.is_empty() {
            if !out.ends_with(['.', '!', '?', ',', ':', ';']) {
                out.push('.');
            }
            out.push(' ');
        }
        out.push_str(&piece);
    }
    out
}

fn strip_list_marker(line: &str) -> &str {
    for marker in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return rest.trim_start();
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}

fn is_pictograph(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE0F | 0x200D
    )
}

fn expand_symbols(text: &str) -> String {
    let mut result = text.to_string();
    for (abbrev, expansion) in ABBREVIATIONS {
        result = replace_at_word_start(&result, abbrev, expansion);
    }
    for (symbol, expansion) in SYMBOLS {
        result = result.replace(symbol, expansion);
    }
    result
}

/// Replaces `from` only where it begins a word, so "Ms." inside "LLMs." stays put.
fn replace_at_word_start(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(from) {
        let starts_word = rest[..pos]
            .chars()
            .next_back()
            .or_else(|| out.chars().next_back())
            .is_none_or(|prev| !prev.is_alphanumeric());
        out.push_str(&rest[..pos]);
        out.push_str(if starts_word { to } else { from });
        rest = &rest[pos + from.len()..];
    }
    out.push_str(rest);
    out
}

fn tidy_whitespace(text: &str) -> String {
    let mut result = text.split_whitespace().collect::<Vec<_>>().join(" ");
    for punct in [",", ".", "!", "?", ";", ":"] {
        result = result.replace(&format!(" {}", punct), punct);
    }
    result.trim().to_string()
}

fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for (idx, &c) in chars.iter().enumerate() {
        current.push(c);
        let at_boundary = chars.get(idx + 1).is_none_or(|next| next.is_whitespace());
        if matches!(c, '.' | '!' | '?') && at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

fn spell_below_thousand(n: u64) -> String {
    let hundreds = (n / 100) as usize;
    let rest = (n % 100) as usize;
    let mut parts = Vec::new();

    if hundreds > 0 {
        parts.push(format!("{} hundred", ONES[hundreds]));
    }
    if rest > 0 {
        if rest < 20 {
            parts.push(ONES[rest].to_string());
        } else if rest % 10 == 0 {
            parts.push(TENS[rest / 10].to_string());
        } else {
            parts.push(format!("{}-{}", TENS[rest / 10], ONES[rest % 10]));
        }
    }
    parts.join(" ")
}

// Runs too long for a u64 are read digit by digit.
fn spell_digit_run(digits: &str) -> String {
    match digits.parse::<u64>() {
        Ok(n) => spell_number(n),
        Err(_) => digits.chars().map(digit_word).collect::<Vec<_>>().join(" "),
    }
}

fn digit_word(c: char) -> &'static str {
    c.to_digit(10).map_or("", |d| ONES[d as usize])
}

fn is_thousands_group(chars: &[char], start: usize) -> bool {
    let end = start + 3;
    end <= chars.len()
        && chars[start..end].iter().all(char::is_ascii_digit)
        && chars.get(end).is_none_or(|c| !c.is_ascii_digit())
}

fn ordinal_suffix_len(chars: &[char], start: usize) -> Option<usize> {
    let suffix: String = chars
        .iter()
        .skip(start)
        .take(2)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let standalone = chars.get(start + 2).is_none_or(|c| !c.is_alphanumeric());
    (matches!(suffix.as_str(), "st" | "nd" | "rd" | "th") && standalone).then_some(2)
}

fn ordinal(cardinal: &str) -> String {
    let split = cardinal.rfind([' ', '-']).map_or(0, |idx| idx + 1);
    let (head, last) = cardinal.split_at(split);
    let last = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        word if word.ends_with('y') => format!("{}ieth", &word[..word.len() - 1]),
        word => format!("{}th", word),
    };
    format!("{}{}", head, last)
}
