//! Case and diacritic normalization for slugs.

/// Lowercase, fold diacritics and language-specific letters to base Latin,
/// and turn every other character into a hyphen separator. Repeated
/// hyphens collapse and leading/trailing hyphens are trimmed.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for ch in raw.chars().flat_map(char::to_lowercase) {
        if is_combining_mark(ch) {
            continue;
        }
        match fold_letter(ch) {
            Some(folded) => out.push_str(folded),
            None if ch.is_ascii_lowercase() || ch.is_ascii_digit() => out.push(ch),
            None => out.push('-'),
        }
    }

    collapse_hyphens(&out)
}

/// Collapse runs of `-` and trim them from both ends.
pub fn collapse_hyphens(value: &str) -> String {
    value
        .split('-')
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Combining Diacritical Marks block (decomposed accents).
fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&ch)
}

fn fold_letter(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ą' => "a",
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ę' | 'ė' => "e",
        'í' | 'ì' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' | 'ő' => "o",
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ñ' | 'ń' => "n",
        'ç' | 'ć' | 'č' => "c",
        'š' | 'ś' => "s",
        'ž' | 'ź' | 'ż' => "z",
        'ł' => "l",
        'ø' => "o",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        _ => return None,
    };
    Some(folded)
}
