/// BCP-47-ish normalization: 3-letter ISO-639-2 codes collapse to their
/// 2-letter ISO-639-1 equivalent, `"und"` collapses to empty, a 4-letter
/// alphabetic subtag after the primary language is treated as a script
/// (title-cased), and a following 2-letter alpha or 3-digit numeric subtag
/// is treated as a region (upper-cased). Anything after that is lower-cased
/// and passed through unchanged.
pub fn normalize_language_code(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return String::new();
    }
    let code = code.replace('_', "-");
    let parts: Vec<&str> = code.split('-').collect();
    if parts.is_empty() {
        return code;
    }
    let mut lang = parts[0].to_lowercase();
    if lang == "und" {
        return String::new();
    }
    lang = map_3_to_2(&lang).unwrap_or(lang);

    let mut out = vec![lang];
    let mut i = 1;
    if i < parts.len() && is_alpha(parts[i]) && parts[i].len() == 4 {
        let s = parts[i];
        let mut chars = s.chars();
        let first = chars.next().unwrap().to_ascii_uppercase();
        let rest: String = chars.collect::<String>().to_lowercase();
        out.push(format!("{}{}", first, rest));
        i += 1;
    }
    if i < parts.len()
        && ((is_alpha(parts[i]) && parts[i].len() == 2)
            || (is_digit(parts[i]) && parts[i].len() == 3))
    {
        out.push(parts[i].to_uppercase());
        i += 1;
    }
    while i < parts.len() {
        let p = parts[i].trim();
        if !p.is_empty() {
            out.push(p.to_lowercase());
        }
        i += 1;
    }
    out.join("-")
}

/// Full display name for a language code, e.g. `"eng"` -> `"English"`,
/// `"fre-CA"` -> `"French (CA)"`. Falls back to the original, unnormalized
/// code when the primary subtag has no entry in `language_names`.
pub fn format_language(code: &str) -> String {
    let normalized = normalize_language_code(code);
    if normalized.is_empty() {
        return String::new();
    }
    let parts: Vec<&str> = normalized.split('-').collect();
    let Some(name) = language_name(parts[0]) else {
        return code.to_string();
    };
    if parts.len() > 1 {
        format!("{} ({})", name, parts[1].to_uppercase())
    } else {
        name.to_string()
    }
}

fn language_name(lang: &str) -> Option<&'static str> {
    Some(match lang {
        "en" => "English",
        "fr" => "French",
        "es" => "Spanish",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        _ => return None,
    })
}

fn map_3_to_2(lang: &str) -> Option<String> {
    Some(
        match lang {
            "eng" => "en",
            "fra" | "fre" => "fr",
            "spa" => "es",
            "deu" | "ger" => "de",
            "ita" => "it",
            "por" => "pt",
            _ => return None,
        }
        .to_string(),
    )
}

fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_digit(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_3_to_2_letter() {
        assert_eq!(normalize_language_code("eng"), "en");
        assert_eq!(normalize_language_code("fre"), "fr");
    }

    #[test]
    fn und_collapses_to_empty() {
        assert_eq!(normalize_language_code("und"), "");
    }

    #[test]
    fn script_and_region_subtags() {
        assert_eq!(normalize_language_code("zh-hant-tw"), "zh-Hant-TW");
        assert_eq!(normalize_language_code("en_US"), "en-US");
    }

    #[test]
    fn full_names() {
        assert_eq!(format_language("eng"), "English");
        assert_eq!(format_language("fre-CA"), "French (CA)");
        assert_eq!(format_language("und"), "");
        assert_eq!(format_language("xyz"), "xyz");
    }

    #[test]
    fn is_idempotent() {
        for code in ["eng", "und", "zh-hant-tw", "en_US", "", "pt-BR-variant"] {
            let once = normalize_language_code(code);
            let twice = normalize_language_code(&once);
            assert_eq!(once, twice, "not idempotent for {code:?}");
        }
    }
}
