/// Case-insensitive substring match of any non-blank keyword against `text`.
pub fn contains_any_keyword(text: &str, keywords: &[String]) -> bool {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .any(|k| haystack.contains(&k.to_lowercase()))
}

/// Join hashtags as `#a #b`, adding the leading `#` where missing and dropping blanks.
pub fn format_hashtags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}
