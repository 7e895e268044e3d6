use std::collections::HashMap;

/// Render a message template by replacing `{field}` tokens with values from `fields`.
///
/// Notes:
/// - Every occurrence of a known token is replaced, not just the first.
/// - Unknown tokens are left intact (`"Hi {name}"` stays as is when `name` is absent).
/// - Token names are matched exactly; `{ name }` is not a placeholder.
/// - A `{` without a closing `}` is copied through verbatim.
pub fn render(template: &str, fields: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('}') {
            Some(end) => match fields.get(&after[..end]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    // Not ours: emit the brace and rescan from the next character so
                    // "{{name}" still resolves the inner token.
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn renders_name_and_headline() {
        let f = fields(&[("name", "Ava"), ("headline", "Engineer")]);
        assert_eq!(render("Hi {name}, {headline}", &f), "Hi Ava, Engineer");
    }

    #[test]
    fn unresolved_placeholder_is_preserved() {
        assert_eq!(render("Hi {name}", &HashMap::new()), "Hi {name}");
    }

    #[test]
    fn replaces_every_occurrence() {
        let f = fields(&[("name", "Ava")]);
        assert_eq!(render("{name}! {name}?", &f), "Ava! Ava?");
    }

    #[test]
    fn nested_and_unterminated_braces() {
        let f = fields(&[("name", "Ava")]);
        assert_eq!(render("{{name}}", &f), "{Ava}");
        assert_eq!(render("Hi {name", &f), "Hi {name");
        assert_eq!(render("{}", &f), "{}");
    }

    #[test]
    fn values_are_not_rescanned() {
        let f = fields(&[("name", "{headline}"), ("headline", "Engineer")]);
        assert_eq!(render("{name}", &f), "{headline}");
    }

    #[test]
    fn multibyte_text_survives() {
        let f = fields(&[("name", "Zoë")]);
        assert_eq!(render("Salut {name} 👋", &f), "Salut Zoë 👋");
    }
}
