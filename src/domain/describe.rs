//! Label inference for entries that only carry a name.

/// Title-case every alphabetic run: first letter upper, rest lower.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Label derived from a bare field name
pub fn default_description(name: &str) -> String {
    title_case(name.replace('_', " ").trim())
}

/// Label for a list column.
///
/// Precedence: the model's verbose name for `__str__`, then an explicit
/// label supplied by the host, then the field name itself.
pub fn column_description(
    name: &str,
    explicit: Option<&str>,
    model_verbose_name: Option<&str>,
) -> String {
    if name == "__str__" {
        if let Some(verbose) = model_verbose_name {
            return title_case(verbose.trim());
        }
    }
    match explicit {
        Some(label) => title_case(label.trim()),
        None => default_description(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("email address"), "Email Address");
        assert_eq!(title_case("E-MAIL"), "E-Mail");
        assert_eq!(title_case("id2x"), "Id2X");
    }

    #[test]
    fn test_default_description() {
        assert_eq!(default_description("is_staff"), "Is Staff");
        assert_eq!(default_description("_private_"), "Private");
    }

    #[test]
    fn test_column_description_precedence() {
        assert_eq!(column_description("__str__", None, Some("blog post")), "Blog Post");
        assert_eq!(column_description("__str__", None, None), "Str");
        assert_eq!(column_description("full_name", Some(" author name "), None), "Author Name");
        assert_eq!(column_description("full_name", None, None), "Full Name");
    }
}
