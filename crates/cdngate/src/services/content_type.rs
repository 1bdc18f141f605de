//! Content type inference from blob names

/// Extension of a blob name: everything after the last dot.
///
/// `None` only when the name has no dot at all; `"notes."` yields `Some("")`.
fn extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|pos| &name[pos + 1..])
}

/// Guess content type from the blob name extension.
///
/// Matching is case-sensitive. Any extension outside the known set maps to
/// `text/plain`; a name without extension yields `None`.
pub fn guess_content_type(name: &str) -> Option<&'static str> {
    let content_type = match extension(name)? {
        "js" => "application/javascript",
        "css" => "text/css",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "text/plain",
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        let tests = vec![
            ("app.js", "application/javascript"),
            ("site.css", "text/css"),
            ("logo.png", "image/png"),
            ("photo.jpg", "image/jpeg"),
            ("photo.jpeg", "image/jpeg"),
            ("notes.txt", "text/plain"),
            ("data.json", "text/plain"),
            ("archive.tar.gz", "text/plain"),
            ("bundle.min.js", "application/javascript"),
        ];

        for (name, expected) in tests {
            assert_eq!(guess_content_type(name), Some(expected), "Failed for {}", name);
        }
    }

    #[test]
    fn test_guess_content_type_is_case_sensitive() {
        assert_eq!(guess_content_type("LOGO.PNG"), Some("text/plain"));
        assert_eq!(guess_content_type("App.JS"), Some("text/plain"));
    }

    #[test]
    fn test_guess_content_type_without_extension() {
        assert_eq!(guess_content_type("readme"), None);
        assert_eq!(guess_content_type(""), None);
    }

    #[test]
    fn test_trailing_dot_is_an_empty_extension() {
        assert_eq!(extension("notes."), Some(""));
        assert_eq!(guess_content_type("notes."), Some("text/plain"));
    }

    #[test]
    fn test_extension_uses_last_dot() {
        assert_eq!(extension("css/site.v2.css"), Some("css"));
        assert_eq!(extension("v1.2/readme"), Some("2/readme"));
    }
}
