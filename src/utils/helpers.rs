//! Helper utility functions for file names

/// Check if a reference is a URL rather than a file inside the extension
pub fn is_url(path: &str) -> bool {
    path.contains("://")
}

/// Drop a `?query` or `#fragment` suffix from a manifest file reference
pub fn strip_query(path: &str) -> &str {
    match path.find(|c| c == '?' || c == '#') {
        Some(index) => &path[..index],
        None => path,
    }
}

/// Normalize a relative file name: forward slashes, no leading `/` or `./`,
/// `.` and `..` segments resolved.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// True when `..` segments climb above the directory the path is relative to
pub fn escapes_root(path: &str) -> bool {
    let mut depth = 0usize;
    for segment in path.replace('\\', "/").split('/') {
        match segment {
            "" | "." => {}
            ".." => match depth.checked_sub(1) {
                Some(parent) => depth = parent,
                None => return true,
            },
            _ => depth += 1,
        }
    }
    false
}

/// Remove the extension of the last path segment (`src/app.ts` -> `src/app`)
pub fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(0) | None => path,
        Some(dot) => &path[..name_start + dot],
    }
}

/// Identifier a manifest-declared file is registered under
pub fn output_identifier(path: &str) -> String {
    strip_extension(&normalize_path(strip_query(path))).to_string()
}

/// Identifier a content-script stylesheet is registered under. The extension is kept so a
/// script and a stylesheet sharing a stem (`content.ts`, `content.css`) stay distinct entries.
pub fn style_identifier(path: &str) -> String {
    normalize_path(strip_query(path))
}

/// File name without directories or extension (`a/icon.png` -> `icon`)
pub fn file_stem(path: &str) -> String {
    let normalized = normalize_path(strip_query(path));
    let name = normalized.rsplit('/').next().unwrap_or_default();
    strip_extension(name).to_string()
}

/// Swap the extension of a file name, adding one if it had none
pub fn replace_extension(path: &str, extension: &str) -> String {
    format!("{}.{}", strip_extension(path), extension)
}

/// Root-relative URL path for a file (`bg.js` -> `/bg.js`); URLs pass through
pub fn root_relative(path: &str) -> String {
    if is_url(path) {
        path.to_string()
    } else {
        format!("/{}", normalize_path(path))
    }
}

/// True when `candidate` is `identifier` or ends with it on a segment boundary
pub fn matches_identifier(candidate: &str, identifier: &str) -> bool {
    candidate == identifier
        || candidate
            .strip_suffix(identifier)
            .map(|prefix| prefix.ends_with('/'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("src/popup.html?tab=1", "src/popup.html" ; "query")]
    #[test_case("page.html#top", "page.html" ; "fragment")]
    #[test_case("plain.html", "plain.html" ; "untouched")]
    fn test_strip_query(input: &str, expected: &str) {
        assert_eq!(strip_query(input), expected);
    }

    #[test_case("./src/app.ts", "src/app.ts" ; "dot prefix")]
    #[test_case("/src/app.ts", "src/app.ts" ; "leading slash")]
    #[test_case("src\\win\\app.ts", "src/win/app.ts" ; "backslashes")]
    #[test_case("src/../lib/./app.ts", "lib/app.ts" ; "parent segments")]
    fn test_normalize_path(input: &str, expected: &str) {
        assert_eq!(normalize_path(input), expected);
    }

    #[test]
    fn test_output_identifier() {
        assert_eq!(output_identifier("src/popup.html?x=1"), "src/popup");
        assert_eq!(output_identifier("./content.ts"), "content");
        assert_eq!(output_identifier("dir.v2/noext"), "dir.v2/noext");
        assert_eq!(output_identifier(".hidden/.env"), ".hidden/.env");
    }

    #[test]
    fn test_style_identifier_keeps_extension() {
        assert_eq!(style_identifier("./src/content.css?inline"), "src/content.css");
        assert_ne!(style_identifier("src/content.css"), output_identifier("src/content.ts"));
    }

    #[test_case("../x.js", true ; "parent of root")]
    #[test_case("a/../../x.js", true ; "climbs past root")]
    #[test_case("a/../x.js", false ; "stays inside")]
    #[test_case("/assets/x.js", false ; "leading slash")]
    #[test_case("..\\x.js", true ; "backslash parent")]
    fn test_escapes_root(path: &str, expected: bool) {
        assert_eq!(escapes_root(path), expected);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("a/icon.png"), "icon");
        assert_eq!(file_stem("b/icon.png"), "icon");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
    }

    #[test]
    fn test_replace_extension() {
        assert_eq!(replace_extension("src/inject.ts", "js"), "src/inject.js");
        assert_eq!(replace_extension("styles/theme", "css"), "styles/theme.css");
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(root_relative("bg.js"), "/bg.js");
        assert_eq!(root_relative("./src/bg.js"), "/src/bg.js");
        assert_eq!(root_relative("http://localhost:5173/@vite/env"), "http://localhost:5173/@vite/env");
    }

    #[test]
    fn test_matches_identifier() {
        assert!(matches_identifier("assets/icon", "icon"));
        assert!(matches_identifier("icon", "icon"));
        assert!(!matches_identifier("assets/bigicon", "icon"));
    }
}
