use std::path::Path;

/// Detect a programming language from a file extension
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let language = match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "swift" => "swift",
        "sql" => "sql",
        "sh" | "bash" => "shell",
        "md" | "markdown" | "mdx" => "markdown",
        "html" | "htm" => "html",
        "css" | "scss" => "css",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        _ => return None,
    };
    Some(language)
}

/// Marker strings per framework, checked in order
const FRAMEWORK_MARKERS: &[(&str, &[&str])] = &[
    ("next.js", &["from 'next/", "from \"next/", "getServerSideProps"]),
    ("react", &["from 'react'", "from \"react\"", "import React"]),
    ("vue", &["from 'vue'", "from \"vue\"", "<template>"]),
    ("express", &["require('express')", "require(\"express\")", "from 'express'"]),
    ("django", &["from django", "import django"]),
    ("flask", &["from flask", "Flask(__name__)"]),
    ("fastapi", &["from fastapi", "FastAPI()"]),
    ("spring", &["org.springframework"]),
    ("rails", &["Rails.application", "ActiveRecord::"]),
    ("axum", &["axum::"]),
    ("actix-web", &["actix_web"]),
];

/// Detect a framework from characteristic imports in the content
pub fn detect_framework(content: &str) -> Option<&'static str> {
    FRAMEWORK_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| content.contains(m)))
        .map(|(name, _)| *name)
}

/// Check if content appears to be binary
pub fn is_binary_content(data: &[u8]) -> bool {
    let check_len = std::cmp::min(data.len(), 8192);
    data[..check_len].contains(&0)
}

/// Check if a file should be skipped during indexing
pub fn should_skip_file(path: &Path) -> bool {
    const SKIP_EXTENSIONS: &[&str] = &[
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "mp3", "mp4", "wav", "ogg",
        "webm", "avi", "mov", "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "exe", "dll", "so",
        "dylib", "bin", "woff", "woff2", "ttf", "otf", "eot", "pyc", "pyo", "class", "o", "obj",
        "lock", "pdf", "db", "sqlite",
    ];

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if SKIP_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return true;
        }
    }

    // Known source extensions can collide with media types (".ts")
    if detect_language(path).is_some() {
        return false;
    }

    match mime_guess::from_path(path).first() {
        Some(mime) => matches!(mime.type_().as_str(), "image" | "audio" | "video" | "font"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("src/main.rs")), Some("rust"));
        assert_eq!(detect_language(Path::new("app/Booking.TSX")), Some("typescript"));
        assert_eq!(detect_language(Path::new("Makefile")), None);
        assert_eq!(detect_language(Path::new("photo.png")), None);
    }

    #[test]
    fn test_detect_framework() {
        assert_eq!(
            detect_framework("import React from 'react';\nexport default App;"),
            Some("react")
        );
        assert_eq!(
            detect_framework("import { useRouter } from 'next/router';\nimport React from 'react';"),
            Some("next.js")
        );
        assert_eq!(detect_framework("use axum::Router;"), Some("axum"));
        assert_eq!(detect_framework("print('hello')"), None);
    }

    #[test]
    fn test_skip_and_binary() {
        assert!(should_skip_file(Path::new("logo.png")));
        assert!(should_skip_file(Path::new("Cargo.lock")));
        assert!(!should_skip_file(Path::new("README.md")));
        assert!(!should_skip_file(Path::new("src/lib.rs")));
        assert!(is_binary_content(b"abc\0def"));
        assert!(!is_binary_content(b"plain text"));
    }
}
