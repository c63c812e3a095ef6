//! Path transformation primitives.
//!
//! # Responsibilities
//! - Strip leading path segments (segment-wise, never substring)
//! - Derive a route's base path from a `Path=` predicate string
//! - Compose context paths, collapsing duplicate slashes
//! - Apply regex rewrites with named capture groups
//!
//! # Design Decisions
//! - Pure functions over `&str`; no shared state
//! - A fully stripped path collapses to "/" rather than ""
//! - A rewrite that matches nothing returns the input unchanged

use regex::Regex;

/// Remove the first `n` segments of `path`.
///
/// Stripping is segment-wise: `strip_prefix("/api/peliculas", 1)` yields
/// `/peliculas`, never a substring cut. Stripping more segments than the
/// path has yields `/`. `n = 0` returns the path unchanged.
pub fn strip_prefix(path: &str, n: usize) -> String {
    if n == 0 {
        return path.to_string();
    }
    let mut parts: Vec<&str> = path.split('/').collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    let remaining: Vec<&str> = parts.into_iter().skip(1 + n).collect();
    if remaining.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", remaining.join("/"))
    }
}

/// Derive the base path from a `Path=` predicate string.
///
/// Strips the key and surrounding quotes if present, removes a trailing
/// `/**` or `/*`, ensures a leading slash, and drops a trailing slash
/// except for the root. A string without `=` is returned unchanged.
pub fn base_from_predicate(predicate: &str) -> String {
    let eq = match predicate.find('=') {
        Some(i) => i,
        None => return predicate.to_string(),
    };
    let mut value = predicate[eq + 1..].trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    value = value.strip_suffix("/**").unwrap_or(value);
    value = value.strip_suffix("/*").unwrap_or(value);
    let mut base = if value.starts_with('/') {
        value.to_string()
    } else {
        format!("/{}", value)
    };
    if base.len() > 1 && base.ends_with('/') {
        base.pop();
    }
    base
}

/// Join a context path and a controller path, collapsing runs of `/`.
///
/// A blank context contributes nothing; a context without a leading
/// slash gets one.
pub fn compose_context_path(context: &str, path: &str) -> String {
    let context = context.trim();
    let normalized = if context.is_empty() {
        String::new()
    } else if context.starts_with('/') {
        context.to_string()
    } else {
        format!("/{}", context)
    };

    let mut composed = String::with_capacity(normalized.len() + path.len());
    let mut previous_was_slash = false;
    for ch in normalized.chars().chain(path.chars()) {
        if ch == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        composed.push(ch);
    }
    composed
}

/// Rewrite `path` by applying `pattern` and substituting capture groups
/// (`${name}`) into `replacement`. No match leaves the path untouched.
pub fn rewrite_path(pattern: &Regex, replacement: &str, path: &str) -> String {
    pattern.replace_all(path, replacement).into_owned()
}
