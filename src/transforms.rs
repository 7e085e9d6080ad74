//! Transform collaborators: the pure, synchronous `String -> Option<String>`
//! functions each stage runs over every non-sentinel item it receives.
//!
//! `None` means the item is dropped — the worker logs it at `warn` and moves
//! on (see [`crate::stage`]). None of these six collaborators ever produce
//! it; the return type stays `Option<String>` so a future collaborator (or a
//! test double) can opt into dropping without changing the `Transform`
//! signature.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A stage's transform: consumes the item, produces a fresh one or drops it.
pub type Transform = Arc<dyn Fn(String) -> Option<String> + Send + Sync>;

/// Upper-cases ASCII alphabetic bytes; everything else passes through as-is.
pub fn uppercase(line: String) -> Option<String> {
    Some(line.chars().map(|c| c.to_ascii_uppercase()).collect())
}

/// Reverses the line by Unicode scalar value.
pub fn flip(line: String) -> Option<String> {
    Some(line.chars().rev().collect())
}

/// Moves the last character to the front, shifting everything else right
/// by one position. Empty lines pass through unchanged.
pub fn rotate(line: String) -> Option<String> {
    if line.is_empty() {
        return Some(line);
    }
    let mut chars: Vec<char> = line.chars().collect();
    let last = chars.pop().expect("checked non-empty above");
    chars.insert(0, last);
    Some(chars.into_iter().collect())
}

/// Inserts a single space after every character except the last.
pub fn expand(line: String) -> Option<String> {
    if line.is_empty() {
        return Some(line);
    }
    let mut out = String::with_capacity(line.len() * 2);
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if chars.peek().is_some() {
            out.push(' ');
        }
    }
    Some(out)
}

/// Writes the line to standard output prefixed with `[logger] `, then passes
/// it through unchanged.
pub fn logger(line: String) -> Option<String> {
    println!("[logger] {line}");
    Some(line)
}

/// Writes the line to standard output one character at a time, 100ms apart,
/// followed by a newline, then passes it through unchanged.
pub fn typewriter(line: String) -> Option<String> {
    let mut stdout = io::stdout();
    for c in line.chars() {
        print!("{c}");
        let _ = stdout.flush();
        thread::sleep(Duration::from_millis(100));
    }
    println!();
    Some(line)
}

/// Resolves a stage name (as accepted on the `analyzer` command line) to its
/// transform collaborator. Returns `None` for an unrecognized name.
///
/// A C implementation of this stage once shipped with its internal name
/// misspelled `expender` despite the file itself being `expander.c`; that
/// was a bug, not a feature, so only the correct spelling is accepted here.
pub fn resolve(name: &str) -> Option<Transform> {
    let transform: Transform = match name {
        "uppercaser" => Arc::new(uppercase),
        "flipper" => Arc::new(flip),
        "rotator" => Arc::new(rotate),
        "expander" => Arc::new(expand),
        "logger" => Arc::new(logger),
        "typewriter" => Arc::new(typewriter),
        _ => return None,
    };
    Some(transform)
}

/// The stage names `resolve` accepts, in the order the `analyzer --help`
/// usage text lists them.
pub const STAGE_NAMES: &[&str] = &[
    "uppercaser",
    "flipper",
    "rotator",
    "expander",
    "logger",
    "typewriter",
];
