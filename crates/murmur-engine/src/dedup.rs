//! Post-processing pass that removes near-duplicate sentences, a common
//! artifact of greedy decoding on repetitive audio.

use murmur_core::TextSpan;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Drop sentences that exactly match, or are more than 80% similar to, a
/// sentence already kept. The first occurrence wins.
pub fn suppress_repetitions(text: &str) -> String {
    let mut kept: Vec<String> = Vec::new();
    let mut kept_norm: Vec<String> = Vec::new();

    for sentence in split_sentences(text) {
        let norm = normalize(&sentence);
        if norm.is_empty() {
            continue;
        }
        if is_duplicate(&kept_norm, &norm) {
            continue;
        }
        kept.push(sentence.trim().to_string());
        kept_norm.push(norm);
    }
    kept.join(" ")
}

/// The same rule over timestamped spans; the earlier occurrence keeps its
/// timestamps.
pub fn dedup_spans(spans: Vec<TextSpan>) -> Vec<TextSpan> {
    let mut kept: Vec<TextSpan> = Vec::new();
    let mut kept_norm: Vec<String> = Vec::new();

    for span in spans {
        let norm = normalize(&span.text);
        if !norm.is_empty() && is_duplicate(&kept_norm, &norm) {
            continue;
        }
        kept_norm.push(norm);
        kept.push(span);
    }
    kept
}

fn is_duplicate(kept: &[String], candidate: &str) -> bool {
    kept.iter()
        .any(|k| k == candidate || similarity(k, candidate) > SIMILARITY_THRESHOLD)
}

/// Split on terminal punctuation, keeping the delimiter with its sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?' | '…') {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        out.push(current);
    }
    out
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein(a, b)) as f64 / max_len as f64
}

/// Two-row edit distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
