//! Text normalization and sequence similarity used by the copy pre-check.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

/// Lowercases, strips accents and punctuation, and collapses whitespace.
///
/// Accents are removed by NFKD decomposition followed by dropping every
/// non-ASCII code point, so `"Répondez-moi !"` becomes `"repondez moi"`.
pub fn normalize_text(text: &str) -> String {
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();
    let cleaned: String = ascii
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two texts in `[0, 1]` after normalization.
///
/// Only the first `max_chars` normalized characters of each text are compared;
/// the match is quadratic in length.
pub fn similarity(a: &str, b: &str, max_chars: usize) -> f64 {
    let a: Vec<char> = normalize_text(a).chars().take(max_chars).collect();
    let b: Vec<char> = normalize_text(b).chars().take(max_chars).collect();
    sequence_ratio(&a, &b)
}

/// Ratcliff/Obershelp ratio: `2·M / T`, where `M` is the number of characters in
/// matching blocks and `T` the combined length. Two empty sequences are identical.
pub fn sequence_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(a, b) as f64 / total as f64
}

/// Sums the sizes of matching blocks found by repeatedly taking the longest common
/// substring and recursing into the unmatched pieces on either side.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b_index.entry(c).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, &b_index, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }
    matched
}

/// Longest block `a[i..i+size] == b[j..j+size]` inside the given windows.
/// Ties resolve to the earliest `i`, then the earliest `j`.
fn longest_match(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // run[k] = length of the match ending at a[i-1], b[b_lo+k-1]
    let mut run = vec![0usize; b_hi - b_lo + 1];
    let mut next = vec![0usize; b_hi - b_lo + 1];
    let mut touched: Vec<usize> = Vec::new();
    let mut next_touched: Vec<usize> = Vec::new();

    for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        if let Some(positions) = b_index.get(c) {
            for &j in positions {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }
                let k = j - b_lo;
                let size = run[k] + 1;
                next[k + 1] = size;
                next_touched.push(k + 1);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        for &k in &touched {
            run[k] = 0;
        }
        std::mem::swap(&mut run, &mut next);
        std::mem::swap(&mut touched, &mut next_touched);
        next_touched.clear();
    }
    (best_i, best_j, best_size)
}
