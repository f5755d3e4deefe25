// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rand::Rng;

/// Separators mixed between generated words
const SEPARATORS: &[char] = &[' ', ' ', ' ', ',', '.', ';'];

pub fn generate_random_word(rng: &mut impl Rng, max_length: usize) -> String {
    let length = rng.random_range(1..=max_length.max(1));
    (0..length)
        .map(|_| {
            let c = if rng.random_bool(0.1) {
                rng.random_range(b'A'..=b'Z')
            } else {
                rng.random_range(b'a'..=b'z')
            };
            c as char
        })
        .collect()
}

/// Random sentences of words separated by spaces and punctuation
pub fn generate_sentences(
    rng: &mut impl Rng,
    count: usize,
    max_words: usize,
    max_word_length: usize,
) -> Vec<String> {
    (0..count)
        .map(|_| {
            let words = rng.random_range(1..=max_words.max(1));
            let mut sentence = String::new();
            for index in 0..words {
                if index > 0 {
                    sentence.push(SEPARATORS[rng.random_range(0..SEPARATORS.len())]);
                }
                sentence.push_str(&generate_random_word(rng, max_word_length));
            }
            sentence
        })
        .collect()
}

/// Random `rows x cols` matrix with small integral entries
pub fn generate_matrix(rng: &mut impl Rng, rows: usize, cols: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| f64::from(rng.random_range(-9_i32..=9)))
                .collect()
        })
        .collect()
}
