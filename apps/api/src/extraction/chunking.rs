//! Recursive character splitter for CV text.
//!
//! Text is broken at the coarsest separator that yields pieces no longer than
//! `chunk_size` characters (paragraphs, then lines, sentences, words, and
//! finally raw characters). Pieces are then merged greedily into chunks, and
//! each new chunk starts with up to `chunk_overlap` characters carried over
//! from the end of the previous one.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::models::cv::CvChunk;

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// Splits `text` into chunks of at most `chunk_size` characters.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.trim().is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    split_recursive(text, chunk_size, SEPARATORS, &mut pieces);
    merge_pieces(pieces, chunk_size, chunk_overlap.min(chunk_size.saturating_sub(1)))
}

/// Splits a CV into embeddable chunks. Every chunk is prefixed with the
/// candidate's name so retrieved context always names its owner.
pub fn build_chunks(
    cv_id: Uuid,
    candidate_name: &str,
    filename: &str,
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<CvChunk> {
    split_text(text, chunk_size, chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(index, piece)| CvChunk {
            id: Uuid::new_v4(),
            cv_id,
            candidate_name: candidate_name.to_string(),
            filename: filename.to_string(),
            chunk_index: index as u32,
            text: format!("Candidate Name is {candidate_name}\n\n{piece}"),
            embedding: Vec::new(),
        })
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_recursive<'a>(
    text: &'a str,
    chunk_size: usize,
    separators: &[&str],
    out: &mut Vec<&'a str>,
) {
    if char_len(text) <= chunk_size {
        out.push(text);
        return;
    }

    let Some(position) = separators.iter().position(|sep| text.contains(sep)) else {
        split_by_chars(text, chunk_size, out);
        return;
    };
    let separator = separators[position];
    let finer = &separators[position + 1..];

    for piece in text.split_inclusive(separator) {
        if char_len(piece) <= chunk_size {
            out.push(piece);
        } else {
            split_recursive(piece, chunk_size, finer, out);
        }
    }
}

fn split_by_chars<'a>(text: &'a str, chunk_size: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}

fn merge_pieces(pieces: Vec<&str>, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut window_len = 0usize;
    // Set once a piece with visible text joins the window; overlap carried
    // over from the previous chunk never sets it.
    let mut fresh = false;

    for piece in pieces {
        let len = char_len(piece);

        if window_len + len > chunk_size && !window.is_empty() {
            if fresh {
                push_chunk(&mut chunks, &window);
                fresh = false;
            }
            while window_len > chunk_overlap || (window_len > 0 && window_len + len > chunk_size) {
                if let Some((_, dropped)) = window.pop_front() {
                    window_len -= dropped;
                }
            }
        }

        window.push_back((piece, len));
        window_len += len;
        fresh |= !piece.trim().is_empty();
    }

    if fresh {
        push_chunk(&mut chunks, &window);
    }

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
