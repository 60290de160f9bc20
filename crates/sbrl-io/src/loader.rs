//! Parses the two-file text format (spec §6): a header of
//! `n_items:`/`n_samples:` lines followed by one `<feature> <bits>` line
//! per candidate rule or class label.

use std::io::{BufRead, BufReader};
use std::path::Path;

use sbrl_core::{cardinality_from_feature, BitVector, ClassLabel, Rule};

use crate::error::{IoError, IoResult};

struct Header {
    n_items: usize,
    n_samples: usize,
}

fn open(path: &Path) -> IoResult<BufReader<std::fs::File>> {
    std::fs::File::open(path)
        .map(BufReader::new)
        .map_err(|source| IoError::Read {
            path: path.display().to_string(),
            source,
        })
}

fn parse_header_line<'a>(path: &Path, line: &'a str, key: &str) -> IoResult<&'a str> {
    let prefix = format!("{key}:");
    line.strip_prefix(&prefix).map(str::trim).ok_or_else(|| IoError::Format {
        path: path.display().to_string(),
        reason: format!("expected `{prefix}` header, found `{line}`"),
    })
}

fn parse_count(path: &Path, text: &str, key: &str) -> IoResult<usize> {
    text.parse::<usize>().map_err(|_| IoError::Format {
        path: path.display().to_string(),
        reason: format!("`{key}` value `{text}` is not a valid non-negative integer"),
    })
}

fn read_header(path: &Path, reader: &mut impl BufRead) -> IoResult<Header> {
    let mut n_items_line = String::new();
    let mut n_samples_line = String::new();
    reader.read_line(&mut n_items_line).map_err(|source| IoError::Read {
        path: path.display().to_string(),
        source,
    })?;
    reader.read_line(&mut n_samples_line).map_err(|source| IoError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let n_items_text = parse_header_line(path, n_items_line.trim_end(), "n_items")?;
    let n_samples_text = parse_header_line(path, n_samples_line.trim_end(), "n_samples")?;
    Ok(Header {
        n_items: parse_count(path, n_items_text, "n_items")?,
        n_samples: parse_count(path, n_samples_text, "n_samples")?,
    })
}

/// Splits `line` into `(feature, bits)` on the first single space or tab,
/// as spec §6 requires either separator be accepted.
fn split_feature_and_bits<'a>(path: &Path, line: &'a str) -> IoResult<(&'a str, &'a str)> {
    let split_at = line
        .find(|c: char| c == ' ' || c == '\t')
        .ok_or_else(|| IoError::Format {
            path: path.display().to_string(),
            reason: format!("line `{line}` is missing the feature/bit-string separator"),
        })?;
    Ok((&line[..split_at], line[split_at + 1..].trim_start()))
}

fn parse_bits(path: &Path, bits: &str, n_samples: usize) -> IoResult<BitVector> {
    let truthtable = BitVector::from_string(bits)?;
    if truthtable.len() != n_samples {
        return Err(IoError::Format {
            path: path.display().to_string(),
            reason: format!(
                "bit-string has {} bits, expected n_samples={n_samples}",
                truthtable.len()
            ),
        });
    }
    Ok(truthtable)
}

/// Loads the candidate-rule file, prepending the synthetic all-ones
/// default rule (id 0) per spec §6. Returns the rules and the
/// file-declared sample count.
pub fn load_rules(path: impl AsRef<Path>) -> IoResult<(Vec<Rule>, usize)> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let header = read_header(path, &mut reader)?;

    let mut rules = Vec::with_capacity(header.n_items + 1);
    rules.push(Rule::default_rule(header.n_samples)?);

    let mut line = String::new();
    for id in 1..=header.n_items {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|source| IoError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if read == 0 {
            return Err(IoError::Format {
                path: path.display().to_string(),
                reason: format!("unexpected EOF: expected {} rule lines, found {}", header.n_items, id - 1),
            });
        }
        let (feature, bits) = split_feature_and_bits(path, line.trim_end_matches(['\n', '\r']))?;
        let truthtable = parse_bits(path, bits, header.n_samples)?;
        let cardinality = cardinality_from_feature(feature);
        rules.push(Rule::new(id, feature.to_string(), cardinality, truthtable)?);
    }
    Ok((rules, header.n_samples))
}

/// Loads the class-label file. No default entry is prepended (spec §6).
pub fn load_labels(path: impl AsRef<Path>, expected_n_samples: usize) -> IoResult<Vec<ClassLabel>> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let header = read_header(path, &mut reader)?;
    if header.n_samples != expected_n_samples {
        return Err(IoError::Format {
            path: path.display().to_string(),
            reason: format!(
                "n_samples={} disagrees with the rules file's n_samples={expected_n_samples}",
                header.n_samples
            ),
        });
    }

    let mut labels = Vec::with_capacity(header.n_items);
    let mut line = String::new();
    for id in 0..header.n_items {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|source| IoError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if read == 0 {
            return Err(IoError::Format {
                path: path.display().to_string(),
                reason: format!("unexpected EOF: expected {} label lines, found {id}", header.n_items),
            });
        }
        let (_feature, bits) = split_feature_and_bits(path, line.trim_end_matches(['\n', '\r']))?;
        let truthtable = parse_bits(path, bits, header.n_samples)?;
        labels.push(ClassLabel::new(id, truthtable));
    }
    Ok(labels)
}

/// Loads both files and checks their sample counts agree.
pub fn load_dataset(
    rules_path: impl AsRef<Path>,
    labels_path: impl AsRef<Path>,
) -> IoResult<(Vec<Rule>, Vec<ClassLabel>, usize)> {
    let (rules, n_samples) = load_rules(rules_path)?;
    let labels = load_labels(labels_path, n_samples)?;
    Ok((rules, labels, n_samples))
}
