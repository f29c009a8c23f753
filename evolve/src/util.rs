use anyhow::{bail, ensure, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// `0x`-prefixed hex or decimal. `_` separators are accepted in both, so
/// seeds can be pasted as written in configs (`0x5EED_F1A9`).
pub fn parse_seed(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let digits: String = trimmed.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        bail!("empty seed");
    }
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => digits.parse::<u32>(),
    };
    parsed.with_context(|| format!("invalid seed: {trimmed}"))
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let seeds = input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_seed)
        .collect::<Result<Vec<_>>>()?;
    ensure!(!seeds.is_empty(), "no seeds in {input:?}");
    Ok(seeds)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed encoding {}", path.display()))?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}
