/// Parse a byte size: `4194304`, `0x400000`, `4096K`, `4M`, `16MiB`.
///
/// Unit suffixes are binary (K = 1024) and case-insensitive.
pub(super) fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size".to_string());
    }

    let lower = s.to_ascii_lowercase();
    let (digits, multiplier) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex.to_string(), None)
    } else {
        let unit_start = lower
            .find(|c: char| !c.is_ascii_digit() && c != '_')
            .unwrap_or(lower.len());
        let (digits, unit) = lower.split_at(unit_start);
        let multiplier = match unit {
            "" | "b" => 1,
            "k" | "kb" | "kib" => 1024,
            "m" | "mb" | "mib" => 1024 * 1024,
            "g" | "gb" | "gib" => 1024 * 1024 * 1024,
            _ => return Err(format!("unknown size unit in '{s}'")),
        };
        (digits.to_string(), Some(multiplier))
    };

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(format!("missing digits in '{s}'"));
    }

    let radix = if multiplier.is_none() { 16 } else { 10 };
    let value = u64::from_str_radix(&cleaned, radix).map_err(|e| format!("'{s}': {e}"))?;
    let bytes = value
        .checked_mul(multiplier.unwrap_or(1))
        .filter(|&b| b <= u64::from(u32::MAX))
        .ok_or_else(|| format!("'{s}' exceeds the 32-bit address space"))?;
    Ok(bytes as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_decimal() {
        assert_eq!(parse_size("4194304"), Ok(4 * 1024 * 1024));
        assert_eq!(parse_size("4_096"), Ok(4096));
    }

    #[test]
    fn test_parse_size_hex() {
        assert_eq!(parse_size("0x1000000"), Ok(16 * 1024 * 1024));
        assert_eq!(parse_size("0X1000"), Ok(4096));
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("4K"), Ok(4096));
        assert_eq!(parse_size("16M"), Ok(16 * 1024 * 1024));
        assert_eq!(parse_size("16MiB"), Ok(16 * 1024 * 1024));
        assert_eq!(parse_size("2mb"), Ok(2 * 1024 * 1024));
    }

    #[test]
    fn test_parse_size_rejects() {
        assert!(parse_size("").is_err());
        assert!(parse_size("16Q").is_err());
        assert!(parse_size("0x").is_err());
        assert!(parse_size("M").is_err());
        assert!(parse_size("8G").is_err());
    }
}
