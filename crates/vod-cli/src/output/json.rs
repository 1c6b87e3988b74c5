//! JSON output formatting

use anyhow::Result;
use serde::Serialize;

/// Serialize a value, honoring `--pretty`
pub fn to_string<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

/// Print a value as one JSON document
pub fn print<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    println!("{}", to_string(value, pretty)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vod_core::SeriesPoint;

    #[test]
    fn test_compact_and_pretty() {
        let points = vec![SeriesPoint::new("2023-01-01", 2)];
        assert_eq!(to_string(&points, false).unwrap(), r#"[{"x":"2023-01-01","y":2}]"#);
        assert!(to_string(&points, true).unwrap().contains("\n  {"));
    }
}
