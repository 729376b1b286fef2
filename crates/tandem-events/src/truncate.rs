//! Pure truncation helpers used by event constructors.

/// Maximum rendered argument length in events.
const MAX_ARGS_CHARS: usize = 500;
/// Maximum rendered result length in events.
const MAX_RESULT_CHARS: usize = 1_000;

/// Truncate rendered tool arguments with a single cap.
#[must_use]
pub fn truncate_args(args: &str) -> String {
    if args.len() <= MAX_ARGS_CHARS {
        return args.to_string();
    }
    let cut = floor_char_boundary(args, MAX_ARGS_CHARS);
    format!("{}… ({} chars total)", &args[..cut], args.len())
}

/// Truncate a rendered tool result, keeping head and tail.
#[must_use]
pub fn truncate_result(result: &str) -> String {
    if result.len() <= MAX_RESULT_CHARS {
        return result.to_string();
    }
    let half = MAX_RESULT_CHARS.div_euclid(2);
    let head_end = floor_char_boundary(result, half);
    let tail_start = ceil_char_boundary(result, result.len().saturating_sub(half));
    format!(
        "{}… ({} chars elided) …{}",
        &result[..head_end],
        tail_start.saturating_sub(head_end),
        &result[tail_start..]
    )
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx = idx.saturating_sub(1);
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx = idx.saturating_add(1);
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_strings_pass_through() {
        assert_eq!(truncate_args("{}"), "{}");
        assert_eq!(truncate_result("ok"), "ok");
    }

    #[test]
    fn test_args_single_cap() {
        let long = "x".repeat(2_000);
        let out = truncate_args(&long);
        assert!(out.len() < 600);
        assert!(out.contains("2000 chars total"));
    }

    #[test]
    fn test_result_keeps_head_and_tail() {
        let long = format!("HEAD{}TAIL", "m".repeat(5_000));
        let out = truncate_result(&long);
        assert!(out.starts_with("HEAD"));
        assert!(out.ends_with("TAIL"));
        assert!(out.contains("elided"));
        assert!(out.len() < 1_200);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(3_000);
        let out = truncate_result(&long);
        assert!(out.len() < 1_300);
        // Must not panic on non-ASCII boundaries, and output stays valid UTF-8.
        assert!(out.chars().count() > 0);
    }
}
