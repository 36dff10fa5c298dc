use rust_decimal::Decimal;

use crate::alloc;

/// Format an amount in kroner with thousand separators and 2 decimals.
/// e.g. `1234567.89` → `"kr 1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val.abs().round_dp(2);
    let formatted = format!("{abs:.2}");
    let (int_part, dec_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let grouped: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-kr {grouped}.{dec_part}")
    } else {
        format!("kr {grouped}.{dec_part}")
    }
}

/// Amount in millions with an `M` suffix, e.g. `"2.5M"`.
pub(crate) fn format_m(val: Decimal, decimals: usize) -> String {
    format!("{}M", alloc::format_millions(alloc::to_f64(val), decimals))
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max - 1).collect();
    format!("{kept}…")
}

/// `[████░░░░]` bar for a 0..=1 ratio; out-of-range ratios are clamped.
pub(crate) fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

pub(crate) fn scroll_down(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if *index + 1 < len {
        *index += 1;
        let page = page.max(1);
        if *index >= *scroll + page {
            *scroll = *index + 1 - page;
        }
    }
}

pub(crate) fn scroll_up(index: &mut usize, scroll: &mut usize) {
    *index = index.saturating_sub(1);
    if *index < *scroll {
        *scroll = *index;
    }
}

pub(crate) fn scroll_to_top(index: &mut usize, scroll: &mut usize) {
    *index = 0;
    *scroll = 0;
}

pub(crate) fn scroll_to_bottom(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if len > 0 {
        *index = len - 1;
        *scroll = index.saturating_sub(page.saturating_sub(1));
    }
}

/// First row to draw so that `index` stays inside a window of `page` rows.
pub(crate) fn window_start(index: usize, scroll: usize, page: usize) -> usize {
    let page = page.max(1);
    if index < scroll {
        index
    } else if index >= scroll + page {
        index + 1 - page
    } else {
        scroll
    }
}
