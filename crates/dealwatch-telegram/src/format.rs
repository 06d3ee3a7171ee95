//! HTML message bodies for the Bot API (`parse_mode = "HTML"`).

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local};
use dealwatch_core::{DealItem, ScanCycleStats};

/// Escapes the three characters Telegram's HTML mode treats as markup.
#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `15000` becomes `"15,000"`.
#[must_use]
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if price < 0 {
        out.push('-');
    }
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whole-second duration in `1h2m3s` form. Zero is `0s`.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs() + u64::from(d.subsec_millis() >= 500);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    let mut out = String::new();
    if h > 0 {
        let _ = write!(out, "{h}h");
    }
    if h > 0 || m > 0 {
        let _ = write!(out, "{m}m");
    }
    let _ = write!(out, "{s}s");
    out
}

#[must_use]
pub fn format_deal_caption(deal: &DealItem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🔥 <b>{}</b>", escape_html(&deal.name));
    let _ = writeln!(out, "💰 ¥{}", format_price(deal.price));
    if !deal.brand_name.is_empty() {
        let _ = writeln!(out, "🏷 {}", escape_html(&deal.brand_name));
    }
    let _ = writeln!(out, "📦 Posted {:.0} min ago", deal.age_minutes.max(0.0));
    let _ = write!(
        out,
        "🔗 <a href=\"{}\">View on Mercari</a>",
        escape_html(&deal.item_url)
    );
    out
}

#[must_use]
pub fn format_startup(brand_count: usize, interval_minutes: u64, now: DateTime<Local>) -> String {
    format!(
        "🤖 <b>Dealwatch started</b>\n\n\
         🔍 Watching <b>{brand_count} brands</b>\n\
         ⏰ Scan interval: <b>{interval_minutes} minutes</b>\n\
         🕐 Time: {}\n\n\
         🟢 Ready to hunt deals!",
        now.format("%Y-%m-%d %H:%M %Z")
    )
}

#[must_use]
pub fn format_error(message: &str) -> String {
    format!(
        "🔴 <b>Dealwatch error</b>\n\n<code>{}</code>",
        escape_html(message)
    )
}

#[must_use]
pub fn format_scan_summary(stats: &ScanCycleStats, elapsed: Duration) -> String {
    format!(
        "📊 <b>Scan complete</b>\nFound: {} | New: {} | Sent: {}\n⏱ {}",
        stats.found,
        stats.unseen,
        stats.sent,
        format_duration(elapsed)
    )
}

pub const TEST_MESSAGE: &str = "🧪 <b>Dealwatch test</b>\n\nTelegram connection successful! ✅";

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(brand: &str) -> DealItem {
        DealItem {
            name: "Kapital <boro> & patch".to_owned(),
            price: 15_000,
            brand_name: brand.to_owned(),
            image_url: None,
            item_url: "https://jp.mercari.com/item/m1".to_owned(),
            age_minutes: 12.4,
        }
    }

    #[test]
    fn price_gets_thousands_separators() {
        assert_eq!(format_price(0), "0");
        assert_eq!(format_price(999), "999");
        assert_eq!(format_price(1_000), "1,000");
        assert_eq!(format_price(15_000), "15,000");
        assert_eq!(format_price(1_234_567), "1,234,567");
        assert_eq!(format_price(-4_500), "-4,500");
    }

    #[test]
    fn escape_html_handles_markup_characters() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn caption_escapes_name_and_formats_price() {
        let caption = format_deal_caption(&deal("Kapital"));
        assert!(caption.starts_with("🔥 <b>Kapital &lt;boro&gt; &amp; patch</b>\n"));
        assert!(caption.contains("💰 ¥15,000\n"));
        assert!(caption.contains("🏷 Kapital\n"));
        assert!(caption.contains("Posted 12 min ago"));
        assert!(caption.ends_with("<a href=\"https://jp.mercari.com/item/m1\">View on Mercari</a>"));
    }

    #[test]
    fn caption_omits_empty_brand_line() {
        assert!(!format_deal_caption(&deal("")).contains("🏷"));
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(41_600)), "42s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m5s");
        assert_eq!(format_duration(Duration::from_secs(3_600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(7_384)), "2h3m4s");
    }

    #[test]
    fn summary_reports_found_new_sent() {
        let stats = ScanCycleStats {
            found: 40,
            fresh: 12,
            unseen: 5,
            kept: 4,
            sent: 3,
        };
        let text = format_scan_summary(&stats, Duration::from_secs(95));
        assert!(text.contains("Found: 40 | New: 5 | Sent: 3"));
        assert!(text.ends_with("⏱ 1m35s"));
    }

    #[test]
    fn error_message_is_wrapped_in_code() {
        assert!(format_error("boom <x>").ends_with("<code>boom &lt;x&gt;</code>"));
    }
}
