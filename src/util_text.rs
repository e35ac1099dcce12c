use crate::constants::units::{CURRENCY, OCTAS_PER_APT};

/// Convert an octas amount to a decimal APT amount
pub fn octas_to_apt(octas: u64) -> f64 {
    octas as f64 / OCTAS_PER_APT as f64
}

/// Format an octas amount in human-readable form
/// Examples: "1 APT", "0.5 APT", "12.3456 APT"
pub fn format_apt(octas: u64) -> String {
    if octas == 0 {
        return format!("0 {CURRENCY}");
    }
    let whole = octas / OCTAS_PER_APT;
    let frac = octas % OCTAS_PER_APT;
    if frac == 0 {
        return format!("{whole} {CURRENCY}");
    }
    // Up to 4 decimals, trailing zeros trimmed
    let four = format!("{:08}", frac);
    let trimmed = four[..4].trim_end_matches('0');
    if trimmed.is_empty() && whole == 0 {
        format!("<0.0001 {CURRENCY}")
    } else if trimmed.is_empty() {
        format!("{whole} {CURRENCY}")
    } else {
        format!("{whole}.{trimmed} {CURRENCY}")
    }
}

/// Shorten an account address for table display ("0x1234…cdef")
pub fn short_address(addr: &str) -> String {
    if addr.len() <= 12 || !addr.is_ascii() {
        return addr.to_string();
    }
    format!("{}…{}", &addr[..6], &addr[addr.len() - 4..])
}

/// Upper-case the first character of every whitespace-separated word.
///
/// The remainder of each word is left untouched so already formatted names
/// ("BlueMove") survive a second pass.
pub fn title_case_words(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to `max` chars with an ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
