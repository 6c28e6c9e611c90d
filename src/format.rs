const SUFFIXES: [&str; 4] = ["K", "M", "G", "T"];

/// Scale a byte count by powers of 1024 and render it with a unit suffix.
///
/// Scaled values of 1000 or more print as a truncated integer (`1023`,
/// `1500K`); everything else prints with three significant figures the way
/// C's `%.3g` does (`1.5K`, `12.3M`). Values past the `T` range stay in `T`.
pub fn humanize(value: f64) -> String {
    let mut scaled = value;
    let mut divisions = 0;
    while scaled >= 1024.0 && divisions < SUFFIXES.len() {
        scaled /= 1024.0;
        divisions += 1;
    }
    let suffix = match divisions {
        0 => "",
        n => SUFFIXES[n - 1],
    };

    // %g switches to scientific notation at this size; integers read better.
    if scaled >= 1000.0 {
        format!("{}{suffix}", scaled.trunc() as i64)
    } else {
        format!("{}{suffix}", significant3(scaled))
    }
}

/// `%.3g` rendering of a single value.
fn significant3(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    // `{:.2e}` rounds to three significant figures and reports the exponent
    // of the rounded value, which is what %g bases its decision on.
    let sci = format!("{value:.2e}");
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..3).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (2 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.0} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
