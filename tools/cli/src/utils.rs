use anyhow::Result;
use chrono::{TimeZone, Utc};

/// Decimal places of the on-chain amount unit.
pub const AMOUNT_DECIMALS: u32 = 18;

/// Convert a smallest-unit integer (decimal string, up to 256 bits) to a
/// human decimal string. Works on the digit string directly so no magnitude
/// is ever truncated.
pub fn format_units(amount: &str, decimals: u32) -> Result<String> {
    let digits = amount.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(anyhow::anyhow!("amount is not a decimal integer: {:?}", amount));
    }
    let stripped = digits.trim_start_matches('0');
    let digits = if stripped.is_empty() { "0" } else { stripped };

    let decimals = decimals as usize;
    if decimals == 0 {
        return Ok(digits.to_string());
    }

    let (whole, fractional) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (&digits[..split], digits[split..].to_string())
    } else {
        ("0", format!("{:0>width$}", digits, width = decimals))
    };

    let fractional = fractional.trim_end_matches('0');
    if fractional.is_empty() {
        Ok(whole.to_string())
    } else {
        Ok(format!("{}.{}", whole, fractional))
    }
}

/// Inverse of [`format_units`]: parse a display amount back into the
/// smallest-unit integer string.
pub fn parse_units(display: &str, decimals: u32) -> Result<String> {
    let decimals = decimals as usize;
    let display = display.trim();

    let (whole, fractional) = match display.split_once('.') {
        None => (display, ""),
        Some((_, "")) => return Err(anyhow::anyhow!("invalid amount format: {:?}", display)),
        Some((w, f)) => (w, f),
    };

    if whole.is_empty() && fractional.is_empty() {
        return Err(anyhow::anyhow!("empty amount"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fractional.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(anyhow::anyhow!("amount is not a decimal number: {:?}", display));
    }
    if fractional.len() > decimals {
        return Err(anyhow::anyhow!("too many decimal places"));
    }

    let mut units = String::with_capacity(whole.len() + decimals);
    units.push_str(whole);
    units.push_str(fractional);
    units.extend(std::iter::repeat('0').take(decimals - fractional.len()));

    let trimmed = units.trim_start_matches('0');
    Ok(if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    })
}

pub fn validate_address(address: &str) -> Result<()> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| anyhow::anyhow!("address must start with 0x"))?;

    if hex.len() != 40 {
        return Err(anyhow::anyhow!("address must be 42 characters long"));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(anyhow::anyhow!("address must be hexadecimal"));
    }

    Ok(())
}

/// `0x1234...abcd` shortening used everywhere an address is displayed.
pub fn truncate_address(address: &str) -> String {
    if !address.is_ascii() || address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Render a unix-seconds timestamp as a date. Zero means "has not happened"
/// and renders as the literal `Never`.
pub fn format_timestamp(secs: u64) -> String {
    if secs == 0 {
        return "Never".to_string();
    }
    match Utc.timestamp_opt(secs as i64, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "Invalid date".to_string(),
    }
}

pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "No data to display".to_string();
    }

    let mut widths = headers.iter().map(|h| h.len()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let border = |left: &str, mid: &str, right: &str| {
        let mut s = left.to_string();
        for (i, width) in widths.iter().enumerate() {
            s.push_str(&"─".repeat(width + 2));
            s.push_str(if i < widths.len() - 1 { mid } else { right });
        }
        s.push('\n');
        s
    };
    let data_row = |cells: &[String]| {
        let mut s = "│".to_string();
        for (cell, width) in cells.iter().zip(widths.iter()) {
            s.push_str(&format!(" {:<width$} │", cell, width = width));
        }
        s.push('\n');
        s
    };

    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let mut result = String::new();
    result.push_str(&border("┌", "┬", "┐"));
    result.push_str(&data_row(&header_cells));
    result.push_str(&border("├", "┼", "┤"));
    for row in rows {
        result.push_str(&data_row(row));
    }
    result.push_str(&border("└", "┴", "┘"));
    result.trim_end().to_string()
}

pub fn colorize_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "verified" | "active" | "success" => {
            format!("\x1b[32m{}\x1b[0m", status) // Green
        }
        "rejected" | "inactive" | "failed" | "reverted" => {
            format!("\x1b[31m{}\x1b[0m", status) // Red
        }
        "pending" | "submitting" => {
            format!("\x1b[33m{}\x1b[0m", status) // Yellow
        }
        "disputed" | "unknown" => {
            format!("\x1b[90m{}\x1b[0m", status) // Gray
        }
        _ => status.to_string(),
    }
}
