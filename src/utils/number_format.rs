//! Number labels for axes, tooltips and exports.

/// Three significant digits, or one-decimal scientific notation for very
/// small or very large magnitudes.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "n/a".to_string()
        } else if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    let magnitude = value.abs();
    if value != 0.0 && (magnitude < 0.01 || magnitude > 99_999.0) {
        return format!("{:.1e}", value);
    }
    significant(value, 3)
}

/// Rounds to `digits` significant digits without switching to exponent form.
pub fn significant(value: f64, digits: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    let decimals = digits - 1 - exponent;
    if decimals > 0 {
        format!("{:.*}", decimals as usize, value)
    } else {
        let unit = 10f64.powi(-decimals);
        format!("{:.0}", (value / unit).round() * unit)
    }
}

/// Plain value for exports; missing values are empty cells.
pub fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}", v),
        _ => String::new(),
    }
}
