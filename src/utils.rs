/// How a locale writes money: symbol, digit grouping and decimal mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: &'static str,
    pub thousands: char,
    pub decimal: char,
}

impl Default for CurrencyFormat {
    /// Brazilian real, `R$ 1.234,56`.
    fn default() -> Self {
        Self {
            symbol: "R$ ",
            thousands: '.',
            decimal: ',',
        }
    }
}

impl CurrencyFormat {
    /// Format for a locale name such as `pt_BR.UTF-8`.
    ///
    /// Locales without currency conventions (`C`, `POSIX`) and unknown ones
    /// fall back to the Brazilian layout the reports are written in.
    pub fn for_locale(locale: &str) -> Self {
        let language = locale.split(['.', '@']).next().unwrap_or_default();
        match language {
            "en_US" => Self {
                symbol: "$",
                thousands: ',',
                decimal: '.',
            },
            _ => Self::default(),
        }
    }

    /// Renders `value` rounded to cents. Non-finite values render as "—".
    pub fn format(self, value: f64) -> String {
        if !value.is_finite() {
            return "—".to_owned();
        }
        let cents = (value.abs() * 100.0).round() as u64;
        let units = (cents / 100).to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, digit) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push(self.thousands);
            }
            grouped.push(digit);
        }
        let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
        format!(
            "{}{sign}{grouped}{}{:02}",
            self.symbol,
            self.decimal,
            cents % 100
        )
    }
}

/// Formats an amount as Brazilian currency: `R$ 1.234,56`.
pub fn format_currency(value: f64) -> String {
    CurrencyFormat::default().format(value)
}

/// Percentage with two decimals, the only place percentages get rounded.
pub fn fmt_pct(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}%")
    } else {
        "—".to_owned()
    }
}

/// Formats an optional f64 to 2 decimal places, or returns "—" if None or non-finite.
pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.2}"),
        _ => "—".to_owned(),
    }
}
