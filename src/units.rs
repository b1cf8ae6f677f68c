//! CSS length helpers: `px(4)` is `"4px"`.

use crate::value::Value;

macro_rules! units {
    ($($(#[$doc:meta])* $name:ident => $suffix:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(v: impl Into<f64>) -> String {
                format!("{}{}", Value::Number(v.into()), $suffix)
            }
        )*
    };
}

units! {
    px => "px",
    em => "em",
    rem => "rem",
    pt => "pt",
    cm => "cm",
    mm => "mm",
    /// Percent: `pct(50)` is `"50%"`.
    pct => "%",
    vh => "vh",
    vw => "vw",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_css() {
        assert_eq!(px(4), "4px");
        assert_eq!(em(1.5), "1.5em");
        assert_eq!(pct(50), "50%");
        assert_eq!(vh(100u8), "100vh");
        assert_eq!(rem(-0.25), "-0.25rem");
        assert_eq!(mm(0), "0mm");
    }
}
