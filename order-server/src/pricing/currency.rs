//! Currency rendering
//!
//! - [`render_rmb`]: traditional uppercase Chinese numerals (大写金额)
//! - [`format_amount`]: grouped decimal figures for calculation breakdowns

use rust_decimal::prelude::*;

const DIGITS: [&str; 10] = ["零", "壹", "贰", "叁", "肆", "伍", "陆", "柒", "捌", "玖"];
const PLACES: [&str; 4] = ["", "拾", "佰", "仟"];

/// Rounding for monetary values (2 decimal places, half away from zero)
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount as 大写 currency text, e.g. `人民币壹仟零贰拾肆元伍角`.
///
/// The amount is rounded to cents first, so `0.999` renders as `壹元整`.
/// Sign goes after the prefix: `人民币负壹佰元整`.
pub fn render_rmb(amount: Decimal, show_prefix: bool) -> String {
    let prefix = if show_prefix { "人民币" } else { "" };

    let rounded = round_money(amount.abs());
    let yuan = rounded.trunc();
    let cents = ((rounded - yuan) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or(0);
    let yuan = yuan.to_u128().unwrap_or(0);

    if yuan == 0 && cents == 0 {
        return format!("{prefix}零元整");
    }

    let mut out = String::from(prefix);
    if amount.is_sign_negative() {
        out.push('负');
    }

    if yuan > 0 {
        out.push_str(&render_integer(yuan));
        out.push('元');
    }

    let jiao = (cents / 10) as usize;
    let fen = (cents % 10) as usize;
    if jiao > 0 {
        out.push_str(DIGITS[jiao]);
        out.push('角');
    }
    if fen > 0 {
        if jiao == 0 && yuan > 0 {
            out.push('零');
        }
        out.push_str(DIGITS[fen]);
        out.push('分');
    }
    if cents == 0 {
        out.push('整');
    }
    out
}

/// Unit for the i-th base-10000 chunk: "", 万, 亿, 万亿, 亿亿, ...
fn chunk_unit(index: usize) -> String {
    let mut unit = String::new();
    if index % 2 == 1 {
        unit.push('万');
    }
    for _ in 0..index / 2 {
        unit.push('亿');
    }
    unit
}

/// One 4-digit chunk without leading zeros; inner zero runs collapse to one 零.
fn render_chunk(chunk: u32) -> String {
    let digits = [chunk / 1000, chunk / 100 % 10, chunk / 10 % 10, chunk % 10];
    let mut out = String::new();
    let mut pending_zero = false;
    for (pos, &d) in digits.iter().enumerate() {
        if d == 0 {
            if !out.is_empty() {
                pending_zero = true;
            }
            continue;
        }
        if pending_zero {
            out.push('零');
            pending_zero = false;
        }
        out.push_str(DIGITS[d as usize]);
        out.push_str(PLACES[3 - pos]);
    }
    out
}

fn render_integer(mut n: u128) -> String {
    let mut chunks = Vec::new();
    while n > 0 {
        chunks.push((n % 10_000) as u32);
        n /= 10_000;
    }

    let mut out = String::new();
    let mut gap = false;
    for (index, &chunk) in chunks.iter().enumerate().rev() {
        if chunk == 0 {
            gap = !out.is_empty();
            continue;
        }
        if !out.is_empty() && (gap || chunk < 1000) {
            out.push('零');
        }
        gap = false;
        out.push_str(&render_chunk(chunk));
        out.push_str(&chunk_unit(index));
    }
    out
}

/// Format a figure like `toLocaleString`: comma-grouped integer part, at
/// most two decimals, trailing zeros dropped (`2550` → `2,550`,
/// `1234.50` → `1,234.5`).
pub fn format_amount(value: Decimal) -> String {
    let rounded = round_money(value).normalize();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero() {
        assert_eq!(render_rmb(dec!(0), false), "零元整");
        assert_eq!(render_rmb(dec!(0), true), "人民币零元整");
        assert_eq!(render_rmb(dec!(-0.001), false), "零元整");
    }

    #[test]
    fn test_examples() {
        assert_eq!(render_rmb(dec!(1024.5), true), "人民币壹仟零贰拾肆元伍角");
        assert_eq!(render_rmb(dec!(3000), true), "人民币叁仟元整");
        assert_eq!(render_rmb(dec!(2550), false), "贰仟伍佰伍拾元整");
    }

    #[test]
    fn test_negative() {
        let text = render_rmb(dec!(-100), false);
        assert!(text.starts_with('负'));
        assert_eq!(text, "负壹佰元整");
        assert_eq!(render_rmb(dec!(-100), true), "人民币负壹佰元整");
    }

    #[test]
    fn test_cents() {
        assert_eq!(render_rmb(dec!(0.5), false), "伍角");
        assert_eq!(render_rmb(dec!(0.05), false), "伍分");
        assert_eq!(render_rmb(dec!(1.05), false), "壹元零伍分");
        assert_eq!(render_rmb(dec!(12.34), false), "壹拾贰元叁角肆分");
    }

    #[test]
    fn test_rounding_carries_into_yuan() {
        assert_eq!(render_rmb(dec!(0.999), false), "壹元整");
        assert_eq!(render_rmb(dec!(0.125), false), "壹角叁分");
    }

    #[test]
    fn test_zero_runs_and_chunks() {
        assert_eq!(render_rmb(dec!(1001), false), "壹仟零壹元整");
        assert_eq!(render_rmb(dec!(10500), false), "壹万零伍佰元整");
        assert_eq!(render_rmb(dec!(100000), false), "壹拾万元整");
        assert_eq!(render_rmb(dec!(11000), false), "壹万壹仟元整");
        assert_eq!(render_rmb(dec!(100000001), false), "壹亿零壹元整");
        assert_eq!(render_rmb(dec!(100010000), false), "壹亿零壹万元整");
        assert_eq!(render_rmb(dec!(1000000000000), false), "壹万亿元整");
    }

    #[test]
    fn test_deterministic() {
        let a = render_rmb(dec!(98765.43), true);
        let b = render_rmb(dec!(98765.43), true);
        assert_eq!(a, b);
        assert_eq!(a, "人民币玖万捌仟柒佰陆拾伍元肆角叁分");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(2550)), "2,550");
        assert_eq!(format_amount(dec!(1234.50)), "1,234.5");
        assert_eq!(format_amount(dec!(0.1)), "0.1");
        assert_eq!(format_amount(dec!(999)), "999");
        assert_eq!(format_amount(dec!(1000000.456)), "1,000,000.46");
        assert_eq!(format_amount(dec!(-1200)), "-1,200");
        assert_eq!(format_amount(dec!(0)), "0");
    }
}
