//! # Feed Value Formatting
//!
//! Locale-independent rendering of feed values: fixed two-decimal prices and
//! flattened category trees.

/// Separator between category names within one root-to-leaf path.
pub const CATEGORY_TREE_SEPARATOR: &str = " > ";
/// Separator between distinct category paths.
pub const CATEGORY_SEPARATOR: &str = " % ";

/// Significant digits a price keeps before cent rounding. Matches the precision
/// of the decimal a price was most likely written as.
const PRICE_SIGNIFICANT_DIGITS: usize = 15;

/// Format a price with exactly two decimals and `.` as the decimal separator.
///
/// Halves round away from zero on the decimal value, so `1.005` renders as
/// `1.01` even though its binary form sits just below the half. No thousands
/// separator is emitted. Non-finite input renders as Rust's `inf`/`NaN`.
///
/// # Example
/// ```rust
/// use feed_util::feed_format::format_price;
///
/// assert_eq!(format_price(10.0), "10.00");
/// assert_eq!(format_price(1234.567), "1234.57");
/// assert_eq!(format_price(1.005), "1.01");
/// ```
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return format!("{price:.2}");
    }
    round_to_cents(price).unwrap_or_else(|| format!("{price:.2}"))
}

/// Decimal digit rounding on the scientific rendering of `price`. Never scales
/// the binary value, so huge prices keep every integer digit.
fn round_to_cents(price: f64) -> Option<String> {
    let scientific = format!("{:.*e}", PRICE_SIGNIFICANT_DIGITS - 1, price.abs());
    let (mantissa, exponent) = scientific.split_once('e')?;
    let exponent: i64 = exponent.parse().ok()?;
    let digits: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).map(|digit| digit - b'0').collect();

    // Integer digits plus two decimals.
    let keep = exponent + 3;
    let mut cents: Vec<u8> = if keep > 0 {
        let keep = usize::try_from(keep).ok()?;
        let mut kept: Vec<u8> = digits.iter().copied().take(keep).collect();
        kept.resize(keep, 0);
        kept
    } else {
        Vec::new()
    };
    let first_dropped = usize::try_from(keep)
        .ok()
        .and_then(|index| digits.get(index).copied())
        .unwrap_or(0);

    if first_dropped >= 5 {
        let mut carry = true;
        for digit in cents.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            cents.insert(0, 1);
        }
    }

    let negative = price < 0.0 && cents.iter().any(|digit| *digit != 0);
    let mut text: String = cents.iter().map(|digit| char::from(b'0' + digit)).collect();
    while text.len() < 3 {
        text.insert(0, '0');
    }
    let (units, fraction) = text.split_at(text.len() - 2);
    Some(format!("{}{units}.{fraction}", if negative { "-" } else { "" }))
}

/// Flatten a category tree into a single string.
///
/// Names inside a path are joined with `tree_separator`; paths are joined with
/// `category_separator` in the order given.
///
/// # Example
/// ```rust
/// use feed_util::feed_format::{CATEGORY_SEPARATOR, CATEGORY_TREE_SEPARATOR, flatten_category_tree};
///
/// let tree = vec![vec!["A".to_string(), "A1".to_string()], vec!["B".to_string()]];
/// assert_eq!(flatten_category_tree(&tree, CATEGORY_TREE_SEPARATOR, CATEGORY_SEPARATOR), "A > A1 % B");
/// ```
pub fn flatten_category_tree<S: AsRef<str>>(tree: &[Vec<S>], tree_separator: &str, category_separator: &str) -> String {
    tree.iter()
        .map(|path| path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(tree_separator))
        .collect::<Vec<_>>()
        .join(category_separator)
}
