use crate::error::EncodeError;

/// Decimals assumed for vote tokens unless configured otherwise (USDC).
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fee taken by the program on every transfer, in basis points.
pub fn calculate_fees(amount: u64, bps: u16) -> u64 {
    (amount as u128 * bps as u128 / 10_000) as u64
}

/// Scales a human-readable amount into the token's smallest unit, flooring
/// any fraction below one unit.
pub fn ui_amount_to_raw(amount: f64, decimals: u8) -> Result<u64, EncodeError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EncodeError::InvalidAmount(amount));
    }

    let scaled = (amount * 10f64.powi(decimals as i32)).floor();
    // 2^64 is exactly representable, anything at or past it cannot be a u64
    if scaled >= 18_446_744_073_709_551_616.0 {
        return Err(EncodeError::AmountOverflow(amount));
    }
    if scaled < 1.0 {
        return Err(EncodeError::AmountTooSmall(amount));
    }

    Ok(scaled as u64)
}

pub fn raw_amount_to_ui(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).floor() as u64
}

/// Shortens an address to `head...tail` for display. Counts characters, not
/// bytes, so labels and other non-base58 input are safe.
pub fn format_wallet_address(address: &str, chars: usize) -> String {
    let len = address.chars().count();
    if len <= chars.saturating_mul(2) {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(len - chars).collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_floors_fractional_units() {
        assert_eq!(ui_amount_to_raw(1.5, 6).unwrap(), 1_500_000);
        assert_eq!(
            ui_amount_to_raw(1.9999995, 6).unwrap(),
            ui_amount_to_raw(1.999999, 6).unwrap()
        );
        assert_eq!(ui_amount_to_raw(1.999999, 6).unwrap(), 1_999_999);
    }

    #[test]
    fn test_scaling_rejects_bad_amounts() {
        assert_eq!(ui_amount_to_raw(0.0, 6), Err(EncodeError::InvalidAmount(0.0)));
        assert_eq!(ui_amount_to_raw(-3.0, 6), Err(EncodeError::InvalidAmount(-3.0)));
        assert!(matches!(
            ui_amount_to_raw(f64::NAN, 6),
            Err(EncodeError::InvalidAmount(_))
        ));
        assert_eq!(
            ui_amount_to_raw(0.0000001, 6),
            Err(EncodeError::AmountTooSmall(0.0000001))
        );
        assert_eq!(ui_amount_to_raw(2e13, 6), Err(EncodeError::AmountOverflow(2e13)));
    }

    #[test]
    fn test_fees() {
        assert_eq!(calculate_fees(1_000_000, 500), 50_000);
        assert_eq!(calculate_fees(u64::MAX, 10_000), u64::MAX);
        assert_eq!(calculate_fees(99, 100), 0);
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(lamports_to_sol(2_500_000_000), 2.5);
        assert_eq!(sol_to_lamports(0.01), 10_000_000);
        assert_eq!(
            format_wallet_address("GKPoVMxhDTi3SGxK8wRgguwfXjV8EmNkpqCfeQWyhniT", 4),
            "GKPo...hniT"
        );
        assert_eq!(format_wallet_address("abc", 4), "abc");
    }

    #[test]
    fn test_format_wallet_address_counts_chars() {
        assert_eq!(format_wallet_address("ñandú-wallet-ümlaut", 3), "ñan...aut");
        assert_eq!(format_wallet_address("€€€€€€€€€€", 2), "€€...€€");
        assert_eq!(format_wallet_address("ßßßß", 2), "ßßßß");
        assert_eq!(format_wallet_address("", 4), "");
    }
}
