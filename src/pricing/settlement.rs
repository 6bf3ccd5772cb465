use serde::Serialize;

/// Platform cut held on the settlement ledger — the authoritative revenue
/// figure. Fixed at ledger creation time, never recomputed.
pub const SERVICE_CHARGE_PERCENT: i32 = 10;

/// Informational commission recorded on the order itself. Coexists with the
/// service charge as two independent policy knobs; payouts use the ledger.
pub const COMMISSION_PERCENT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementSplit {
    pub service_charge_amount: i64,
    pub amount_to_seller: i64,
}

/// Split a total between platform and seller. The seller share is derived by
/// subtraction so the two parts always sum back to the total exactly — no
/// rounding leakage, no surplus.
pub fn split(total_amount: i64, percent: i32) -> SettlementSplit {
    let service_charge_amount = round_div(total_amount * i64::from(percent), 100);
    SettlementSplit {
        service_charge_amount,
        amount_to_seller: total_amount - service_charge_amount,
    }
}

/// Informational platform commission on an order total.
pub fn commission(total: i64) -> i64 {
    round_div(total * COMMISSION_PERCENT, 100)
}

/// Round-half-up division for non-negative integer money.
fn round_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator / 2) / denominator
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_never_leaks() {
        for total in [0i64, 1, 99, 100, 100_001] {
            let s = split(total, SERVICE_CHARGE_PERCENT);
            assert_eq!(
                s.service_charge_amount + s.amount_to_seller,
                total,
                "leak at total={total}"
            );
        }
    }

    #[test]
    fn test_split_rounds_half_up() {
        // 99 * 10% = 9.9 -> 10
        assert_eq!(split(99, 10).service_charge_amount, 10);
        // 100001 * 10% = 10000.1 -> 10000
        assert_eq!(split(100_001, 10).service_charge_amount, 10_000);
        // 5 * 10% = 0.5 -> 1
        assert_eq!(split(5, 10).service_charge_amount, 1);
    }

    #[test]
    fn test_typical_order_split() {
        // Cart 10_000 + pickup fee 500
        let s = split(10_500, SERVICE_CHARGE_PERCENT);
        assert_eq!(s.service_charge_amount, 1_050);
        assert_eq!(s.amount_to_seller, 9_450);
    }

    #[test]
    fn test_commission_is_five_percent() {
        assert_eq!(commission(10_500), 525);
        assert_eq!(commission(0), 0);
        // 99 * 5% = 4.95 -> 5
        assert_eq!(commission(99), 5);
    }
}
