use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{MintId, ReleaseTerms};

/// Currency display rules: which mint is the network's native currency and how
/// many decimals each known mint carries.
///
/// Amounts stay in smallest units (integers) everywhere in the core; floating
/// values appear only here, at the display boundary, and are formatted exactly
/// once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    native_mint: MintId,
    decimals: HashMap<MintId, u32>,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            native_mint: "sol".into(),
            decimals: HashMap::from([("sol".to_string(), 9), ("usdc".to_string(), 6)]),
        }
    }
}

impl Pricing {
    pub fn new(native_mint: impl Into<MintId>) -> Self {
        Self {
            native_mint: native_mint.into(),
            ..Self::default()
        }
    }

    pub fn with_decimals(mut self, mint: impl Into<MintId>, decimals: u32) -> Self {
        self.decimals.insert(mint.into(), decimals);
        self
    }

    pub fn native_mint(&self) -> &str {
        &self.native_mint
    }

    pub fn is_native(&self, mint: &str) -> bool {
        mint == self.native_mint
    }

    pub fn decimals_for(&self, mint: &str) -> u32 {
        self.decimals.get(mint).copied().unwrap_or(6)
    }

    /// Convert a smallest-unit amount into display units for its mint.
    pub fn to_display_units(&self, amount: u64, mint: &str) -> f64 {
        amount as f64 / 10u64.pow(self.decimals_for(mint)) as f64
    }

    /// Display-unit amount rendered without trailing zeros ("5", "5.5", "5.25").
    pub fn display_string(&self, amount: u64, mint: &str) -> String {
        let value = self.to_display_units(amount, mint);
        let rendered = format!("{value:.6}");
        let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_string()
    }
}

/// Resale royalty as a human percentage (basis points / 100).
pub fn resale_percent(terms: &ReleaseTerms) -> f64 {
    terms.resale_percentage as f64 / 100.0
}

/// Purchase button state for a release. The disabled sold-out state is the
/// caller-side enforcement of the "do not purchase sold-out releases" contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseButton {
    pub enabled: bool,
    pub label: String,
}

pub fn purchase_button(terms: &ReleaseTerms, pricing: &Pricing) -> PurchaseButton {
    if terms.remaining_supply > 0 || terms.open_edition() {
        let label = if terms.price > 0 {
            format!(
                "Buy ${}",
                pricing.display_string(terms.price, &terms.payment_mint)
            )
        } else {
            "Collect For Free".to_string()
        };
        PurchaseButton {
            enabled: true,
            label,
        }
    } else {
        PurchaseButton {
            enabled: false,
            label: format!(
                "Sold Out (${:.2})",
                pricing.to_display_units(terms.price, &terms.payment_mint)
            ),
        }
    }
}

/// Supply line shown next to the purchase button.
pub fn edition_summary(terms: &ReleaseTerms) -> String {
    if terms.open_edition() {
        format!("Open Edition: {} Sold", terms.sale_counter)
    } else {
        format!(
            "Remaining: {} / {}",
            terms.remaining_supply, terms.total_supply
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(price: u64, remaining: i64) -> ReleaseTerms {
        ReleaseTerms {
            release_id: "r1".into(),
            price,
            payment_mint: "usdc".into(),
            remaining_supply: remaining,
            total_supply: 100,
            sale_counter: 42,
            resale_percentage: 1_000,
            royalty_recipients: vec![],
            authority: "artist".into(),
        }
    }

    #[test]
    fn display_units_respect_mint_decimals() {
        let pricing = Pricing::default();
        assert_eq!(pricing.to_display_units(5_000_000, "usdc"), 5.0);
        assert_eq!(pricing.to_display_units(1_500_000_000, "sol"), 1.5);
        // Unknown mints fall back to six decimals.
        assert_eq!(pricing.to_display_units(2_000_000, "unknown"), 2.0);
    }

    #[test]
    fn display_string_trims_trailing_zeros() {
        let pricing = Pricing::default();
        assert_eq!(pricing.display_string(5_000_000, "usdc"), "5");
        assert_eq!(pricing.display_string(5_500_000, "usdc"), "5.5");
        assert_eq!(pricing.display_string(5_250_000, "usdc"), "5.25");
    }

    #[test]
    fn buy_button_for_available_release() {
        let button = purchase_button(&terms(5_000_000, 10), &Pricing::default());
        assert!(button.enabled);
        assert_eq!(button.label, "Buy $5");
    }

    #[test]
    fn free_release_collect_label() {
        let button = purchase_button(&terms(0, 10), &Pricing::default());
        assert!(button.enabled);
        assert_eq!(button.label, "Collect For Free");
    }

    #[test]
    fn sold_out_button_is_disabled_with_two_decimal_price() {
        let button = purchase_button(&terms(5_000_000, 0), &Pricing::default());
        assert!(!button.enabled);
        assert_eq!(button.label, "Sold Out ($5.00)");
    }

    #[test]
    fn open_edition_buyable_and_summarized_by_sales() {
        let t = terms(5_000_000, -1);
        assert!(purchase_button(&t, &Pricing::default()).enabled);
        assert_eq!(edition_summary(&t), "Open Edition: 42 Sold");
    }

    #[test]
    fn limited_edition_summary_shows_remaining_over_total() {
        assert_eq!(edition_summary(&terms(5_000_000, 10)), "Remaining: 10 / 100");
    }

    #[test]
    fn resale_percent_from_basis_points() {
        assert_eq!(resale_percent(&terms(0, 1)), 10.0);
    }
}
