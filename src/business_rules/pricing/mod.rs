// Pricing Engine
//
// GST breakdowns, slab-based hotel rate lookup, stay length, coupon discounts
// and the per-service quote builders that freeze a price into a record.
// Everything here is pure: no I/O, no clock reads except the `now` passed in.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::business_rules::types::{DiscountType, ServiceKind};
use crate::document::{BookingPricing, Coupon, FoodOrderItem, TaxBreakup, TaxSettings};
use crate::error::AppError;
use crate::orders::price_calculator::PriceCalculator;

/// Round a money amount to 2 decimals, halves away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the GST breakdown for a taxable value
///
/// Interstate supplies carry the whole amount as IGST. Otherwise the amount is
/// split into CGST and SGST; CGST is rounded first and SGST takes the
/// remainder so the halves always add back up to the total.
pub fn compute_gst(taxable_value: Decimal, gst_rate: Decimal, interstate: bool) -> TaxBreakup {
    let gst_amount = round_money(taxable_value * gst_rate);

    let (cgst, sgst, igst) = if interstate {
        (Decimal::ZERO, Decimal::ZERO, gst_amount)
    } else {
        let cgst = round_money(gst_amount / Decimal::TWO);
        (cgst, gst_amount - cgst, Decimal::ZERO)
    };

    TaxBreakup {
        gst_rate,
        taxable_value,
        gst_amount,
        cgst,
        sgst,
        igst,
    }
}

/// GST rate for a hotel room from the per-night price
///
/// First slab whose inclusive `[min, max]` range contains the price wins;
/// `max: None` is unbounded. No match means no tax.
pub fn hotel_gst_rate(per_night: Decimal, tax: &TaxSettings) -> Decimal {
    tax.hotel_slabs
        .iter()
        .find(|slab| per_night >= slab.min && slab.max.map_or(true, |max| per_night <= max))
        .map(|slab| slab.rate)
        .unwrap_or(Decimal::ZERO)
}

/// Whole nights between two calendar days, never less than 1
pub fn days_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(1)
}

pub fn order_subtotal(items: &[FoodOrderItem]) -> Decimal {
    let subtotals: Vec<Decimal> = items
        .iter()
        .map(|line| PriceCalculator::calculate_subtotal(line.quantity, line.price))
        .collect();
    PriceCalculator::calculate_total(&subtotals)
}

/// Discount a coupon grants on `amount`
///
/// Rejects inactive, expired, exhausted or out-of-scope coupons and orders
/// below the coupon minimum. The discount is capped by `max_discount` and
/// never exceeds the amount itself.
pub fn apply_coupon(
    amount: Decimal,
    coupon: &Coupon,
    service: ServiceKind,
    now: DateTime<Utc>,
) -> Result<Decimal, AppError> {
    if !coupon.active {
        return Err(AppError::Validation(format!("Coupon {} is not active", coupon.code)));
    }
    if coupon.expires_at.map_or(false, |expires_at| expires_at <= now) {
        return Err(AppError::Validation(format!("Coupon {} has expired", coupon.code)));
    }
    if coupon.usage_limit.map_or(false, |limit| coupon.used_count >= limit) {
        return Err(AppError::Validation(format!(
            "Coupon {} has reached its usage limit",
            coupon.code
        )));
    }
    if !coupon.applies_to.is_empty()
        && !coupon
            .applies_to
            .iter()
            .any(|kind| kind.eq_ignore_ascii_case(service.as_str()))
    {
        return Err(AppError::Validation(format!(
            "Coupon {} does not apply to {} bookings",
            coupon.code, service
        )));
    }
    if let Some(min_amount) = coupon.min_amount {
        if amount < min_amount {
            return Err(AppError::Validation(format!(
                "Coupon {} requires a minimum amount of {}",
                coupon.code, min_amount
            )));
        }
    }

    let raw = match coupon.discount_type {
        DiscountType::Percentage => amount * coupon.value / Decimal::ONE_HUNDRED,
        DiscountType::FixedAmount => coupon.value,
    };
    let capped = match coupon.max_discount {
        Some(max_discount) => raw.min(max_discount),
        None => raw,
    };

    Ok(round_money(capped.max(Decimal::ZERO).min(amount)))
}

/// Inputs shared by every quote
#[derive(Debug, Clone, Copy)]
pub struct QuoteContext<'a> {
    pub tax: &'a TaxSettings,
    pub coupon: Option<&'a Coupon>,
    pub billing_state: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl<'a> QuoteContext<'a> {
    pub fn new(tax: &'a TaxSettings, now: DateTime<Utc>) -> Self {
        Self { tax, coupon: None, billing_state: None, now }
    }

    pub fn with_coupon(mut self, coupon: Option<&'a Coupon>) -> Self {
        self.coupon = coupon;
        self
    }

    pub fn with_billing_state(mut self, billing_state: Option<&'a str>) -> Self {
        self.billing_state = billing_state;
        self
    }

    fn finish(
        &self,
        service: ServiceKind,
        base_amount: Decimal,
        gst_rate: Decimal,
        nights: Option<i64>,
        unit_price: Option<Decimal>,
    ) -> Result<BookingPricing, AppError> {
        let base_amount = round_money(base_amount);
        let discount = match self.coupon {
            Some(coupon) => apply_coupon(base_amount, coupon, service, self.now)?,
            None => Decimal::ZERO,
        };
        let taxable = base_amount - discount;
        let tax = compute_gst(taxable, gst_rate, self.tax.is_interstate(self.billing_state));
        let total = taxable + tax.gst_amount;

        Ok(BookingPricing {
            base_amount,
            discount,
            coupon_code: self.coupon.map(|coupon| coupon.code.clone()),
            tax,
            total,
            nights,
            unit_price,
        })
    }
}

/// Price a hotel stay: per-night room price × rooms × nights, taxed by slab
pub fn quote_hotel_stay(
    ctx: &QuoteContext<'_>,
    per_night: Decimal,
    num_rooms: u32,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<BookingPricing, AppError> {
    let nights = days_between(check_in, check_out);
    let base = per_night * Decimal::from(num_rooms) * Decimal::from(nights);
    let rate = hotel_gst_rate(per_night, ctx.tax);
    ctx.finish(ServiceKind::Hotel, base, rate, Some(nights), Some(per_night))
}

pub fn quote_tour(ctx: &QuoteContext<'_>, price_per_guest: Decimal, guests: u32) -> Result<BookingPricing, AppError> {
    let base = price_per_guest * Decimal::from(guests);
    ctx.finish(ServiceKind::Tour, base, ctx.tax.tour_gst_rate, None, Some(price_per_guest))
}

pub fn quote_food_order(ctx: &QuoteContext<'_>, items: &[FoodOrderItem]) -> Result<BookingPricing, AppError> {
    ctx.finish(ServiceKind::Food, order_subtotal(items), ctx.tax.food_gst_rate, None, None)
}

/// Price a cab ride or a set of bus seats
pub fn quote_ride(
    ctx: &QuoteContext<'_>,
    service: ServiceKind,
    fare: Decimal,
    units: u32,
) -> Result<BookingPricing, AppError> {
    let rate = match service {
        ServiceKind::Bus => ctx.tax.bus_gst_rate,
        _ => ctx.tax.cab_gst_rate,
    };
    ctx.finish(service, fare * Decimal::from(units), rate, None, Some(fare))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon(discount_type: DiscountType, value: Decimal) -> Coupon {
        Coupon {
            code: "WELCOME".to_string(),
            description: None,
            discount_type,
            value,
            min_amount: None,
            max_discount: None,
            active: true,
            expires_at: None,
            usage_limit: None,
            used_count: 0,
            applies_to: vec![],
        }
    }

    #[test]
    fn test_compute_gst_intrastate_split() {
        let tax = compute_gst(dec!(1000), dec!(0.18), false);
        assert_eq!(tax.gst_rate, dec!(0.18));
        assert_eq!(tax.taxable_value, dec!(1000));
        assert_eq!(tax.gst_amount, dec!(180));
        assert_eq!(tax.cgst, dec!(90));
        assert_eq!(tax.sgst, dec!(90));
        assert_eq!(tax.igst, dec!(0));
    }

    #[test]
    fn test_compute_gst_interstate() {
        let tax = compute_gst(dec!(1000), dec!(0.18), true);
        assert_eq!(tax.igst, dec!(180));
        assert_eq!(tax.cgst, dec!(0));
        assert_eq!(tax.sgst, dec!(0));
    }

    #[test]
    fn test_compute_gst_odd_cent_split() {
        // 0.05 × 100.30 = 5.015 → 5.02; cgst 2.51, sgst 2.51
        let tax = compute_gst(dec!(100.30), dec!(0.05), false);
        assert_eq!(tax.gst_amount, dec!(5.02));
        assert_eq!(tax.cgst + tax.sgst, dec!(5.02));

        // 0.05 × 100.10 = 5.005 → 5.01; cgst rounds 2.505 → 2.51, sgst 2.50
        let tax = compute_gst(dec!(100.10), dec!(0.05), false);
        assert_eq!(tax.gst_amount, dec!(5.01));
        assert_eq!(tax.cgst, dec!(2.51));
        assert_eq!(tax.sgst, dec!(2.50));
    }

    #[test]
    fn test_hotel_gst_rate_slabs() {
        let tax = TaxSettings::default();
        assert_eq!(hotel_gst_rate(dec!(800), &tax), dec!(0));
        assert_eq!(hotel_gst_rate(dec!(1000), &tax), dec!(0));
        assert_eq!(hotel_gst_rate(dec!(3200), &tax), dec!(0.12));
        assert_eq!(hotel_gst_rate(dec!(7500), &tax), dec!(0.12));
        assert_eq!(hotel_gst_rate(dec!(12000), &tax), dec!(0.18));
    }

    #[test]
    fn test_hotel_gst_rate_no_matching_slab() {
        let tax = TaxSettings { hotel_slabs: vec![], ..TaxSettings::default() };
        assert_eq!(hotel_gst_rate(dec!(5000), &tax), dec!(0));
    }

    #[test]
    fn test_days_between_floors_at_one() {
        let a = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();
        assert_eq!(days_between(a, b), 2);
        assert_eq!(days_between(a, a), 1);
        assert_eq!(days_between(b, a), 1);
    }

    #[test]
    fn test_percentage_coupon_with_cap() {
        let mut c = coupon(DiscountType::Percentage, dec!(20));
        c.max_discount = Some(dec!(150));
        let discount = apply_coupon(dec!(1000), &c, ServiceKind::Hotel, Utc::now()).unwrap();
        assert_eq!(discount, dec!(150));
    }

    #[test]
    fn test_fixed_coupon_never_exceeds_amount() {
        let c = coupon(DiscountType::FixedAmount, dec!(500));
        let discount = apply_coupon(dec!(300), &c, ServiceKind::Food, Utc::now()).unwrap();
        assert_eq!(discount, dec!(300));
    }

    #[test]
    fn test_coupon_rejections() {
        let now = Utc::now();

        let mut expired = coupon(DiscountType::Percentage, dec!(10));
        expired.expires_at = Some(now - Duration::days(1));
        assert!(apply_coupon(dec!(100), &expired, ServiceKind::Tour, now).is_err());

        let mut exhausted = coupon(DiscountType::Percentage, dec!(10));
        exhausted.usage_limit = Some(3);
        exhausted.used_count = 3;
        assert!(apply_coupon(dec!(100), &exhausted, ServiceKind::Tour, now).is_err());

        let mut scoped = coupon(DiscountType::Percentage, dec!(10));
        scoped.applies_to = vec!["food".to_string()];
        assert!(apply_coupon(dec!(100), &scoped, ServiceKind::Tour, now).is_err());
        assert!(apply_coupon(dec!(100), &scoped, ServiceKind::Food, now).is_ok());

        let mut minimum = coupon(DiscountType::Percentage, dec!(10));
        minimum.min_amount = Some(dec!(500));
        assert!(apply_coupon(dec!(499), &minimum, ServiceKind::Tour, now).is_err());

        let mut inactive = coupon(DiscountType::Percentage, dec!(10));
        inactive.active = false;
        assert!(apply_coupon(dec!(100), &inactive, ServiceKind::Tour, now).is_err());
    }

    #[test]
    fn test_quote_hotel_stay() {
        let tax = TaxSettings::default();
        let ctx = QuoteContext::new(&tax, Utc::now());
        let pricing = quote_hotel_stay(
            &ctx,
            dec!(3200),
            1,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        )
        .unwrap();

        assert_eq!(pricing.nights, Some(2));
        assert_eq!(pricing.base_amount, dec!(6400));
        assert_eq!(pricing.tax.gst_rate, dec!(0.12));
        assert_eq!(pricing.tax.gst_amount, dec!(768));
        assert_eq!(pricing.total, dec!(7168));
    }

    #[test]
    fn test_quote_tour_with_coupon_taxes_discounted_amount() {
        let tax = TaxSettings::default();
        let c = coupon(DiscountType::FixedAmount, dec!(100));
        let ctx = QuoteContext::new(&tax, Utc::now()).with_coupon(Some(&c));
        let pricing = quote_tour(&ctx, dec!(550), 2).unwrap();

        assert_eq!(pricing.base_amount, dec!(1100));
        assert_eq!(pricing.discount, dec!(100));
        assert_eq!(pricing.tax.taxable_value, dec!(1000));
        assert_eq!(pricing.tax.gst_amount, dec!(50));
        assert_eq!(pricing.total, dec!(1050));
        assert_eq!(pricing.coupon_code.as_deref(), Some("WELCOME"));
    }

    #[test]
    fn test_quote_food_order_sums_lines() {
        let tax = TaxSettings::default();
        let ctx = QuoteContext::new(&tax, Utc::now());
        let items = vec![
            FoodOrderItem { menu_item_id: None, name: "Dosa".into(), quantity: 2, price: dec!(120) },
            FoodOrderItem { menu_item_id: None, name: "Tea".into(), quantity: 1, price: dec!(30) },
        ];
        let pricing = quote_food_order(&ctx, &items).unwrap();
        assert_eq!(pricing.base_amount, dec!(270));
        assert_eq!(pricing.tax.gst_amount, dec!(13.50));
        assert_eq!(pricing.total, dec!(283.50));
    }

    #[test]
    fn test_quote_bus_interstate() {
        let tax = TaxSettings { home_state: Some("Kerala".into()), ..TaxSettings::default() };
        let ctx = QuoteContext::new(&tax, Utc::now()).with_billing_state(Some("Tamil Nadu"));
        let pricing = quote_ride(&ctx, ServiceKind::Bus, dec!(600), 2).unwrap();
        assert_eq!(pricing.base_amount, dec!(1200));
        assert_eq!(pricing.tax.igst, dec!(60));
        assert_eq!(pricing.tax.cgst, dec!(0));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// GST halves always add back up and the amount is the 2dp-rounded product
    #[test]
    fn prop_gst_rounding() {
        proptest!(|(
            taxable_cents in 0i64..=100_000_000,
            rate_bps in 0i64..=10_000,
            interstate in any::<bool>()
        )| {
            let taxable = Decimal::new(taxable_cents, 2);
            let rate = Decimal::new(rate_bps, 4);
            let tax = compute_gst(taxable, rate, interstate);

            prop_assert_eq!(tax.gst_amount, round_money(taxable * rate));
            if interstate {
                prop_assert_eq!(tax.igst, tax.gst_amount);
                prop_assert_eq!(tax.cgst + tax.sgst, Decimal::ZERO);
            } else {
                prop_assert_eq!(tax.cgst + tax.sgst, tax.gst_amount);
                prop_assert_eq!(tax.igst, Decimal::ZERO);
            }
            prop_assert!(tax.cgst >= Decimal::ZERO && tax.sgst >= Decimal::ZERO);
        });
    }

    #[test]
    fn prop_days_between_at_least_one() {
        proptest!(|(start in 0i64..20_000, span in 1i64..400)| {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
            let a = base + chrono::Duration::days(start);
            let b = a + chrono::Duration::days(span);
            prop_assert_eq!(days_between(a, b), span);
            prop_assert!(days_between(a, b) >= 1);
        });
    }

    #[test]
    fn prop_coupon_discount_bounded_by_amount() {
        proptest!(|(amount_cents in 0i64..10_000_000, value in 0i64..=200, fixed in any::<bool>())| {
            let amount = Decimal::new(amount_cents, 2);
            let coupon = Coupon {
                code: "P".into(),
                description: None,
                discount_type: if fixed { DiscountType::FixedAmount } else { DiscountType::Percentage },
                value: Decimal::from(value),
                min_amount: None,
                max_discount: None,
                active: true,
                expires_at: None,
                usage_limit: None,
                used_count: 0,
                applies_to: vec![],
            };
            let discount = apply_coupon(amount, &coupon, ServiceKind::Food, Utc::now()).unwrap();
            prop_assert!(discount >= Decimal::ZERO);
            prop_assert!(discount <= amount);
        });
    }
}
