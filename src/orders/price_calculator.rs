use rust_decimal::Decimal;

/// Line and order arithmetic for food orders
pub struct PriceCalculator;

impl PriceCalculator {
    /// Calculate subtotal for an order line
    ///
    /// # Arguments
    /// * `quantity` - Units ordered
    /// * `unit_price` - Menu price frozen on the line when the order was placed
    ///
    /// # Returns
    /// Subtotal as Decimal (quantity * unit_price)
    pub fn calculate_subtotal(quantity: u32, unit_price: Decimal) -> Decimal {
        Decimal::from(quantity) * unit_price
    }

    /// Sum of all line subtotals
    pub fn calculate_total(subtotals: &[Decimal]) -> Decimal {
        subtotals.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_calculate_subtotal_basic() {
        assert_eq!(PriceCalculator::calculate_subtotal(2, dec!(120)), dec!(240));
    }

    #[test]
    fn test_calculate_subtotal_zero_priced_line() {
        assert_eq!(PriceCalculator::calculate_subtotal(4, dec!(0)), dec!(0));
    }

    #[test]
    fn test_calculate_total_multiple_items() {
        let subtotals = vec![dec!(240.00), dec!(55.50), dec!(3.25)];
        assert_eq!(PriceCalculator::calculate_total(&subtotals), dec!(298.75));
    }

    #[test]
    fn test_calculate_total_empty() {
        assert_eq!(PriceCalculator::calculate_total(&[]), dec!(0));
    }

    #[test]
    fn test_decimal_precision() {
        assert_eq!(PriceCalculator::calculate_subtotal(3, dec!(4.33)), dec!(12.99));
    }
}
