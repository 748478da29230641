//! Comprehensive tests for domain_billing

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::round2;

use domain_billing::{
    calculate_invoice_amounts, invoice_postings, net_balance, sales_credit_posting,
    with_running_balance, available_credit, CalcMode, CalculationInput, EntryType,
    LineItemInput, OtherTaxInput, ReferenceType,
};
use test_utils::{InvoiceBuilder, LineItemBuilder};

fn widget_line() -> LineItemInput {
    LineItemBuilder::new()
        .with_quantity(dec!(2))
        .with_rate(dec!(100))
        .with_gst_percent(dec!(18))
        .build()
}

fn input_with(
    items: Vec<LineItemInput>,
    opening_balance: Decimal,
    paid_amount: Decimal,
    use_available_balance: bool,
) -> CalculationInput {
    CalculationInput {
        items,
        invoice_gst_percent: None,
        opening_balance,
        paid_amount,
        use_available_balance,
    }
}

// ============================================================================
// Calculator Tests
// ============================================================================

mod calculator_tests {
    use super::*;

    #[test]
    fn test_widget_invoice_totals() {
        let input = input_with(vec![widget_line()], Decimal::ZERO, Decimal::ZERO, false);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.subtotal, dec!(200.00));
        assert_eq!(amounts.gst_total, dec!(36.00));
        assert_eq!(amounts.other_tax_total, dec!(0.00));
        assert_eq!(amounts.grand_total, dec!(236.00));
        assert_eq!(amounts.final_payable_amount, dec!(236.00));
        assert_eq!(amounts.applied_balance, dec!(0.00));
    }

    #[test]
    fn test_opening_balance_fully_consumed() {
        let input = input_with(vec![widget_line()], dec!(50), Decimal::ZERO, true);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.applied_balance, dec!(50.00));
        assert_eq!(amounts.final_payable_amount, dec!(186.00));
        assert_eq!(amounts.remaining_balance, dec!(0.00));
    }

    #[test]
    fn test_opening_balance_capped_at_max_usable() {
        // grand 100, paid 40 leaves 60 usable of an 80 credit balance
        let line = LineItemBuilder::new().with_rate(dec!(100)).build();
        let input = input_with(vec![line], dec!(80), dec!(40), true);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.grand_total, dec!(100.00));
        assert_eq!(amounts.applied_balance, dec!(60.00));
        assert_eq!(amounts.final_payable_amount, dec!(0.00));
        assert_eq!(amounts.remaining_balance, dec!(20.00));
    }

    #[test]
    fn test_balance_untouched_when_flag_off() {
        let input = input_with(vec![widget_line()], dec!(500), Decimal::ZERO, false);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.applied_balance, dec!(0.00));
        assert_eq!(amounts.remaining_balance, dec!(500.00));
        assert_eq!(amounts.final_payable_amount, dec!(236.00));
    }

    #[test]
    fn test_negative_opening_balance_clamped_to_zero() {
        // A party in net debit has no credit to apply
        let input = input_with(vec![widget_line()], dec!(-75), Decimal::ZERO, true);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.opening_balance, dec!(0.00));
        assert_eq!(amounts.applied_balance, dec!(0.00));
        assert_eq!(amounts.final_payable_amount, dec!(236.00));
    }

    #[test]
    fn test_multi_line_totals_sum_components() {
        let items = vec![
            LineItemBuilder::new()
                .with_name("Consulting")
                .with_quantity(dec!(3))
                .with_rate(dec!(150.50))
                .with_gst_percent(dec!(18))
                .build(),
            LineItemBuilder::new()
                .with_name("Hardware")
                .with_quantity(dec!(1))
                .with_rate(dec!(999.99))
                .with_gst_percent(dec!(12))
                .with_other_tax("Cess", dec!(1))
                .build(),
        ];
        let input = input_with(items, Decimal::ZERO, Decimal::ZERO, false);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.subtotal, dec!(1451.49));
        assert_eq!(
            amounts.grand_total,
            round2(amounts.subtotal + amounts.gst_total + amounts.other_tax_total)
        );
    }

    #[test]
    fn test_invoice_level_gst_applies_to_untagged_lines() {
        let items = vec![
            LineItemInput {
                name: "Untagged".to_string(),
                quantity: dec!(1),
                rate: dec!(100),
                gst_percent: None,
                other_taxes: vec![],
            },
            LineItemInput {
                name: "Zero rated".to_string(),
                quantity: dec!(1),
                rate: dec!(100),
                gst_percent: Some(Decimal::ZERO),
                other_taxes: vec![],
            },
        ];
        let input = CalculationInput {
            invoice_gst_percent: Some(dec!(5)),
            ..input_with(items, Decimal::ZERO, Decimal::ZERO, false)
        };

        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
        assert_eq!(amounts.gst_total, dec!(5.00));
        assert_eq!(amounts.items[0].gst_percent, dec!(5));
        assert_eq!(amounts.items[1].gst_percent, Decimal::ZERO);
    }

    #[test]
    fn test_strict_rejects_negative_quantity_preview_zeroes() {
        let mut input = input_with(vec![widget_line()], Decimal::ZERO, Decimal::ZERO, false);
        input.items[0].quantity = dec!(-2);

        assert!(calculate_invoice_amounts(&input, CalcMode::Strict).is_err());

        let amounts = calculate_invoice_amounts(&input, CalcMode::Preview).unwrap();
        assert_eq!(amounts.grand_total, dec!(0.00));
    }

    #[test]
    fn test_strict_rejects_negative_paid_amount() {
        let input = input_with(vec![widget_line()], Decimal::ZERO, dec!(-10), false);
        assert!(calculate_invoice_amounts(&input, CalcMode::Strict).is_err());
    }

    #[test]
    fn test_recomputation_is_bit_identical() {
        let input = input_with(vec![widget_line()], dec!(73.21), dec!(11.11), true);

        let first = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
        let second = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
        assert_eq!(first, second);
    }
}

// ============================================================================
// Tax Normalization Tests
// ============================================================================

mod tax_tests {
    use super::*;

    #[test]
    fn test_unnamed_other_tax_gets_default_name() {
        let line = LineItemInput {
            name: "Widget".to_string(),
            quantity: dec!(1),
            rate: dec!(100),
            gst_percent: Some(Decimal::ZERO),
            other_taxes: vec![OtherTaxInput {
                name: None,
                percent: dec!(2),
            }],
        };
        let input = input_with(vec![line], Decimal::ZERO, Decimal::ZERO, false);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.items[0].other_taxes[0].name, "Other Tax");
        assert_eq!(amounts.items[0].other_taxes[0].amount, dec!(2.00));
        assert_eq!(amounts.other_tax_total, dec!(2.00));
    }

    #[test]
    fn test_negative_other_tax_strict_fails_preview_zeroes() {
        let line = LineItemBuilder::new()
            .with_other_tax("Levy", dec!(-5))
            .build();
        let input = input_with(vec![line], Decimal::ZERO, Decimal::ZERO, false);

        assert!(calculate_invoice_amounts(&input, CalcMode::Strict).is_err());

        let amounts = calculate_invoice_amounts(&input, CalcMode::Preview).unwrap();
        assert_eq!(amounts.other_tax_total, dec!(0.00));
    }

    #[test]
    fn test_other_taxes_computed_on_pre_gst_subtotal() {
        // 2% of the 200 subtotal, not of the GST-inclusive amount
        let line = LineItemBuilder::new()
            .with_quantity(dec!(2))
            .with_rate(dec!(100))
            .with_gst_percent(dec!(18))
            .with_other_tax("Cess", dec!(2))
            .build();
        let input = input_with(vec![line], Decimal::ZERO, Decimal::ZERO, false);
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

        assert_eq!(amounts.other_tax_total, dec!(4.00));
        assert_eq!(amounts.grand_total, dec!(240.00));
    }
}

// ============================================================================
// Posting Derivation Tests
// ============================================================================

mod posting_tests {
    use super::*;

    #[test]
    fn test_unpaid_invoice_yields_single_credit() {
        let invoice = InvoiceBuilder::new()
            .with_items(vec![widget_line()])
            .build();

        let postings = invoice_postings(&invoice);
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].entry_type, EntryType::Credit);
        assert_eq!(postings[0].amount, invoice.grand_total);
        assert_eq!(postings[0].reference_type, ReferenceType::Invoice);
        assert_eq!(postings[0].reference_id, Some(invoice.id));
        assert_eq!(
            postings[0].description.as_deref(),
            Some("Invoice #1 - Acme Traders - Sales value")
        );
    }

    #[test]
    fn test_payment_and_applied_balance_each_add_a_debit() {
        let invoice = InvoiceBuilder::new()
            .with_items(vec![widget_line()])
            .with_paid_amount(dec!(36))
            .with_opening_balance(dec!(50))
            .using_available_balance()
            .build();

        assert_eq!(invoice.paid_amount, dec!(36.00));
        assert_eq!(invoice.applied_balance, dec!(50.00));

        let postings = invoice_postings(&invoice);
        assert_eq!(postings.len(), 3);

        let credits: Vec<_> = postings
            .iter()
            .filter(|p| p.entry_type == EntryType::Credit)
            .collect();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].amount, invoice.grand_total);

        let debit_amounts: Vec<Decimal> = postings
            .iter()
            .filter(|p| p.entry_type == EntryType::Debit)
            .map(|p| p.amount)
            .collect();
        assert_eq!(debit_amounts, vec![dec!(36.00), dec!(50.00)]);
    }

    #[test]
    fn test_zero_amounts_never_produce_postings() {
        let invoice = InvoiceBuilder::new()
            .with_items(vec![widget_line()])
            .with_opening_balance(dec!(40))
            .build();

        // Flag off, so nothing applied; no payment either
        let postings = invoice_postings(&invoice);
        assert_eq!(postings.len(), 1);
        assert!(postings.iter().all(|p| p.amount > Decimal::ZERO));
    }

    #[test]
    fn test_all_postings_share_invoice_date_and_party() {
        let invoice = InvoiceBuilder::new()
            .with_items(vec![widget_line()])
            .with_paid_amount(dec!(100))
            .build();

        for posting in invoice_postings(&invoice) {
            assert_eq!(posting.date, invoice.invoice_date);
            assert_eq!(posting.party_name.as_deref(), Some("Acme Traders"));
            assert_eq!(posting.business_id, invoice.business_id);
        }
    }
}

// ============================================================================
// Revision Tests
// ============================================================================

mod revision_tests {
    use super::*;

    // Editing an invoice recomputes item totals only. The settlement was
    // written into the ledger at creation time, so it must read back
    // unchanged no matter what the new items total.
    #[test]
    fn test_revision_keeps_settlement_as_recorded() {
        let invoice = InvoiceBuilder::new()
            .with_items(vec![widget_line()])
            .with_opening_balance(dec!(50))
            .using_available_balance()
            .build();

        assert_eq!(invoice.grand_total, dec!(236.00));
        assert_eq!(invoice.applied_balance, dec!(50.00));
        assert_eq!(invoice.final_payable_amount, dec!(186.00));
        let applied_posting = invoice_postings(&invoice)
            .into_iter()
            .find(|p| p.entry_type == EntryType::Debit)
            .unwrap();
        assert_eq!(applied_posting.amount, dec!(50.00));

        // Replace the items with a much cheaper set
        let cheaper = LineItemBuilder::new().with_rate(dec!(40)).build();
        let amounts = calculate_invoice_amounts(
            &CalculationInput {
                items: vec![cheaper],
                invoice_gst_percent: None,
                opening_balance: invoice.opening_balance,
                paid_amount: invoice.paid_amount,
                use_available_balance: invoice.use_available_balance,
            },
            CalcMode::Strict,
        )
        .unwrap();
        let revised = invoice.with_revised_totals(amounts);

        assert_eq!(revised.grand_total, dec!(40.00));
        // Settlement still reads exactly as the creation-time posting does
        assert_eq!(revised.applied_balance, applied_posting.amount);
        assert_eq!(revised.remaining_balance, dec!(0.00));
        assert_eq!(revised.final_payable_amount, dec!(186.00));
    }

    #[test]
    fn test_revision_updates_only_item_derived_fields() {
        let invoice = InvoiceBuilder::new()
            .with_items(vec![widget_line()])
            .with_paid_amount(dec!(36))
            .build();
        let paid_before = invoice.paid_amount;

        let amounts = calculate_invoice_amounts(
            &CalculationInput {
                items: vec![widget_line(), widget_line()],
                invoice_gst_percent: None,
                opening_balance: invoice.opening_balance,
                paid_amount: invoice.paid_amount,
                use_available_balance: invoice.use_available_balance,
            },
            CalcMode::Strict,
        )
        .unwrap();
        let revised = invoice.with_revised_totals(amounts);

        assert_eq!(revised.subtotal, dec!(400.00));
        assert_eq!(revised.gst_total, dec!(72.00));
        assert_eq!(revised.grand_total, dec!(472.00));
        assert_eq!(revised.paid_amount, paid_before);
        // The replacement sales posting carries the new grand total
        assert_eq!(sales_credit_posting(&revised).amount, dec!(472.00));
    }
}

// ============================================================================
// Balance Resolution Tests
// ============================================================================

mod balance_tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use core_kernel::{BusinessId, LedgerEntryId};
    use domain_billing::LedgerEntry;

    fn acme_entry(entry_type: EntryType, amount: Decimal) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new_v7(),
            business_id: BusinessId::new(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            entry_type,
            amount,
            party_name: Some("Acme".to_string()),
            reference_type: ReferenceType::Manual,
            reference_id: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_party_balance_is_credits_minus_debits() {
        let entries = vec![
            acme_entry(EntryType::Credit, dec!(500)),
            acme_entry(EntryType::Debit, dec!(200)),
        ];

        let net = net_balance(&entries);
        assert_eq!(net, dec!(300));
        assert_eq!(available_credit(net), dec!(300));
    }

    #[test]
    fn test_net_debit_position_floors_to_zero_credit() {
        let entries = vec![
            acme_entry(EntryType::Credit, dec!(500)),
            acme_entry(EntryType::Debit, dec!(200)),
            acme_entry(EntryType::Debit, dec!(400)),
        ];

        let net = net_balance(&entries);
        assert_eq!(net, dec!(-100));
        assert_eq!(available_credit(net), Decimal::ZERO);
    }

    #[test]
    fn test_running_balance_starts_from_opening() {
        let entries = vec![
            acme_entry(EntryType::Credit, dec!(500)),
            acme_entry(EntryType::Debit, dec!(200)),
            acme_entry(EntryType::Debit, dec!(400)),
        ];

        let lines = with_running_balance(entries, dec!(1000));
        let balances: Vec<Decimal> = lines
            .iter()
            .map(|l| l.balance_after_transaction)
            .collect();
        assert_eq!(balances, vec![dec!(1500), dec!(1300), dec!(900)]);
    }
}

// ============================================================================
// Serialization Tests
// ============================================================================

mod serialization_tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use core_kernel::{BusinessId, LedgerEntryId};
    use domain_billing::LedgerEntry;

    #[test]
    fn invoice_serializes_wire_field_names() {
        let invoice = InvoiceBuilder::new()
            .with_items(vec![widget_line()])
            .build();

        let json = serde_json::to_value(&invoice).unwrap();
        assert!(json.get("grandTotal").is_some());
        assert!(json.get("finalPayableAmount").is_some());
        assert!(json.get("useAvailableBalance").is_some());
        assert_eq!(json["status"], "DRAFT");
        assert_eq!(json["items"][0]["gstPercent"], serde_json::json!("18"));
    }

    #[test]
    fn ledger_entry_serializes_type_keyword() {
        let entry = LedgerEntry {
            id: LedgerEntryId::new_v7(),
            business_id: BusinessId::new(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            entry_type: EntryType::Credit,
            amount: dec!(500),
            party_name: Some("Acme".to_string()),
            reference_type: ReferenceType::Manual,
            reference_id: None,
            description: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "CREDIT");
        assert_eq!(json["referenceType"], "MANUAL");
        assert_eq!(json["partyName"], "Acme");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use test_utils::generators::calculation_input_strategy;

    proptest! {
        #[test]
        fn prop_grand_total_is_sum_of_components(input in calculation_input_strategy()) {
            let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

            prop_assert_eq!(
                amounts.grand_total,
                round2(amounts.subtotal + amounts.gst_total + amounts.other_tax_total)
            );
            prop_assert_eq!(amounts.subtotal, round2(amounts.subtotal));
            prop_assert_eq!(amounts.gst_total, round2(amounts.gst_total));
            prop_assert_eq!(amounts.other_tax_total, round2(amounts.other_tax_total));
        }

        #[test]
        fn prop_settlement_equation_holds(
            input in calculation_input_strategy(),
            paid_percent in 0u32..=100u32,
        ) {
            // Derive a valid payment from the invoice's own grand total
            let grand = calculate_invoice_amounts(&input, CalcMode::Strict)
                .unwrap()
                .grand_total;
            let mut input = input;
            input.paid_amount = round2(grand * Decimal::from(paid_percent) / Decimal::from(100u32));

            let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();

            prop_assert!(amounts.final_payable_amount >= Decimal::ZERO);
            prop_assert_eq!(
                amounts.final_payable_amount,
                round2(amounts.grand_total - amounts.paid_amount - amounts.applied_balance)
            );
            prop_assert!(amounts.applied_balance <= amounts.opening_balance);
            prop_assert_eq!(
                amounts.remaining_balance,
                round2(amounts.opening_balance - amounts.applied_balance)
            );
        }

        #[test]
        fn prop_applied_balance_zero_when_flag_off(input in calculation_input_strategy()) {
            let mut input = input;
            input.use_available_balance = false;

            let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
            prop_assert_eq!(amounts.applied_balance, Decimal::ZERO);
        }

        #[test]
        fn prop_calculation_is_pure(input in calculation_input_strategy()) {
            let first = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
            let second = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_preview_never_fails_on_any_signs(
            quantity in -1000i64..1000i64,
            rate in -100000i64..100000i64,
            paid in -100000i64..100000i64,
        ) {
            let input = CalculationInput {
                items: vec![LineItemInput {
                    name: "Anything".to_string(),
                    quantity: Decimal::new(quantity, 1),
                    rate: Decimal::new(rate, 2),
                    gst_percent: Some(dec!(18)),
                    other_taxes: vec![],
                }],
                invoice_gst_percent: None,
                opening_balance: Decimal::ZERO,
                paid_amount: Decimal::new(paid, 2),
                use_available_balance: false,
            };

            let amounts = calculate_invoice_amounts(&input, CalcMode::Preview).unwrap();
            prop_assert!(amounts.final_payable_amount >= Decimal::ZERO);
        }
    }
}
