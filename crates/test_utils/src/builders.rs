//! Builders for billing domain objects

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BusinessId, InvoiceId};
use domain_billing::{
    calculate_invoice_amounts, CalcMode, CalculationInput, CustomerDetails, Invoice,
    InvoiceStatus, LineItemInput, OtherTaxInput,
};

use crate::fixtures::{MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for raw invoice line inputs
pub struct LineItemBuilder {
    name: String,
    quantity: Decimal,
    rate: Decimal,
    gst_percent: Option<Decimal>,
    other_taxes: Vec<OtherTaxInput>,
}

impl LineItemBuilder {
    pub fn new() -> Self {
        Self {
            name: StringFixtures::item_name().to_string(),
            quantity: dec!(1),
            rate: MoneyFixtures::standard_rate(),
            gst_percent: None,
            other_taxes: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_gst_percent(mut self, percent: Decimal) -> Self {
        self.gst_percent = Some(percent);
        self
    }

    pub fn with_other_tax(mut self, name: &str, percent: Decimal) -> Self {
        self.other_taxes.push(OtherTaxInput {
            name: Some(name.to_string()),
            percent,
        });
        self
    }

    pub fn build(self) -> LineItemInput {
        LineItemInput {
            name: self.name,
            quantity: self.quantity,
            rate: self.rate,
            gst_percent: self.gst_percent,
            other_taxes: self.other_taxes,
        }
    }
}

impl Default for LineItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for fully computed invoices
///
/// Runs the strict calculator over the configured lines, so the resulting
/// invoice carries internally consistent amounts.
pub struct InvoiceBuilder {
    business_id: BusinessId,
    invoice_number: i64,
    customer_name: String,
    items: Vec<LineItemInput>,
    invoice_gst_percent: Option<Decimal>,
    opening_balance: Decimal,
    paid_amount: Decimal,
    use_available_balance: bool,
    status: InvoiceStatus,
}

impl InvoiceBuilder {
    pub fn new() -> Self {
        Self {
            business_id: BusinessId::new(),
            invoice_number: 1,
            customer_name: StringFixtures::customer_name().to_string(),
            items: vec![LineItemBuilder::new().build()],
            invoice_gst_percent: None,
            opening_balance: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            use_available_balance: false,
            status: InvoiceStatus::Draft,
        }
    }

    pub fn with_business_id(mut self, business_id: BusinessId) -> Self {
        self.business_id = business_id;
        self
    }

    pub fn with_invoice_number(mut self, number: i64) -> Self {
        self.invoice_number = number;
        self
    }

    pub fn with_customer_name(mut self, name: &str) -> Self {
        self.customer_name = name.to_string();
        self
    }

    pub fn with_items(mut self, items: Vec<LineItemInput>) -> Self {
        self.items = items;
        self
    }

    pub fn with_invoice_gst_percent(mut self, percent: Decimal) -> Self {
        self.invoice_gst_percent = Some(percent);
        self
    }

    pub fn with_opening_balance(mut self, balance: Decimal) -> Self {
        self.opening_balance = balance;
        self
    }

    pub fn with_paid_amount(mut self, paid: Decimal) -> Self {
        self.paid_amount = paid;
        self
    }

    pub fn using_available_balance(mut self) -> Self {
        self.use_available_balance = true;
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Invoice {
        let input = CalculationInput {
            items: self.items,
            invoice_gst_percent: self.invoice_gst_percent,
            opening_balance: self.opening_balance,
            paid_amount: self.paid_amount,
            use_available_balance: self.use_available_balance,
        };
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict)
            .expect("builder produced an invalid calculation input");

        let now = Utc::now();
        Invoice {
            id: InvoiceId::new_v7(),
            business_id: self.business_id,
            invoice_number: self.invoice_number,
            document_number: None,
            customer: CustomerDetails {
                name: self.customer_name,
                email: None,
                phone: None,
                address: None,
            },
            invoice_date: TemporalFixtures::invoice_date(),
            due_date: None,
            items: amounts.items,
            subtotal: amounts.subtotal,
            gst_total: amounts.gst_total,
            other_tax_total: amounts.other_tax_total,
            grand_total: amounts.grand_total,
            opening_balance: amounts.opening_balance,
            paid_amount: amounts.paid_amount,
            use_available_balance: amounts.use_available_balance,
            applied_balance: amounts.applied_balance,
            remaining_balance: amounts.remaining_balance,
            final_payable_amount: amounts.final_payable_amount,
            status: self.status,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for InvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
