//! Invoice and line item database operations.
//!
//! Writes are free functions over a [`Connection`] so the ledger can run them
//! inside one [`rusqlite::Transaction`]; reads hang off [`Database`].

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use rust_decimal::Decimal;

use super::{like_pattern, money_column, money_to_sql, Database, DbResult};
use crate::billing::{Discount, Totals, INVOICE_PREFIX};
use crate::models::{
    Invoice, InvoiceFilter, InvoiceId, InvoiceLine, InvoiceSummary, LabTestId, Page, Paged,
    PatientId, TestResult,
};

const INVOICE_COLUMNS: &str = "i.id, i.invoice_number, i.patient_id, i.total_amount, \
     i.discount_type, i.discount_value, i.final_amount, i.request_key, i.created_at";

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        patient_id: row.get(2)?,
        total_amount: money_column(row, 3)?,
        discount_type: row.get(4)?,
        discount_value: money_column(row, 5)?,
        final_amount: money_column(row, 6)?,
        request_key: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Header values for a new invoice, computed before anything is written.
#[derive(Debug, Clone)]
pub struct NewInvoice<'a> {
    pub invoice_number: &'a str,
    pub patient_id: PatientId,
    pub totals: Totals,
    pub discount: Discount,
    pub request_key: Option<&'a str>,
    pub created_at: &'a str,
}

/// Insert an invoice header.
pub fn insert_invoice(conn: &Connection, invoice: &NewInvoice<'_>) -> DbResult<Invoice> {
    conn.execute(
        r#"
        INSERT INTO invoices (
            invoice_number, patient_id, total_amount, discount_type,
            discount_value, final_amount, request_key, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            invoice.invoice_number,
            invoice.patient_id,
            money_to_sql(invoice.totals.net),
            invoice.discount.kind(),
            money_to_sql(invoice.discount.value()),
            money_to_sql(invoice.totals.final_amount),
            invoice.request_key,
            invoice.created_at,
        ],
    )?;

    Ok(Invoice {
        id: conn.last_insert_rowid(),
        invoice_number: invoice.invoice_number.to_string(),
        patient_id: invoice.patient_id,
        total_amount: crate::billing::to_money(invoice.totals.net),
        discount_type: invoice.discount.kind(),
        discount_value: crate::billing::to_money(invoice.discount.value()),
        final_amount: crate::billing::to_money(invoice.totals.final_amount),
        request_key: invoice.request_key.map(str::to_string),
        created_at: invoice.created_at.to_string(),
    })
}

/// Insert one line item for an invoice.
pub fn insert_test_result(
    conn: &Connection,
    invoice_id: InvoiceId,
    test_id: LabTestId,
    price: Decimal,
    created_at: &str,
) -> DbResult<TestResult> {
    conn.execute(
        "INSERT INTO test_results (invoice_id, test_id, price, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![invoice_id, test_id, money_to_sql(price), created_at],
    )?;

    Ok(TestResult {
        id: conn.last_insert_rowid(),
        invoice_id,
        test_id,
        price: crate::billing::to_money(price),
        created_at: created_at.to_string(),
    })
}

/// One invoice's amounts, keyed by its UTC calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAmounts {
    pub date: String,
    pub total_amount: Decimal,
    pub final_amount: Decimal,
}

impl Database {
    /// Get an invoice header by ID.
    pub fn get_invoice(&self, id: InvoiceId) -> DbResult<Option<Invoice>> {
        self.conn
            .query_row(
                &format!("SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.id = ?"),
                [id],
                invoice_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the invoice created under an idempotency key.
    pub fn find_invoice_by_request_key(&self, key: &str) -> DbResult<Option<Invoice>> {
        self.conn
            .query_row(
                &format!("SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.request_key = ?"),
                [key],
                invoice_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Raw line items of an invoice, in insertion order.
    pub fn get_test_results(&self, invoice_id: InvoiceId) -> DbResult<Vec<TestResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, invoice_id, test_id, price, created_at
            FROM test_results WHERE invoice_id = ? ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([invoice_id], |row| {
            Ok(TestResult {
                id: row.get(0)?,
                invoice_id: row.get(1)?,
                test_id: row.get(2)?,
                price: money_column(row, 3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Line items joined with the test name, for receipts.
    pub fn get_invoice_lines(&self, invoice_id: InvoiceId) -> DbResult<Vec<InvoiceLine>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.test_id, t.name, r.price
            FROM test_results r JOIN tests t ON t.id = r.test_id
            WHERE r.invoice_id = ? ORDER BY r.id
            "#,
        )?;
        let rows = stmt.query_map([invoice_id], |row| {
            Ok(InvoiceLine {
                test_id: row.get(0)?,
                name: row.get(1)?,
                price: money_column(row, 2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// One page of invoices with patient name and phone. Newest first.
    pub fn list_invoices(&self, filter: &InvoiceFilter, page: Page) -> DbResult<Paged<InvoiceSummary>> {
        let mut clauses = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(number) = filter.invoice_number.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            args.push(Box::new(like_pattern(number)));
            clauses.push(format!(r"i.invoice_number LIKE ?{} ESCAPE '\'", args.len()));
        }
        if let Some(name) = filter.patient_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            args.push(Box::new(like_pattern(name)));
            clauses.push(format!(r"p.name LIKE ?{} ESCAPE '\'", args.len()));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let total_items: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM invoices i JOIN patients p ON p.id = i.patient_id{where_clause}"
            ),
            rusqlite::params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}, p.name, p.phone
            FROM invoices i JOIN patients p ON p.id = i.patient_id{where_clause}
            ORDER BY i.id DESC
            LIMIT {} OFFSET {}
            "#,
            page.size,
            page.offset()
        ))?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok(InvoiceSummary {
                invoice: invoice_from_row(row)?,
                patient_name: row.get(9)?,
                patient_phone: row.get(10)?,
            })
        })?;
        let items = rows.collect::<Result<Vec<_>, _>>()?;

        let total_items = total_items.max(0) as u64;
        Ok(Paged {
            items,
            current_page: page.number,
            total_pages: page.total_pages(total_items),
            total_items,
        })
    }

    /// Count invoice headers.
    pub fn count_invoices(&self) -> DbResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Numeric part of the highest stored `INV-<n>` number.
    pub fn latest_invoice_sequence(&self) -> DbResult<Option<i64>> {
        self.conn
            .query_row(
                r#"
                SELECT MAX(CAST(substr(invoice_number, ?1) AS INTEGER))
                FROM invoices WHERE invoice_number LIKE ?2
                "#,
                params![INVOICE_PREFIX.len() as i64 + 1, format!("{INVOICE_PREFIX}%")],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Amounts of every invoice with its day, newest day first.
    pub fn invoice_amounts_by_day(&self) -> DbResult<Vec<DailyAmounts>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT substr(created_at, 1, 10) AS day, total_amount, final_amount
            FROM invoices ORDER BY day DESC, id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DailyAmounts {
                date: row.get(0)?,
                total_amount: money_column(row, 1)?,
                final_amount: money_column(row, 2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
