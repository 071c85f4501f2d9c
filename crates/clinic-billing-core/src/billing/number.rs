//! Invoice number generation.

use std::sync::atomic::{AtomicI64, Ordering};

pub const INVOICE_PREFIX: &str = "INV-";

/// Issues `INV-<millis>` numbers that strictly increase within a process.
///
/// When two calls land in the same millisecond (or the clock steps back) the
/// next number is `last + 1`, so numbers never collide and still sort by
/// creation order.
#[derive(Debug, Default)]
pub struct InvoiceNumberGenerator {
    last: AtomicI64,
}

impl InvoiceNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after `last_issued` (typically the highest stored number).
    pub fn seeded(last_issued: i64) -> Self {
        Self {
            last: AtomicI64::new(last_issued),
        }
    }

    pub fn next_number(&self) -> String {
        self.next_at(chrono::Utc::now().timestamp_millis())
    }

    fn next_at(&self, now_ms: i64) -> String {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format!("{INVOICE_PREFIX}{candidate}"),
                Err(actual) => current = actual,
            }
        }
    }

    /// Extract the numeric part of an invoice number.
    pub fn parse(number: &str) -> Option<i64> {
        number.strip_prefix(INVOICE_PREFIX)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_format_uses_clock() {
        let gen = InvoiceNumberGenerator::new();
        assert_eq!(gen.next_at(1_700_000_000_000), "INV-1700000000000");
    }

    #[test]
    fn test_same_millisecond_increments() {
        let gen = InvoiceNumberGenerator::new();
        assert_eq!(gen.next_at(1000), "INV-1000");
        assert_eq!(gen.next_at(1000), "INV-1001");
        // Clock moved backwards
        assert_eq!(gen.next_at(900), "INV-1002");
        assert_eq!(gen.next_at(5000), "INV-5000");
    }

    #[test]
    fn test_seeded_continues_after_stored_number() {
        let gen = InvoiceNumberGenerator::seeded(2000);
        assert_eq!(gen.next_at(1500), "INV-2001");
    }

    #[test]
    fn test_parse() {
        assert_eq!(InvoiceNumberGenerator::parse("INV-42"), Some(42));
        assert_eq!(InvoiceNumberGenerator::parse("BILL-42"), None);
        assert_eq!(InvoiceNumberGenerator::parse("INV-x"), None);
    }

    #[test]
    fn test_unique_across_threads() {
        let gen = Arc::new(InvoiceNumberGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || (0..250).map(|_| gen.next_number()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap() {
                assert!(seen.insert(number), "duplicate invoice number");
            }
        }
        assert_eq!(seen.len(), 2000);
    }
}
