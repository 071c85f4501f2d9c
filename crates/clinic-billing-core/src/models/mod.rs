//! Domain models for the clinic billing system.

mod catalog;
mod invoice;
mod patient;

pub use catalog::*;
pub use invoice::*;
pub use patient::*;

/// Timestamp format used for every stored `created_at` / `updated_at`.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub const MAX_SIZE: u32 = 100;

    /// Clamp to page >= 1 and 1 <= size <= `MAX_SIZE`.
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    pub fn total_pages(&self, total_items: u64) -> u32 {
        let size = u64::from(self.size);
        u32::try_from(total_items.div_ceil(size)).unwrap_or(u32::MAX)
    }
}
