//! Lab test catalog service: validated CRUD over the `tests` table.

use tracing::info;

use crate::db::Database;
use crate::error::{BillingError, BillingResult};
use crate::models::{LabTest, LabTestChanges, LabTestId, LabTestInput, NewLabTest};
use crate::validation::{self, Violations};

const TEST_NOT_FOUND: &str = "Test not found";

pub struct TestCatalog<'a> {
    db: &'a Database,
}

impl<'a> TestCatalog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, input: &LabTestInput) -> BillingResult<LabTest> {
        let mut v = Violations::new();
        let name = v.check(validation::test_name(input.name.as_deref().unwrap_or_default()));
        let price = match input.price {
            Some(p) => v.check(validation::price(p)),
            None => v.require(None, "Price is required"),
        };
        v.into_result()?;

        let (Some(name), Some(price)) = (name, price) else {
            return Err(BillingError::Internal("Test fields missing after validation".into()));
        };
        let test = self.db.insert_lab_test(&NewLabTest { name, price })?;
        info!(test_id = test.id, name = %test.name, "Created lab test");
        Ok(test)
    }

    pub fn get(&self, id: LabTestId) -> BillingResult<LabTest> {
        self.db
            .get_lab_test(id)?
            .ok_or_else(|| BillingError::NotFound(TEST_NOT_FOUND.into()))
    }

    /// Whole catalog, ordered by name.
    pub fn list(&self) -> BillingResult<Vec<LabTest>> {
        Ok(self.db.list_lab_tests()?)
    }

    pub fn search(&self, name: &str) -> BillingResult<Vec<LabTest>> {
        Ok(self.db.search_lab_tests(name)?)
    }

    /// Partial update. Existing invoice lines keep the price they were
    /// charged.
    pub fn update(&self, id: LabTestId, input: &LabTestInput) -> BillingResult<LabTest> {
        let mut v = Violations::new();
        let changes = LabTestChanges {
            name: input.name.as_deref().and_then(|n| v.check(validation::test_name(n))),
            price: input.price.and_then(|p| v.check(validation::price(p))),
        };
        v.into_result()?;
        if changes.is_empty() {
            return self.get(id);
        }

        if !self.db.update_lab_test(id, &changes)? {
            return Err(BillingError::NotFound(TEST_NOT_FOUND.into()));
        }
        info!(test_id = id, "Updated lab test");
        self.get(id)
    }

    /// Delete a test that no invoice line references.
    pub fn delete(&self, id: LabTestId) -> BillingResult<()> {
        match self.db.delete_lab_test(id) {
            Ok(true) => {
                info!(test_id = id, "Deleted lab test");
                Ok(())
            }
            Ok(false) => Err(BillingError::NotFound(TEST_NOT_FOUND.into())),
            Err(e) if e.is_foreign_key_violation() => Err(BillingError::Conflict(
                "Test is billed on existing invoices and cannot be deleted".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
