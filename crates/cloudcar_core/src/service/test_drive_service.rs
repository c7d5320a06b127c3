//! Test-drive booking service.

use crate::model::test_drive::{NewTestDrive, TestDrive, TestDriveWithCustomer};
use crate::repo::test_drive_repo::TestDriveRepository;
use crate::repo::RepoResult;
use crate::service::log_write;

pub struct TestDriveService<R: TestDriveRepository> {
    repo: R,
}

impl<R: TestDriveRepository> TestDriveService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists bookings with the owning customer inlined.
    pub fn list_test_drives(&self) -> RepoResult<Vec<TestDriveWithCustomer>> {
        self.repo.list_test_drives()
    }

    pub fn book_test_drive(&self, input: &NewTestDrive) -> RepoResult<TestDrive> {
        log_write(
            "test_drive_create",
            self.repo.create_test_drive(input),
            |booking| {
                format!(
                    "test_drive_id={} customer_id={}",
                    booking.id, booking.customer_id
                )
            },
        )
    }
}
