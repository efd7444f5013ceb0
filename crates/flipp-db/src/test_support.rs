//! Shared test utilities for flipp-db unit tests.

use crate::FlippDb;
use crate::service::CatalogService;

/// Create an in-memory `CatalogService`.
pub async fn test_service() -> CatalogService {
    let db = FlippDb::open_local(":memory:").await.unwrap();
    CatalogService::from_db(db)
}
