pub mod store;
pub use store::{LedgerStore, LedgerTx};
pub mod pg_store;
pub use pg_store::PgLedgerStore;
pub mod mem_store;
pub use mem_store::MemLedgerStore;
