pub mod guard;
pub mod memory;
pub mod query;
pub mod schema;
pub mod state;
pub mod store;
pub mod supabase;

pub use guard::{ensure_deletable, guarded_delete};
pub use memory::MemoryStore;
pub use query::{Condition, Filter, FilterOp, OrderBy, RecordQuery};
pub use schema::{OnDelete, Table};
pub use state::AppState;
pub use store::{ClinicStore, DynStore, Selection, StoreError};
pub use supabase::SupabaseStore;
