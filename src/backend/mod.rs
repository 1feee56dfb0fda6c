pub mod memory;
pub mod supabase;
pub mod traits;
pub mod types;

pub use memory::MemoryBackend;
pub use supabase::SupabaseClient;
pub use traits::{AuthService, Datastore, ObjectStorage};
pub use types::{AuthSession, ListingQuery, ListingScope};
