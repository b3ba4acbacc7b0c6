//! Persistence Layer
//!
//! Everything that talks to storage: the local cache, the remote coin store,
//! and the synchronizer choosing between them. This layer is the only one
//! allowed to suspend on I/O; failures here never reach the game logic.

pub mod identity;
pub mod protocol;
pub mod local;
pub mod remote;
pub mod sync;

pub use identity::{Identity, HostId, HostUser, IdentityError, header_label};
pub use protocol::{CreateOrFetchUserRequest, UpdateCoinsRequest, CoinsResponse};
pub use local::{LocalStore, MemoryStore, FileStore, StoreError, load_saved_state, save_state};
pub use remote::{RemoteStore, HttpRemoteStore, RemoteError};
pub use sync::{StateSynchronizer, PersistenceMode, SyncState, PendingPull, UnknownModeError, clamp_pulled};
