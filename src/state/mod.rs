//! Exception-state persistence for the diagnostic login flow

pub mod store;
pub mod types;

pub use store::{ExceptionStateStore, InMemoryStateStore};
pub use types::{
    StateEntry, StateStoreError, StoredFailure, CODE_LOGIN_FAILED, DEFAULT_STATE_TTL_SECONDS,
    PARAM_ERROR_STATE, PARAM_LOGOUT,
};
