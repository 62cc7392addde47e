//! Request/response models for the diagnostic endpoints

pub mod responses;

pub use responses::{
    LoggedOutView, Outcome, RedirectInstruction, RenderInstruction, SourceListView, WhoamiView,
    VIEW_LOGGED_OUT, VIEW_SOURCE_LIST, VIEW_STATUS,
};
