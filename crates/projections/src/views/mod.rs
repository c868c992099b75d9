//! Read model views.

mod user_view;

pub use user_view::UserViewProjector;
