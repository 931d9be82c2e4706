//! Where a visitor may go: landing paths, the admission guard for protected
//! views, and the application route table.

pub mod guard;
pub mod landing;
pub mod table;

pub use guard::{
    check_admission, Admission, DenyReason, Evaluation, LocalOnly, Navigator, ProtectedRoute,
    ProtectedView, Revalidation, Revalidator, RouteGuard, ViewOutcome,
};
pub use landing::{paths, resolve_landing_path};
pub use table::{entry_decision, find_route, Access, EntryDecision, Route, ROUTES};
