//! Screen-facing controllers.
//!
//! Controllers own observable state (`get()` / `subscribe()`) and expose
//! explicit focus events instead of relying on a UI framework lifecycle.
//! Every operation returns its outcome and also records it in state as a
//! notice for the rendering layer.

pub mod form;
pub mod list;

pub use form::{FormMode, FormNotice, FormPhase, FormState, ReportFormController, Submission};
pub use list::{ListNotice, ListState, Refresh, ReportListController};
