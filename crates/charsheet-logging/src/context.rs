//! Viewer context injection
//!
//! Thread-local storage for the viewer's role and the panel instance, so
//! spans opened while a [`ViewerContextGuard`] is alive can be tagged with
//! who was looking at the panel.

use std::cell::RefCell;

use charsheet_core::Role;
use uuid::Uuid;

/// Viewer context data stored in thread-local storage
#[derive(Debug, Clone)]
pub struct ViewerContextData {
    /// Role of the viewer
    pub role: Role,
    /// Unique id of this panel mount
    pub panel_instance: Uuid,
}

impl ViewerContextData {
    /// Span carrying the viewer fields, for instrumenting a panel session
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("viewer", role = %self.role, panel = %self.panel_instance)
    }
}

thread_local! {
    static VIEWER_CONTEXT: RefCell<Option<ViewerContextData>> = const { RefCell::new(None) };
}

/// RAII guard for viewer context
///
/// Sets the viewer context for the current thread and restores the
/// previous one when dropped.
///
/// # Example
///
/// ```ignore
/// use charsheet_core::Role;
/// use charsheet_logging::context::ViewerContextGuard;
///
/// let _guard = ViewerContextGuard::new(Role::Gm);
/// tracing::info!("Panel mounted");
/// ```
pub struct ViewerContextGuard {
    previous: Option<ViewerContextData>,
}

impl ViewerContextGuard {
    /// Set the viewer context with a fresh panel instance id
    pub fn new(role: Role) -> Self {
        Self::with_instance(role, Uuid::new_v4())
    }

    /// Set the viewer context with a known panel instance id
    pub fn with_instance(role: Role, panel_instance: Uuid) -> Self {
        let previous = VIEWER_CONTEXT.with(|ctx| ctx.borrow().clone());
        VIEWER_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = Some(ViewerContextData {
                role,
                panel_instance,
            })
        });
        Self { previous }
    }

    /// Current viewer context (if any)
    pub fn current() -> Option<ViewerContextData> {
        VIEWER_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_role() -> Option<Role> {
        Self::current().map(|ctx| ctx.role)
    }
}

impl Drop for ViewerContextGuard {
    fn drop(&mut self) {
        VIEWER_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}
