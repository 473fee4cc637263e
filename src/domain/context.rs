//! Evaluation context carried through a tree build.

/// Settings that shape which entries a build can see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalContext {
    /// Preferred target desktop (`OnlyShowIn`/`NotShowIn` filtering); `None` shows everything
    pub preferred_desktop: Option<String>,
}

impl EvalContext {
    pub fn new(preferred_desktop: Option<String>) -> Self {
        Self { preferred_desktop }
    }

    pub fn for_desktop(desktop: &str) -> Self {
        Self::new(Some(desktop.to_string()))
    }

    /// Snapshot of the process-wide preference set through
    /// [`crate::config::set_preferred_desktop`].
    pub fn from_process() -> Self {
        Self::new(crate::config::preferred_desktop())
    }
}
