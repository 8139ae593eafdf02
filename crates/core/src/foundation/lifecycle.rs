use std::fmt;

/// Application lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Foundational providers are booted; configured providers are not
    Created,
    Booting,
    Booted,
    Failed,
}

impl LifecycleState {
    pub fn is_booted(&self) -> bool {
        matches!(self, LifecycleState::Booted)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Booting => "booting",
            LifecycleState::Booted => "booted",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}
