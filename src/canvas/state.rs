/// Phase of the redraw cycle. `paint` falls through the phases in order and
/// stops early only when a blit is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintState {
    #[default]
    Refresh,
    ApplyOperations,
    EraseSprites,
    DrawSprites,
}

/// Result of one `paint` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintProgress {
    /// The cycle finished; the next call starts a new one.
    Complete,
    /// A blit did not finish. Calling `paint` again resumes at this phase.
    Suspended(PaintState),
}

impl PaintProgress {
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

pub fn can_transition(from: PaintState, to: PaintState) -> bool {
    matches!(
        (from, to),
        (PaintState::Refresh, PaintState::ApplyOperations)
            | (PaintState::ApplyOperations, PaintState::EraseSprites)
            | (PaintState::EraseSprites, PaintState::DrawSprites)
            | (PaintState::DrawSprites, PaintState::Refresh)
    ) || to == PaintState::Refresh
}
