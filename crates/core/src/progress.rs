/// Position within a session, shaped for a progress bar and a "3 / 10" label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current_one_based: usize,
    pub total: usize,
    /// Share of questions already behind the current one, rounded half up.
    pub percent: u8,
}

impl Progress {
    /// Progress for a session positioned at `current_index` of `total` questions.
    #[must_use]
    pub fn new(current_index: usize, total: usize) -> Self {
        if total == 0 {
            return Self {
                current_one_based: 0,
                total: 0,
                percent: 0,
            };
        }
        let done = current_index.min(total);
        let percent = (done * 200 + total) / (total * 2);
        Self {
            current_one_based: (done + 1).min(total),
            total,
            percent: u8::try_from(percent).unwrap_or(100),
        }
    }
}
