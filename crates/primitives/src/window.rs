/// Inclusive block range scanned by one listener iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    /// First block
    pub from: u64,
    /// Last block (inclusive)
    pub to: u64,
}

impl BlockWindow {
    /// Select the next window from the stored checkpoint, the chain head and the backtrack size.
    ///
    /// Near the head the window trails the head by `backtrack` blocks. Further behind it
    /// advances from the checkpoint by at most `backtrack` blocks, so a single scan never
    /// covers more than `backtrack + 1` blocks however far the listener lags.
    pub const fn compute(checkpoint: u64, head: u64, backtrack: u64) -> Self {
        let reach = checkpoint.saturating_add(backtrack);
        if reach >= head {
            Self { from: head.saturating_sub(backtrack), to: head }
        } else {
            Self { from: checkpoint, to: reach }
        }
    }

    /// Number of blocks in the window.
    pub const fn block_count(&self) -> u64 {
        self.to - self.from + 1
    }
}

#[cfg(test)]
mod tests {
    use super::BlockWindow;

    #[test]
    fn far_behind_head_advances_from_checkpoint() {
        assert_eq!(BlockWindow::compute(100, 1000, 600), BlockWindow { from: 100, to: 700 });
    }

    #[test]
    fn near_head_trails_the_head() {
        assert_eq!(BlockWindow::compute(500, 1000, 600), BlockWindow { from: 400, to: 1000 });
    }

    #[test]
    fn young_chain_starts_at_zero() {
        assert_eq!(BlockWindow::compute(0, 200, 600), BlockWindow { from: 0, to: 200 });
    }

    #[test]
    fn window_never_exceeds_backtrack() {
        for (checkpoint, head) in [(0, 10_000), (9_000, 10_000), (9_999, 10_000), (20_000, 10_000)]
        {
            let window = BlockWindow::compute(checkpoint, head, 600);
            assert!(window.block_count() <= 601);
            assert!(window.to <= head);
        }
    }
}
