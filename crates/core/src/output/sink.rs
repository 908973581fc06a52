use crate::program::FixtureColorFrame;

/// Receives one frame per tick. Delivery is fire-and-forget; a sink that
/// cannot deliver logs and carries on.
pub trait FixtureSink: Send {
    fn send(&mut self, frame: &FixtureColorFrame);
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NullSink;

impl FixtureSink for NullSink {
    fn send(&mut self, _frame: &FixtureColorFrame) {}
}

impl<F> FixtureSink for F
where
    F: FnMut(&FixtureColorFrame) + Send,
{
    fn send(&mut self, frame: &FixtureColorFrame) {
        self(frame)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    /// Keeps every frame it is sent.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub frames: Arc<Mutex<Vec<FixtureColorFrame>>>,
    }

    impl FixtureSink for RecordingSink {
        fn send(&mut self, frame: &FixtureColorFrame) {
            self.frames.lock().push(frame.clone());
        }
    }
}
