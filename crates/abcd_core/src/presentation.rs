/// The presentation layer as seen from the task: camera framing, overview
/// aid and avatar visibility all live behind this trait. Implementations
/// react to phase changes; they never drive task state.
pub trait PresentationAdapter: Send {
    /// Whether this presentation shows a memorization replay before free
    /// play when a new reward layout starts.
    fn plays_memorization_replay(&self) -> bool;

    /// First directional input of a repetition: hide the overview aid.
    fn suppress_overview(&mut self);

    /// A memorization replay for `config_index` is starting.
    fn run_memorization_replay(&mut self, config_index: usize);

    /// Free navigation for `config_index` is starting (or resuming).
    fn begin_free_play(&mut self, config_index: usize);

    fn session_end(&mut self);
}

impl<T: PresentationAdapter + ?Sized> PresentationAdapter for Box<T> {
    fn plays_memorization_replay(&self) -> bool {
        (**self).plays_memorization_replay()
    }

    fn suppress_overview(&mut self) {
        (**self).suppress_overview()
    }

    fn run_memorization_replay(&mut self, config_index: usize) {
        (**self).run_memorization_replay(config_index)
    }

    fn begin_free_play(&mut self, config_index: usize) {
        (**self).begin_free_play(config_index)
    }

    fn session_end(&mut self) {
        (**self).session_end()
    }
}
