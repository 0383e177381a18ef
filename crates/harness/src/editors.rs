use std::sync::Barrier;
use std::thread;

use pagestore_core::PageData;
use pagestore_engine::{EngineError, SaveOutcome};

use crate::TestSite;

/// A group of editors, each holding its own connection, that save at the
/// same moment.
pub struct EditorPool<'a> {
    site: &'a TestSite,
    editors: usize,
}

impl<'a> EditorPool<'a> {
    pub fn new(site: &'a TestSite, editors: usize) -> Self {
        Self { site, editors }
    }

    /// Every editor saves `data_for(i)` to `path` once, released together by a
    /// barrier. Returns the outcomes in editor order.
    pub fn save_all<F>(&self, path: &str, data_for: F) -> Result<Vec<SaveOutcome>, EngineError>
    where
        F: Fn(usize) -> PageData + Sync,
    {
        let mut stores = Vec::with_capacity(self.editors);
        for _ in 0..self.editors {
            stores.push(self.site.connect()?);
        }
        let barrier = Barrier::new(self.editors);

        thread::scope(|scope| {
            let handles: Vec<_> = stores
                .into_iter()
                .enumerate()
                .map(|(i, mut store)| {
                    let barrier = &barrier;
                    let data_for = &data_for;
                    scope.spawn(move || {
                        let data = data_for(i);
                        barrier.wait();
                        store.save_page_detailed(path, &data)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}
