use crate::avfilter_graph::AVFilterGraph;
use crate::native::Native;
use crate::util::error_handler::AVError;
use anyhow::Result;
use log::debug;

impl<N: Native> AVFilterGraph<N> {
    pub fn new() -> Result<Self> {
        let mut graph = AVFilterGraph {
            inner: std::ptr::null_mut(),
        };
        graph.allocate()?;

        Ok(graph)
    }

    /// Replaces the held graph with a fresh empty one.
    ///
    /// The old graph is freed first. If the new allocation fails the wrapper
    /// stays empty until the next successful `reset`.
    pub fn reset(&mut self) -> Result<()> {
        unsafe {
            N::avfilter_graph_free(&mut self.inner);
        }
        self.allocate()?;

        debug!("Filter graph reset to {:p}", self.inner);
        Ok(())
    }

    pub fn is_allocated(&self) -> bool {
        !self.inner.is_null()
    }

    fn allocate(&mut self) -> Result<()> {
        let inner = unsafe { N::avfilter_graph_alloc() };

        if inner.is_null() {
            return Err(AVError::Allocation("AVFilterGraph").into());
        }

        self.inner = inner;
        Ok(())
    }
}

#[test]
fn test_reset_pairs_every_allocation() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let mut graph = AVFilterGraph::<Fake>::new().unwrap();
    let mut serials = vec![fake::filter_graph_serial(graph.inner)];

    const RESETS: usize = 5;
    for _ in 0..RESETS {
        graph.reset().unwrap();
        serials.push(fake::filter_graph_serial(graph.inner));
    }

    // One allocation from `new`, one per reset; every replaced graph is freed.
    assert_eq!(fake::allocations(Kind::FilterGraph), RESETS + 1);
    assert_eq!(fake::frees(Kind::FilterGraph), RESETS);

    let last = *serials.last().unwrap();
    assert_eq!(serials.iter().filter(|x| **x == last).count(), 1);

    drop(graph);
    fake::assert_no_leaks();
}

#[test]
fn test_failed_reset_leaves_graph_empty() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let mut graph = AVFilterGraph::<Fake>::new().unwrap();
    fake::fail_next_allocation(Kind::FilterGraph);

    let error = graph.reset().unwrap_err();
    assert_eq!(error.to_string(), "Failed to allocate AVFilterGraph.");
    assert!(!graph.is_allocated());
    assert_eq!(fake::live(Kind::FilterGraph), 0);

    graph.reset().unwrap();
    assert!(graph.is_allocated());

    drop(graph);
    fake::assert_no_leaks();
}

#[test]
fn test_empty_graph_drops_cleanly() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let mut graph = AVFilterGraph::<Fake>::new().unwrap();
    fake::fail_next_allocation(Kind::FilterGraph);
    assert!(graph.reset().is_err());

    drop(graph);
    assert_eq!(fake::allocations(Kind::FilterGraph), 1);
    assert_eq!(fake::frees(Kind::FilterGraph), 1);
}

#[test]
fn test_new_reports_allocation_failure() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();
    fake::fail_next_allocation(Kind::FilterGraph);

    assert!(AVFilterGraph::<Fake>::new().is_err());
    fake::assert_no_leaks();
}
