use crate::core::models::residue::ResidueType;
use crate::core::models::selector::LabelSelector;
use nalgebra::Matrix4;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One occurrence of the motif in a candidate structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub structure_id: String,
    /// Matched residues in motif order, each with the operator it was found under.
    pub residues: Vec<LabelSelector>,
    pub residue_types: Vec<ResidueType>,
    pub rmsd: f64,
    /// Rigid transformation superposing the matched residues onto the query motif.
    pub transformation: Matrix4<f64>,
}

/// Receives hits as they are found. Returning [`ControlFlow::Break`] ends the search.
pub trait HitSink {
    fn accept(&mut self, hit: Hit) -> ControlFlow<()>;
}

impl HitSink for Vec<Hit> {
    fn accept(&mut self, hit: Hit) -> ControlFlow<()> {
        self.push(hit);
        ControlFlow::Continue(())
    }
}

/// Adapts a closure into a [`HitSink`].
pub struct FnSink<F>(pub F);

impl<F> HitSink for FnSink<F>
where
    F: FnMut(Hit) -> ControlFlow<()>,
{
    fn accept(&mut self, hit: Hit) -> ControlFlow<()> {
        (self.0)(hit)
    }
}

/// Shared cancellation flag, checked between assembly generations and between structures.
#[derive(Debug, Clone, Default)]
pub struct StopCondition(Arc<AtomicBool>);

impl StopCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(rmsd: f64) -> Hit {
        Hit {
            structure_id: "1abc".to_string(),
            residues: vec![LabelSelector::new("A", 1)],
            residue_types: vec![ResidueType::Serine],
            rmsd,
            transformation: Matrix4::identity(),
        }
    }

    #[test]
    fn vec_sink_collects_everything() {
        let mut sink = Vec::new();
        assert_eq!(sink.accept(hit(0.1)), ControlFlow::Continue(()));
        assert_eq!(sink.accept(hit(0.2)), ControlFlow::Continue(()));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn closure_sink_can_break() {
        let mut seen = 0;
        let mut sink = FnSink(|_hit: Hit| {
            seen += 1;
            if seen == 2 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert_eq!(sink.accept(hit(0.1)), ControlFlow::Continue(()));
        assert_eq!(sink.accept(hit(0.1)), ControlFlow::Break(()));
    }

    #[test]
    fn stop_condition_is_shared_between_clones() {
        let stop = StopCondition::new();
        let other = stop.clone();
        assert!(!other.is_stopped());
        stop.stop();
        assert!(other.is_stopped());
    }
}
