//! Community detection by label specificity.
//!
//! Every node carries a label. A node prefers the label its neighbors send
//! it *more often than the label's global prevalence predicts*, not simply
//! the most common one:
//!
//! ```text
//! specificity(v, l) = W_l(v) - k_in(v) × p(l)
//! ```
//!
//! Where:
//! - W_l(v) = weight node v receives from neighbors labeled l
//! - k_in(v) = total weight node v receives
//! - p(l) = share of all emitted weight that comes from label l
//!
//! **Intuition**: plain label propagation lets big labels swallow the graph
//! because they are heard everywhere. Subtracting the expected share makes
//! a large label win only where it is locally over-represented.
//!
//! ## Synchronous updates
//!
//! A [`Partition`] keeps two label vectors. Scores are always computed
//! against the committed `reference`; new labels go to `stage`; `commit`
//! publishes them all at once. Node order within a pass therefore cannot
//! change the outcome.
//!
//! ## Modes
//!
//! Plain rescoring gets stuck, so a run alternates between four operators
//! chosen by a [`Tracker`]:
//!
//! | mode | effect |
//! |------|--------|
//! | typical | rescore ~90% of nodes |
//! | bubble | split large communities into fresh labels |
//! | merge | join pairs of communities that are well connected |
//! | nurture | rescore the worst-fitting nodes |
//!
//! A merge that finds nothing to merge counts as an intervention. From the
//! `discard_transient`-th intervention on, each one stores a snapshot, and
//! the run stops once it has `target_partitions` of them.
//!
//! ## Bootstrap
//!
//! `independent_runs` runs execute in parallel from different seeds. The
//! stored snapshot with the highest total similarity (NMI by default) to
//! all other snapshots is the result.
//!
//! ## Usage
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use speakeasy2::community::{CommunityDetection, SpeakEasy2};
//!
//! // Two triangles joined by one edge
//! let mut graph = UnGraph::<(), ()>::new_undirected();
//! let n: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
//! for (a, b) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
//!     graph.add_edge(n[a], n[b], ());
//! }
//!
//! let communities = SpeakEasy2::new().with_seed(7).detect(&graph).unwrap();
//! assert_eq!(communities.len(), 6);
//! ```
//!
//! ## References
//!
//! - Gaiteri et al. (2015). "Identifying robust communities and multi-community
//!   nodes by combining top-down and bottom-up approaches to clustering."
//!   Scientific Reports 5, 16361.
//! - Raghavan, Albert, Kumara (2007). "Near linear time algorithm to detect
//!   community structures in large-scale networks."

mod traits;

pub mod consensus;
pub mod iter;
pub mod label;
pub mod modes;
pub mod network;
pub mod operators;
pub mod options;
pub mod partition;
pub mod rng;
pub mod run;
mod speakeasy;

pub use iter::IdIter;
pub use label::LabelScorer;
pub use modes::{Mode, ModeSchedule, Tracker, Transition};
pub use network::Network;
pub use operators::{Refinement, SpeakEasyOperators};
pub use options::{Options, Settings};
pub use partition::Partition;
pub use rng::RunRng;
pub use run::{run_independent, RunSummary};
pub use speakeasy::{SpeakEasy2, SpeakEasyOutput};
pub use traits::CommunityDetection;
