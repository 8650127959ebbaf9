//! Interactive node-link graph view.
//!
//! [`GraphView`] owns the graph, its layout and the camera. [`GraphCanvas`]
//! draws it and routes pointer input to it; the panels in [`panels`] render
//! the selection, the tooltip and summary statistics.

mod component;
pub mod config;
pub mod layout;
pub mod model;
pub mod panels;
mod render;
mod simulation;
pub mod state;
pub mod stats;
mod transform;
pub mod types;
mod view;

pub use component::{GraphCanvas, NODE_SELECTED_EVENT};
pub use config::ViewConfig;
pub use layout::LayoutKind;
pub use panels::{EdgeListPanel, GraphSummary, NodeDetailsPanel, NodeTooltip};
pub use types::{GraphDocument, LoadError};
pub use view::GraphView;
