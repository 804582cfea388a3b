//! Radial bubble-diagram layout engine for time-weighted operation trees.
//!
//! The input is a tree of operation groups, each carrying an
//! asynchronous-pending duration ("between", drawn as a line) and a
//! synchronous-execution duration ("within", drawn as a circle whose
//! circumference encodes it). The output is concrete 2D positions and sizes
//! for every node, ready for a renderer to draw.
//!
//! The pipeline, in leaf-first dependency order: [`geom::LineCoordinates`]
//! (2D vector/angle value type), [`stem::Stem`] (per-node accumulated length
//! accounting), [`scale::Scale`] (global pixels-per-duration search),
//! [`positioning::Positioning`] (deterministic leaf ordering),
//! [`allocation`] (proportional space and final coordinates),
//! [`collapse`] (optional merging of insignificant nodes), all orchestrated
//! by [`layout::Layout`].

#![forbid(unsafe_code)]

pub mod allocation;
pub mod collapse;
pub mod error;
pub mod geom;
pub mod layout;
pub mod node;
pub mod positioning;
pub mod scale;
pub mod settings;
pub mod stem;

pub use error::{Error, Result};
pub use geom::LineCoordinates;
pub use layout::{Layout, ShortcutOrigin};
pub use node::{Connection, DataNode, LayoutNode, NodeKind, Position, ProfileNode};
pub use positioning::Positioning;
pub use scale::{Scale, ScaleWeight, WeightCategory};
pub use settings::{LayoutSettings, MidpointPlacement};
pub use stem::Stem;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
