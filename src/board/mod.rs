//! The client-side ordering engine: state, drag lifecycle, reconciliation
//! and the session that wires them together.

pub mod drag;
pub mod session;
pub mod state;
pub mod sync;
pub mod view;

pub use drag::{DragController, DragEvent, DragPhase, DragSession, MoveRequest};
pub use session::{BoardSession, Notice, NoticeLevel, SessionConfig, SessionHandle};
pub use state::{BoardState, DropTarget, PositionUpdate};
pub use sync::{merge_snapshot, FetchTicket, MergeOutcome, SyncReconciler};
pub use view::{BoardView, ListView};
