//! Row lifecycle for grids of personnel records edited in place.
//!
//! Several grids share one set of global controls (Add, Edit, Save, Cancel)
//! and one active row. This crate owns the state machine, the payload
//! contract, and the companion photo panel. No I/O: the backend is reached
//! through the [`RecordStore`] and [`PhotoResolver`] seams.

pub mod controls;
pub mod error;
pub mod ficha;
pub mod grid;
pub mod lifecycle;
pub mod notice;
pub mod page;
pub mod panel;
pub mod payload;
pub mod row;
pub mod selection;
pub mod store;

pub use controls::{Activation, Control, ControlBinder, ControlHandle, ControlSurface, Enablement};
pub use error::{DescriptorError, LifecycleError, LookupFailure, PersistenceError, ValidationError};
pub use ficha::{normalize_key, Ficha, NormalizedRecord};
pub use grid::{GridDescriptor, GridId, GridRegistry};
pub use lifecycle::{EditKind, EditSession, GridContext, RowLifecycle, RowState, SaveRequest, SaveTicket};
pub use notice::{Notice, NoticeLevel, Notices, NOTICE_TTL};
pub use page::{GridTable, Page};
pub use panel::{Affordance, CompanionPanel, LookupToken, PanelImage};
pub use payload::{Payload, IS_NEW_KEY};
pub use row::{Row, RowId};
pub use selection::{ActiveRow, SelectionChange, SelectionTracker};
pub use store::{PhotoLookup, PhotoResolver, RecordStore, SaveReceipt};
