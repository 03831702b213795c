//! The four global controls (Add, Edit, Save, Cancel) and their binding.
//!
//! Binding is tracked per control handle: binding the same handle again is
//! a no-op, so one activation always runs its action exactly once no matter
//! how many times page initialization ran.

use std::collections::HashMap;

use crate::error::LifecycleError;
use crate::lifecycle::{RowLifecycle, RowState};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Add,
    Edit,
    Save,
    Cancel,
}

impl Control {
    pub const ALL: [Control; 4] = [Control::Add, Control::Edit, Control::Save, Control::Cancel];

    pub fn label(self) -> &'static str {
        match self {
            Control::Add => "add",
            Control::Edit => "edit",
            Control::Save => "save",
            Control::Cancel => "cancel",
        }
    }
}

/// Identity of one concrete control element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlHandle(pub u64);

/// Which of the four controls accept activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enablement {
    pub add: bool,
    pub edit: bool,
    pub save: bool,
    pub cancel: bool,
}

impl Enablement {
    pub fn for_state(state: RowState) -> Self {
        match state {
            RowState::Idle => Self { add: true, edit: false, save: false, cancel: false },
            RowState::Selected => Self { add: true, edit: true, save: false, cancel: true },
            RowState::EditingNew | RowState::EditingExisting => {
                Self { add: false, edit: false, save: true, cancel: true }
            }
            // Save is disabled the moment it is dispatched; Cancel waits too
            RowState::Saving => Self { add: false, edit: false, save: false, cancel: false },
        }
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        match control {
            Control::Add => self.add,
            Control::Edit => self.edit,
            Control::Save => self.save,
            Control::Cancel => self.cancel,
        }
    }
}

/// Result of activating a control handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Nothing is bound to the handle.
    Unbound,
    /// The control is disabled in the current state.
    Disabled(Control),
    /// The bound action ran once.
    Dispatched {
        control: Control,
        outcome: Result<RowState, LifecycleError>,
    },
}

/// Handles present on a page. Any control may be missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlSurface {
    pub add: Option<ControlHandle>,
    pub edit: Option<ControlHandle>,
    pub save: Option<ControlHandle>,
    pub cancel: Option<ControlHandle>,
}

impl ControlSurface {
    fn entries(&self) -> [(Option<ControlHandle>, Control); 4] {
        [
            (self.add, Control::Add),
            (self.edit, Control::Edit),
            (self.save, Control::Save),
            (self.cancel, Control::Cancel),
        ]
    }
}

#[derive(Debug, Default)]
pub struct ControlBinder {
    bound: HashMap<ControlHandle, Control>,
}

impl ControlBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to `control`. Returns false if the handle was
    /// already bound (the existing binding is kept).
    pub fn bind(&mut self, handle: ControlHandle, control: Control) -> bool {
        if self.bound.contains_key(&handle) {
            log::debug!("control {:?} already bound; skipping", handle);
            return false;
        }
        self.bound.insert(handle, control);
        true
    }

    /// Bind every control present on the surface. Returns how many new
    /// bindings were made.
    pub fn bind_surface(&mut self, surface: &ControlSurface) -> usize {
        surface
            .entries()
            .into_iter()
            .filter_map(|(handle, control)| handle.map(|h| (h, control)))
            .filter(|&(handle, control)| self.bind(handle, control))
            .count()
    }

    pub fn is_bound(&self, handle: ControlHandle) -> bool {
        self.bound.contains_key(&handle)
    }

    pub fn control_for(&self, handle: ControlHandle) -> Option<Control> {
        self.bound.get(&handle).copied()
    }

    /// Whether the control behind `handle` is currently enabled.
    pub fn is_enabled(&self, handle: ControlHandle, lifecycle: &RowLifecycle) -> bool {
        self.control_for(handle)
            .is_some_and(|control| Enablement::for_state(lifecycle.state()).is_enabled(control))
    }

    /// One user activation of `handle`.
    pub fn activate(
        &self,
        handle: ControlHandle,
        lifecycle: &mut RowLifecycle,
        store: &dyn RecordStore,
    ) -> Activation {
        let Some(control) = self.control_for(handle) else {
            return Activation::Unbound;
        };
        if !Enablement::for_state(lifecycle.state()).is_enabled(control) {
            return Activation::Disabled(control);
        }

        let outcome = dispatch(control, lifecycle, store);
        Activation::Dispatched { control, outcome }
    }
}

fn dispatch(
    control: Control,
    lifecycle: &mut RowLifecycle,
    store: &dyn RecordStore,
) -> Result<RowState, LifecycleError> {
    log::debug!("control {} activated", control.label());
    match control {
        Control::Add => lifecycle.add(),
        Control::Edit => lifecycle.edit(),
        Control::Save => lifecycle.save(store),
        Control::Cancel => lifecycle.cancel(),
    }
}
