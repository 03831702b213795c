//! Companion panel kept in step with the active row's identifying value.
//!
//! Every sync issues a `LookupToken`; only the answer to the newest token is
//! applied, so a slow lookup for a previously selected row cannot overwrite
//! the current one. Lookups never fail a selection: errors degrade to the
//! placeholder with the upload affordance.

use crate::error::LookupFailure;
use crate::store::{PhotoLookup, PhotoResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelImage {
    Placeholder,
    Photo(String),
}

/// Which photo action is offered next to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Hidden,
    Upload,
    Remove,
}

/// One outstanding photo lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupToken {
    generation: u64,
    identifier: String,
}

impl LookupToken {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug)]
pub struct CompanionPanel {
    placeholder: String,
    identifier: Option<String>,
    image: PanelImage,
    affordance: Affordance,
    generation: u64,
    pending: Option<LookupToken>,
}

impl CompanionPanel {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            identifier: None,
            image: PanelImage::Placeholder,
            affordance: Affordance::Hidden,
            generation: 0,
            pending: None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn image(&self) -> &PanelImage {
        &self.image
    }

    pub fn affordance(&self) -> Affordance {
        self.affordance
    }

    pub fn pending(&self) -> Option<&LookupToken> {
        self.pending.as_ref()
    }

    pub fn take_pending(&mut self) -> Option<LookupToken> {
        self.pending.take()
    }

    /// Follow a new identifying value. Blank resets the panel.
    pub fn sync(&mut self, identifier: &str) -> Option<LookupToken> {
        self.generation += 1;
        self.image = PanelImage::Placeholder;
        self.affordance = Affordance::Hidden;

        let identifier = identifier.trim();
        if identifier.is_empty() {
            self.identifier = None;
            self.pending = None;
            return None;
        }

        self.identifier = Some(identifier.to_string());
        let token = LookupToken {
            generation: self.generation,
            identifier: identifier.to_string(),
        };
        self.pending = Some(token.clone());
        Some(token)
    }

    /// Look up the current identifier again (after an upload).
    pub fn refresh(&mut self) -> Option<LookupToken> {
        let identifier = self.identifier.clone()?;
        self.sync(&identifier)
    }

    /// Apply a lookup answer. Returns false if the token is stale.
    pub fn apply(&mut self, token: &LookupToken, result: Result<PhotoLookup, LookupFailure>) -> bool {
        if token.generation != self.generation {
            log::debug!("dropping stale photo lookup for {}", token.identifier);
            return false;
        }
        if self.pending.as_ref() == Some(token) {
            self.pending = None;
        }

        match result {
            Ok(PhotoLookup::Found { location }) => {
                self.image = PanelImage::Photo(location);
                self.affordance = Affordance::Remove;
            }
            Ok(PhotoLookup::Missing) => {
                self.image = PanelImage::Placeholder;
                self.affordance = Affordance::Upload;
            }
            Err(e) => {
                log::warn!("{} (identifier {})", e, token.identifier);
                self.image = PanelImage::Placeholder;
                self.affordance = Affordance::Upload;
            }
        }
        true
    }

    /// The photo for `identifier` was deleted on the backend.
    pub fn photo_removed(&mut self, identifier: &str) {
        if self.identifier.as_deref() != Some(identifier.trim()) {
            return;
        }
        self.generation += 1;
        self.pending = None;
        self.image = PanelImage::Placeholder;
        self.affordance = Affordance::Upload;
    }

    /// Run the outstanding lookup, if any, against `resolver`.
    pub fn resolve_pending(&mut self, resolver: &dyn PhotoResolver) {
        if let Some(token) = self.take_pending() {
            let result = resolver.resolve(token.identifier());
            self.apply(&token, result);
        }
    }

    /// Image source to display. Photos get a `?t=` cache-buster.
    pub fn image_src(&self, stamp: u128) -> String {
        match &self.image {
            PanelImage::Placeholder => self.placeholder.clone(),
            PanelImage::Photo(location) => format!("{}?t={}", location, stamp),
        }
    }
}
