//! Deferred font and image loads.
//!
//! Placing text may have to wait for its font, and dropping an image waits
//! for the host to fetch and decode it. Each such load gets a [`LoadTicket`]
//! stamped with the current interaction epoch. Switching tools or starting
//! a new map bumps the epoch, and a completion arriving with an older
//! ticket is dropped instead of mutating the map.

use crate::shapes::{Image, Text};
use kurbo::Point;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from deferred loads.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported image url: {0}")]
    UnsupportedImage(String),
    #[error("font unavailable: {0}")]
    FontUnavailable(String),
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("load ticket is stale")]
    Stale,
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Handle for an in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    id: u64,
    epoch: u64,
}

impl LoadTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// What a load will produce once it completes.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingLoad {
    /// A text node waiting for its font family.
    Text(Text),
    /// An image waiting for its bytes.
    Image { position: Point, url: String },
}

impl PendingLoad {
    /// The resource being waited on: a font family or an image url.
    pub fn resource(&self) -> &str {
        match self {
            PendingLoad::Text(text) => &text.font_family,
            PendingLoad::Image { url, .. } => url,
        }
    }
}

/// A fetched image, as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// Encoded bytes to embed. `None` keeps a reference to the url.
    pub bytes: Option<Vec<u8>>,
    /// Natural width in pixels.
    pub width: f64,
    /// Natural height in pixels.
    pub height: f64,
}

impl LoadedImage {
    /// Build the image node for a completed load.
    pub(crate) fn into_node(self, position: Point, url: String) -> LoadResult<Image> {
        let id = uuid::Uuid::new_v4();
        match self.bytes {
            Some(bytes) => Image::embedded(id, position, &bytes, self.width, self.height)
                .ok_or_else(|| LoadError::Decode(url)),
            None => Ok(Image::from_url(id, position, url, self.width, self.height)),
        }
    }
}

/// Tracks in-flight loads and the interaction epoch.
#[derive(Debug, Default)]
pub struct LoadTracker {
    epoch: u64,
    next_id: u64,
    pending: HashMap<u64, PendingLoad>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load in the current epoch.
    pub fn begin(&mut self, load: PendingLoad) -> LoadTicket {
        let ticket = LoadTicket {
            id: self.next_id,
            epoch: self.epoch,
        };
        self.next_id += 1;
        self.pending.insert(ticket.id, load);
        ticket
    }

    /// Start a new epoch. Every outstanding ticket becomes stale.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        for (id, load) in self.pending.drain() {
            log::debug!("Discarding load {} for {}", id, load.resource());
        }
    }

    /// Claim the load for a ticket. Fails for stale or already claimed tickets.
    pub fn take(&mut self, ticket: LoadTicket) -> LoadResult<PendingLoad> {
        if ticket.epoch != self.epoch {
            log::debug!("Dropping load {} from epoch {}", ticket.id, ticket.epoch);
            return Err(LoadError::Stale);
        }
        self.pending.remove(&ticket.id).ok_or_else(|| {
            log::debug!("Load {} already completed", ticket.id);
            LoadError::Stale
        })
    }

    /// Look at a pending load without claiming it.
    pub fn get(&self, ticket: LoadTicket) -> Option<&PendingLoad> {
        if ticket.epoch != self.epoch {
            return None;
        }
        self.pending.get(&ticket.id)
    }

    /// Number of loads in flight.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
