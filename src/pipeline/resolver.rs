// Dynamic pad resolution
//
// uridecodebin exposes one pad per decoded stream once it has parsed the
// container. Pads arrive on streaming threads, in no particular order and
// possibly concurrently for different sources. The routing decision is a
// pure function of (source identity, negotiated media type); the table is
// built once at assembly and never mutated afterwards.
//
// A stream that cannot be linked is logged and dropped. The rest of the
// session keeps running.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use gstreamer as gst;
use gstreamer::prelude::*;
use parking_lot::Mutex;

use super::assembler::Assembly;

/// Kind of a decoded stream, from its caps name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Audio,
    Video,
}

impl StreamKind {
    /// `None` for anything that is neither audio nor video (subtitles, data)
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        if media_type.starts_with("audio/") {
            Some(StreamKind::Audio)
        } else if media_type.starts_with("video/") {
            Some(StreamKind::Video)
        } else {
            None
        }
    }
}

/// Consumer a stream is linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Shared audio conditioning chain (authoritative source only)
    AudioChain,
    /// Null consumer of source `i`
    DiscardAudio(usize),
    /// Scaler of source `i`
    Scaler(usize),
}

/// Error type for runtime link failures. None of these are fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("pad from unknown source '{0}'")]
    UnknownSource(String),

    #[error("pad {0} has no caps")]
    NoCaps(String),

    #[error("no consumer pad for {0:?}")]
    NoConsumer(Route),

    #[error("{0} is already linked")]
    AlreadyLinked(String),

    #[error("linking {from} -> {to} failed: {reason}")]
    LinkRefused {
        from: String,
        to: String,
        reason: String,
    },
}

/// A pad arrived from an element that is not one of the configured sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownSource;

/// Source identity to source index, plus which source owns the audio
#[derive(Debug, Clone)]
pub struct RoutingTable<K> {
    slots: HashMap<K, usize>,
    audio_source: usize,
}

impl<K: Hash + Eq> RoutingTable<K> {
    /// `sources` in index order
    pub fn new(sources: impl IntoIterator<Item = K>, audio_source: usize) -> Self {
        Self {
            slots: sources
                .into_iter()
                .enumerate()
                .map(|(index, key)| (key, index))
                .collect(),
            audio_source,
        }
    }

    pub fn source_index(&self, source: &K) -> Option<usize> {
        self.slots.get(source).copied()
    }

    /// Route for a stream of `media_type` produced by `source`.
    ///
    /// `Ok(None)` means the stream is deliberately ignored.
    pub fn resolve(&self, source: &K, media_type: &str) -> Result<Option<Route>, UnknownSource> {
        let index = self.source_index(source).ok_or(UnknownSource)?;

        Ok(StreamKind::from_media_type(media_type).map(|kind| match kind {
            StreamKind::Audio if index == self.audio_source => Route::AudioChain,
            StreamKind::Audio => Route::DiscardAudio(index),
            StreamKind::Video => Route::Scaler(index),
        }))
    }
}

/// What happened to one discovered stream
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Linked(Route),
    Ignored,
    Failed(ResolveError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRecord {
    pub source: String,
    pub pad: String,
    pub media_type: String,
    pub outcome: Outcome,
}

/// Links decoder pads to their consumers
pub struct PadResolver {
    table: RoutingTable<gst::Element>,
    consumers: HashMap<Route, gst::Pad>,
    report: Mutex<Vec<ResolutionRecord>>,
}

fn sink_pad_of(element: &gst::Element) -> Option<gst::Pad> {
    let pad = element.static_pad("sink");
    if pad.is_none() {
        log::error!("{} has no sink pad", element.name());
    }
    pad
}

impl PadResolver {
    /// Build the routing table and collect every consumer's sink pad
    pub fn from_assembly(assembly: &Assembly, audio_source: usize) -> Self {
        let table = RoutingTable::new(
            assembly.sources.iter().map(|s| s.decoder.clone()),
            audio_source,
        );

        let mut consumers = HashMap::new();
        if let Some(pad) = sink_pad_of(&assembly.audio.convert) {
            consumers.insert(Route::AudioChain, pad);
        }
        for source in &assembly.sources {
            if let Some(pad) = sink_pad_of(&source.scaler) {
                consumers.insert(Route::Scaler(source.index), pad);
            }
            if let Some(pad) = source.discard.as_ref().and_then(sink_pad_of) {
                consumers.insert(Route::DiscardAudio(source.index), pad);
            }
        }

        Self {
            table,
            consumers,
            report: Mutex::new(Vec::new()),
        }
    }

    /// Register the resolver on every source. The handlers hold a weak
    /// reference; the graph owns the resolver.
    pub fn attach(self: &Arc<Self>, assembly: &Assembly) {
        for source in &assembly.sources {
            let resolver: Weak<PadResolver> = Arc::downgrade(self);
            source.decoder.connect_pad_added(move |src, pad| {
                if let Some(resolver) = resolver.upgrade() {
                    let _ = resolver.handle_pad_added(src, pad);
                }
            });
        }
    }

    /// Resolve and link one newly exposed pad.
    ///
    /// Returns the route taken, `Ok(None)` for ignored media types.
    pub fn handle_pad_added(
        &self,
        source: &gst::Element,
        pad: &gst::Pad,
    ) -> std::result::Result<Option<Route>, ResolveError> {
        log::info!("Received new pad '{}' from '{}'", pad.name(), source.name());

        // Only negotiated caps count, templates may list several media types
        let media_type = pad
            .current_caps()
            .and_then(|caps| caps.structure(0).map(|s| s.name().to_string()));

        let result = match &media_type {
            Some(media_type) => self.route_and_link(source, pad, media_type),
            None => Err(ResolveError::NoCaps(pad.name().to_string())),
        };
        let media_type = media_type.unwrap_or_default();

        let outcome = match &result {
            Ok(Some(route)) => {
                log::info!("Link succeeded (type '{}') -> {:?}", media_type, route);
                Outcome::Linked(*route)
            }
            Ok(None) => {
                log::info!("Ignoring pad '{}' of type '{}'", pad.name(), media_type);
                Outcome::Ignored
            }
            Err(e @ ResolveError::AlreadyLinked(_)) => {
                log::warn!("Dropping extra stream: {}", e);
                Outcome::Failed(e.clone())
            }
            Err(e) => {
                log::warn!("Type is '{}' but link failed: {}", media_type, e);
                Outcome::Failed(e.clone())
            }
        };

        self.report.lock().push(ResolutionRecord {
            source: source.name().to_string(),
            pad: pad.name().to_string(),
            media_type,
            outcome,
        });

        result
    }

    fn route_and_link(
        &self,
        source: &gst::Element,
        pad: &gst::Pad,
        media_type: &str,
    ) -> std::result::Result<Option<Route>, ResolveError> {
        let route = match self.table.resolve(source, media_type) {
            Ok(Some(route)) => route,
            Ok(None) => return Ok(None),
            Err(UnknownSource) => {
                return Err(ResolveError::UnknownSource(source.name().to_string()))
            }
        };

        let sink = self
            .consumers
            .get(&route)
            .ok_or(ResolveError::NoConsumer(route))?;

        let from = format!("{}:{}", source.name(), pad.name());
        if pad.is_linked() {
            return Err(ResolveError::AlreadyLinked(from));
        }
        let to = sink
            .parent_element()
            .map(|e| format!("{}:{}", e.name(), sink.name()))
            .unwrap_or_else(|| sink.name().to_string());
        if sink.is_linked() {
            return Err(ResolveError::AlreadyLinked(to));
        }

        pad.link(sink).map_err(|e| ResolveError::LinkRefused {
            from,
            to,
            reason: format!("{:?}", e),
        })?;

        Ok(Some(route))
    }

    /// Every resolution so far, in arrival order
    pub fn report(&self) -> Vec<ResolutionRecord> {
        self.report.lock().clone()
    }

    /// Log which streams made it into the output
    pub fn log_summary(&self) {
        let report = self.report.lock();
        if report.is_empty() {
            log::warn!("No streams were discovered");
            return;
        }
        for record in report.iter() {
            match &record.outcome {
                Outcome::Linked(route) => log::info!(
                    "  {}:{} ({}) -> {:?}",
                    record.source,
                    record.pad,
                    record.media_type,
                    route
                ),
                Outcome::Ignored => log::info!(
                    "  {}:{} ({}) ignored",
                    record.source,
                    record.pad,
                    record.media_type
                ),
                Outcome::Failed(e) => log::warn!(
                    "  {}:{} ({}) dropped: {}",
                    record.source,
                    record.pad,
                    record.media_type,
                    e
                ),
            }
        }
    }
}
