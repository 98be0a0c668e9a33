use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::{Document, DocumentNode, LineGeometry, PointGeometry, TrackGeometry};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed markup near byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("document ended with {open} unclosed element(s)")]
    Truncated { open: usize },
    #[error("document has no folder element")]
    MissingRoot,
}

/// Reads and decodes a document, falling back to whatever could be decoded.
///
/// An unreadable file yields an empty document; malformed markup yields the
/// folders closed before the error. Failures are logged, never returned.
pub fn load_document(path: impl AsRef<Path>) -> Document {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => {
            let doc = parse_document(&text);
            info!(
                "loaded {} ({} leaves)",
                path.display(),
                doc.root().leaf_count()
            );
            doc
        }
        Err(e) => {
            warn!("failed to read {}: {e}; using an empty document", path.display());
            Document::empty()
        }
    }
}

pub fn try_load_document(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    try_parse_document(&text)
}

/// Best-effort decode of document text.
pub fn parse_document(text: &str) -> Document {
    let (doc, error) = decode(text);
    if let Some(e) = error {
        warn!("document decoded partially: {e}");
    }
    doc
}

/// Strict decode: any markup error is returned instead of a partial tree.
pub fn try_parse_document(text: &str) -> Result<Document, LoadError> {
    match decode(text) {
        (doc, None) => Ok(doc),
        (_, Some(e)) => Err(e),
    }
}

/// Structural tags after alias normalization.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Tag {
    /// `kml`, `Document`, `Folder` and `Placemark` all decode as a folder.
    Folder,
    Name,
    Visibility,
    StyleUrl,
    Description,
    Point,
    LineString,
    Track,
    Coordinates,
    AltitudeMode,
    When,
    Coord,
    Other,
}

fn canonical_tag(local_name: &[u8]) -> Tag {
    match local_name {
        b"kml" | b"Document" | b"Folder" | b"Placemark" => Tag::Folder,
        b"name" => Tag::Name,
        b"visibility" => Tag::Visibility,
        b"styleUrl" => Tag::StyleUrl,
        b"description" => Tag::Description,
        b"Point" => Tag::Point,
        b"LineString" => Tag::LineString,
        b"Track" => Tag::Track,
        b"coordinates" => Tag::Coordinates,
        b"altitudeMode" => Tag::AltitudeMode,
        b"when" => Tag::When,
        b"coord" => Tag::Coord,
        _ => Tag::Other,
    }
}

struct OpenElement {
    tag: Tag,
    text: String,
}

#[derive(Default)]
struct TreeBuilder {
    elements: Vec<OpenElement>,
    folders: Vec<DocumentNode>,
    root: Option<DocumentNode>,
    root_is_wrapper: bool,
}

impl TreeBuilder {
    fn start(&mut self, e: &BytesStart<'_>) {
        let local = e.local_name();
        let tag = canonical_tag(local.as_ref());
        match tag {
            Tag::Folder => {
                if self.folders.is_empty() && self.root.is_none() {
                    self.root_is_wrapper = local.as_ref() == b"kml";
                }
                self.folders.push(DocumentNode::default());
            }
            Tag::Point => {
                if let Some(folder) = self.folders.last_mut() {
                    folder.point = Some(PointGeometry::default());
                }
            }
            Tag::LineString => {
                if let Some(folder) = self.folders.last_mut() {
                    folder.line = Some(LineGeometry::default());
                }
            }
            Tag::Track => {
                if let Some(folder) = self.folders.last_mut() {
                    folder.track = Some(TrackGeometry::default());
                }
            }
            _ => {}
        }
        self.elements.push(OpenElement {
            tag,
            text: String::new(),
        });
    }

    fn empty(&mut self, e: &BytesStart<'_>) {
        // A self-closing folder is an empty leaf; other empty elements carry
        // nothing worth keeping.
        if canonical_tag(e.local_name().as_ref()) == Tag::Folder {
            self.start(e);
            self.end();
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(open) = self.elements.last_mut() {
            open.text.push_str(text);
        }
    }

    fn end(&mut self) {
        let Some(closed) = self.elements.pop() else {
            return;
        };
        let parent = self.elements.last().map(|e| e.tag);

        if closed.tag == Tag::Folder {
            self.close_folder();
            return;
        }

        let Some(folder) = self.folders.last_mut() else {
            return;
        };
        let text = closed.text.trim();

        match (parent, closed.tag) {
            (Some(Tag::Folder), Tag::Name) => folder.name = text.to_string(),
            (Some(Tag::Folder), Tag::Description) => folder.description = text.to_string(),
            (Some(Tag::Folder), Tag::StyleUrl) => folder.style_id = text.to_string(),
            (Some(Tag::Folder), Tag::Visibility) => {
                if let Some(v) = parse_visibility(text) {
                    folder.visible = v;
                }
            }
            (Some(Tag::Point), Tag::Coordinates) => {
                if let Some(p) = folder.point.as_mut() {
                    p.coordinates = text.to_string();
                }
            }
            (Some(Tag::Point), Tag::AltitudeMode) => {
                if let Some(p) = folder.point.as_mut() {
                    p.altitude_mode = text.to_string();
                }
            }
            (Some(Tag::LineString), Tag::Coordinates) => {
                if let Some(l) = folder.line.as_mut() {
                    l.coordinates = text.to_string();
                }
            }
            (Some(Tag::LineString), Tag::AltitudeMode) => {
                if let Some(l) = folder.line.as_mut() {
                    l.altitude_mode = text.to_string();
                }
            }
            (Some(Tag::Track), Tag::When) => {
                if let Some(t) = folder.track.as_mut() {
                    t.whens.push(text.to_string());
                }
            }
            (Some(Tag::Track), Tag::Coord) => {
                if let Some(t) = folder.track.as_mut() {
                    t.coords.push(text.to_string());
                }
            }
            (Some(Tag::Track), Tag::AltitudeMode) => {
                if let Some(t) = folder.track.as_mut() {
                    t.altitude_mode = text.to_string();
                }
            }
            _ => {}
        }
    }

    fn close_folder(&mut self) {
        let Some(done) = self.folders.pop() else {
            return;
        };
        match self.folders.last_mut() {
            Some(parent) => parent.children.push(done),
            None => {
                if self.root.is_none() {
                    self.root = Some(done);
                } else {
                    debug!("ignoring extra top-level folder {:?}", done.name);
                }
            }
        }
    }

    /// Number of elements still open.
    fn open_count(&self) -> usize {
        self.elements.len()
    }

    fn finish(mut self) -> Option<DocumentNode> {
        while !self.folders.is_empty() {
            self.close_folder();
        }
        let root = self.root?;
        if self.root_is_wrapper && root.children.len() == 1 && !root.has_geometry() {
            return root.children.into_iter().next();
        }
        Some(root)
    }
}

fn parse_visibility(text: &str) -> Option<bool> {
    match text {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Decodes `text` into a document, returning the (possibly partial) tree and
/// the first error encountered.
fn decode(text: &str) -> (Document, Option<LoadError>) {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut builder = TreeBuilder::default();
    let mut error = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => builder.start(&e),
            Ok(Event::Empty(e)) => builder.empty(&e),
            Ok(Event::End(_)) => builder.end(),
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(s) => builder.text(&s),
                Err(_) => builder.text(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(c)) => builder.text(&String::from_utf8_lossy(&c)),
            Ok(Event::Eof) => {
                if builder.open_count() > 0 {
                    error = Some(LoadError::Truncated {
                        open: builder.open_count(),
                    });
                }
                break;
            }
            Ok(_) => {}
            Err(source) => {
                error = Some(LoadError::Xml {
                    position: reader.buffer_position() as u64,
                    source,
                });
                break;
            }
        }
    }

    match builder.finish() {
        Some(root) => (Document::new(root), error),
        None => (
            Document::empty(),
            Some(error.unwrap_or(LoadError::MissingRoot)),
        ),
    }
}
