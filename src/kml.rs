//! Placemark extraction from KML documents.
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use quick_xml::{events::Event, Reader};

use crate::location::{Location, Locations, ParseLocationError};

/// Read the file at `path` and extract its placemarks.
pub fn parse_kml_file(path: impl AsRef<Path>) -> Result<Locations, ParseError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_owned(),
        source,
    })?;
    read_locations(BufReader::new(file))
}

/// Extract a title -> location mapping from every `Placemark` in the document.
///
/// Each placemark needs a `name` and a `Point/coordinates` of `lon,lat[,alt]`.
/// Any malformed placemark fails the whole document.
///
/// ```
/// use coordbot::{kml::read_locations, Location};
///
/// let doc = r#"<kml><Document>
///   <Placemark><name>Big Ben</name><Point><coordinates>-0.1245,51.5007,0</coordinates></Point></Placemark>
/// </Document></kml>"#;
/// let locations = read_locations(doc.as_bytes()).unwrap();
/// assert_eq!(locations["Big Ben"], Location::new(51.5007, -0.1245));
/// ```
pub fn read_locations(r: impl BufRead) -> Result<Locations, ParseError> {
    let mut reader = Reader::from_reader(r);
    reader.trim_text(true);

    let mut locations = Locations::new();
    let mut buf = Vec::new();
    // Local names of open elements below the current placemark.
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<Partial> = None;
    let mut index = 0;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| ParseError::Xml {
                position: reader.buffer_position(),
                source,
            })?;

        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if current.is_some() {
                    path.push(name);
                } else if name == b"Placemark" {
                    index += 1;
                    current = Some(Partial::new(index));
                }
            }
            Event::End(e) => {
                if current.is_none() {
                    // Outside a placemark.
                } else if path.is_empty() && e.local_name().as_ref() == b"Placemark" {
                    if let Some(partial) = current.take() {
                        let (title, location) = partial.finish()?;
                        if locations.contains_key(&title) {
                            warn!("Ignoring duplicate placemark {title:?}");
                        } else {
                            trace!("Found placemark {title:?} at {location}");
                            locations.insert(title, location);
                        }
                    }
                } else if let Some(name) = path.pop() {
                    if let Some(partial) = current.as_mut() {
                        partial.close(&name);
                    }
                }
            }
            Event::Text(e) => {
                if let Some(partial) = current.as_mut() {
                    let text = e.unescape().map_err(|source| ParseError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    partial.push_text(&path, &text);
                }
            }
            Event::CData(e) => {
                if let Some(partial) = current.as_mut() {
                    let bytes = e.into_inner();
                    partial.push_text(&path, &String::from_utf8_lossy(&bytes));
                }
            }
            Event::Empty(e) => {
                if current.is_none() && e.local_name().as_ref() == b"Placemark" {
                    index += 1;
                    return Err(ParseError::MissingName { placemark: index });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(partial) = current {
        return Err(ParseError::Unclosed {
            placemark: partial.index,
        });
    }

    Ok(locations)
}

/// Placemark fields collected until its end tag.
struct Partial {
    index: usize,
    name: Option<String>,
    // Set once the first `name` element closes, so later ones are ignored.
    name_done: bool,
    coordinates: Option<String>,
}

impl Partial {
    fn new(index: usize) -> Self {
        Self {
            index,
            name: None,
            name_done: false,
            coordinates: None,
        }
    }

    fn push_text(&mut self, path: &[Vec<u8>], text: &str) {
        match path.last().map(Vec::as_slice) {
            Some(b"name") if !self.name_done => {
                self.name.get_or_insert_with(String::new).push_str(text);
            }
            Some(b"coordinates") if path.iter().any(|p| p == b"Point") => {
                self.coordinates
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
            _ => {}
        }
    }

    fn close(&mut self, element: &[u8]) {
        if element == b"name" && self.name.is_some() {
            self.name_done = true;
        }
    }

    fn finish(self) -> Result<(String, Location), ParseError> {
        let placemark = self.index;
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or(ParseError::MissingName { placemark })?;
        let coordinates = self
            .coordinates
            .ok_or_else(|| ParseError::MissingCoordinates {
                placemark,
                name: name.clone(),
            })?;
        let location = coordinates
            .parse()
            .map_err(|source| ParseError::Coordinates {
                placemark,
                name: name.clone(),
                text: coordinates.trim().to_owned(),
                source,
            })?;
        Ok((name, location))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("opening {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed xml at byte {position}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("placemark {placemark} is not closed")]
    Unclosed { placemark: usize },
    #[error("placemark {placemark} has no name")]
    MissingName { placemark: usize },
    #[error("placemark {placemark} ({name:?}) has no point coordinates")]
    MissingCoordinates { placemark: usize, name: String },
    #[error("placemark {placemark} ({name:?}) has invalid coordinates {text:?}")]
    Coordinates {
        placemark: usize,
        name: String,
        text: String,
        #[source]
        source: ParseLocationError,
    },
}
