//! Flat-text readers and writers.
//!
//! - **Soundings**: one point per line,
//!   `x,y,depth[,category[,feature[,condition]]]`. `category` is a CATZOC
//!   code (`1`-`6`) or name (`A1` ... `U`); `feature` is an S-57 object code
//!   (20, 35, 45) marking a hazard, whose depth may be left empty when
//!   unknown. Blank lines and lines starting with `#` are skipped.
//! - **Polygons**: well-known text, `POLYGON` and `MULTIPOLYGON`, any number
//!   per file.
//! - **Dumps**: one WKT polygon per line (mesh triangles, labels).
//!
//! # Examples
//!
//! ```rust
//! use sounding_selection::core::point_set::VertexStore;
//! use sounding_selection::io::{parse_soundings, parse_wkt_polygons};
//!
//! let points = parse_soundings("0,0,5.2,A1\n10,0,6\n").unwrap();
//! assert_eq!(points.len(), 2);
//!
//! let polygons = parse_wkt_polygons("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
//! assert_eq!(polygons.len(), 1);
//! ```

#![forbid(unsafe_code)]

use crate::core::algorithms::validation::conflicting_points;
use crate::core::mesh::Mesh;
use crate::core::point_set::{PointSet, VertexStore};
use crate::core::vertex::{AccuracyCategory, Feature, FeatureType, Vertex, VertexBuilder};
use crate::geometry::{kernel, point::Point};
use crate::selection::SelectionReport;
use geo::{LineString, Polygon};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing flat files.
#[derive(Debug, Error)]
pub enum IoError {
    /// The file could not be opened, read or written.
    #[error("{path}: {source}")]
    File {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Writing to a stream failed.
    #[error(transparent)]
    Stream(#[from] std::io::Error),
    /// A sounding line could not be parsed.
    #[error("line {line}: {message}")]
    Sounding {
        /// One-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },
    /// Polygon text could not be parsed.
    #[error("WKT at byte {offset}: {message}")]
    Wkt {
        /// Byte offset of the problem.
        offset: usize,
        /// What was wrong.
        message: String,
    },
}

fn read_text(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn create(path: &Path) -> Result<BufWriter<fs::File>, IoError> {
    fs::File::create(path)
        .map(BufWriter::new)
        .map_err(|source| IoError::File {
            path: path.to_path_buf(),
            source,
        })
}

// =============================================================================
// SOUNDINGS
// =============================================================================

/// Parses sounding lines.
///
/// # Errors
///
/// Returns [`IoError::Sounding`] for the first malformed line.
pub fn parse_soundings(text: &str) -> Result<PointSet, IoError> {
    let mut points = PointSet::new();
    for (n, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let vertex = parse_sounding(line).map_err(|message| IoError::Sounding {
            line: n + 1,
            message,
        })?;
        points.push(vertex);
    }
    Ok(points)
}

fn parse_sounding(line: &str) -> Result<Vertex, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(format!("expected at least x,y,depth, got {} fields", fields.len()));
    }
    let number = |name: &str, s: &str| {
        s.parse::<f64>()
            .map_err(|e| format!("invalid {name} {s:?}: {e}"))
    };
    let x = number("x", fields[0])?;
    let y = number("y", fields[1])?;

    let mut builder = VertexBuilder::default();
    builder.point(Point::new(x, y));

    if let Some(&text) = fields.get(3).filter(|s| !s.is_empty()) {
        builder.quality(parse_category(text)?);
    }
    let feature = match fields.get(4).filter(|s| !s.is_empty()) {
        Some(&code) => {
            let code: u16 = code
                .parse()
                .map_err(|e| format!("invalid feature code {code:?}: {e}"))?;
            let kind = FeatureType::from_code(code)
                .ok_or_else(|| format!("unknown feature code {code}"))?;
            let condition = match fields.get(5).filter(|s| !s.is_empty()) {
                Some(&c) => Some(
                    c.parse::<u8>()
                        .map_err(|e| format!("invalid condition {c:?}: {e}"))?,
                ),
                None => None,
            };
            Some(Feature::new(kind, condition))
        }
        None => None,
    };

    // Hazards of unknown depth are carried at depth 0.
    let depth = match (fields[2], feature) {
        ("", Some(_)) => 0.0,
        (text, _) => number("depth", text)?,
    };
    builder.depth(depth);
    if let Some(feature) = feature {
        builder.feature(feature);
    }
    builder.build().map_err(|e| e.to_string())
}

fn parse_category(text: &str) -> Result<AccuracyCategory, String> {
    if let Ok(code) = text.parse::<u8>() {
        return AccuracyCategory::from_code(code).ok_or_else(|| format!("unknown category code {code}"));
    }
    match text.to_ascii_uppercase().as_str() {
        "A1" => Ok(AccuracyCategory::A1),
        "A2" => Ok(AccuracyCategory::A2),
        "B" => Ok(AccuracyCategory::B),
        "C" => Ok(AccuracyCategory::C),
        "D" => Ok(AccuracyCategory::D),
        "U" => Ok(AccuracyCategory::U),
        _ => Err(format!("unknown category {text:?}")),
    }
}

/// Reads a sounding file.
///
/// # Errors
///
/// Returns [`IoError`] if the file cannot be read or parsed.
pub fn read_soundings(path: impl AsRef<Path>) -> Result<PointSet, IoError> {
    parse_soundings(&read_text(path.as_ref())?)
}

/// One sounding line: `x,y,depth` plus the category code when known.
#[must_use]
pub fn format_sounding(v: &Vertex) -> String {
    match v.quality() {
        Some(q) => format!("{v},{}", q.code()),
        None => v.to_string(),
    }
}

/// Writes one sounding line per vertex.
///
/// # Errors
///
/// Returns [`IoError::Stream`] on write failure.
pub fn write_soundings<'a, W, I>(mut out: W, vertices: I) -> Result<(), IoError>
where
    W: Write,
    I: IntoIterator<Item = &'a Vertex>,
{
    for v in vertices {
        writeln!(out, "{}", format_sounding(v))?;
    }
    out.flush()?;
    Ok(())
}

/// Writes a sounding file.
///
/// # Errors
///
/// Returns [`IoError`] if the file cannot be written.
pub fn save_soundings<'a, I>(path: impl AsRef<Path>, vertices: I) -> Result<(), IoError>
where
    I: IntoIterator<Item = &'a Vertex>,
{
    write_soundings(create(path.as_ref())?, vertices)
}

// =============================================================================
// WKT
// =============================================================================

/// Parses every `POLYGON` and `MULTIPOLYGON` in `text`; multipolygons are
/// flattened into their member polygons.
///
/// # Errors
///
/// Returns [`IoError::Wkt`] at the first syntax error.
pub fn parse_wkt_polygons(text: &str) -> Result<Vec<Polygon<f64>>, IoError> {
    let mut cursor = WktCursor { text, pos: 0 };
    let mut polygons = Vec::new();
    loop {
        cursor.skip_separators();
        if cursor.at_end() {
            return Ok(polygons);
        }
        let keyword = cursor.keyword();
        match keyword.to_ascii_uppercase().as_str() {
            "POLYGON" => {
                if let Some(p) = cursor.polygon_or_empty()? {
                    polygons.push(p);
                }
            }
            "MULTIPOLYGON" => {
                if cursor.empty_marker() {
                    continue;
                }
                cursor.expect('(')?;
                loop {
                    polygons.push(cursor.polygon()?);
                    if !cursor.comma() {
                        break;
                    }
                }
                cursor.expect(')')?;
            }
            other => return Err(cursor.error(format!("unsupported geometry {other:?}"))),
        }
    }
}

/// Reads a WKT polygon file.
///
/// # Errors
///
/// Returns [`IoError`] if the file cannot be read or parsed.
pub fn read_wkt_polygons(path: impl AsRef<Path>) -> Result<Vec<Polygon<f64>>, IoError> {
    parse_wkt_polygons(&read_text(path.as_ref())?)
}

/// Writes one WKT polygon per line.
///
/// # Errors
///
/// Returns [`IoError::Stream`] on write failure.
pub fn write_wkt_polygons<'a, W, I>(mut out: W, polygons: I) -> Result<(), IoError>
where
    W: Write,
    I: IntoIterator<Item = &'a Polygon<f64>>,
{
    for polygon in polygons {
        writeln!(out, "{}", kernel::polygon_to_wkt(polygon))?;
    }
    out.flush()?;
    Ok(())
}

/// Writes a WKT polygon file.
///
/// # Errors
///
/// Returns [`IoError`] if the file cannot be written.
pub fn save_wkt_polygons<'a, I>(path: impl AsRef<Path>, polygons: I) -> Result<(), IoError>
where
    I: IntoIterator<Item = &'a Polygon<f64>>,
{
    write_wkt_polygons(create(path.as_ref())?, polygons)
}

/// Writes every triangle of `mesh` as a WKT polygon, one per line.
///
/// # Errors
///
/// Returns [`IoError::Stream`] on write failure.
pub fn write_mesh_wkt<W: Write>(out: W, mesh: &Mesh) -> Result<(), IoError> {
    let triangles: Vec<Polygon<f64>> = (0..mesh.triangle_count())
        .filter_map(|t| mesh.triangle_polygon(t))
        .collect();
    write_wkt_polygons(out, &triangles)
}

/// Writes a mesh dump file.
///
/// # Errors
///
/// Returns [`IoError`] if the file cannot be written.
pub fn save_mesh_wkt(path: impl AsRef<Path>, mesh: &Mesh) -> Result<(), IoError> {
    write_mesh_wkt(create(path.as_ref())?, mesh)
}

/// Writes the products of a selection run next to `prefix`:
///
/// | File | Content |
/// |---|---|
/// | `{prefix}_selection.txt` | selected soundings |
/// | `{prefix}_safety.txt` | source points still violating safety |
/// | `{prefix}_legibility.txt` | selected soundings with overlapping labels |
/// | `{prefix}_initial_tin.wkt` | triangles of the generalized selection |
/// | `{prefix}_final_tin.wkt` | triangles of the final selection |
/// | `{prefix}_labels.wkt` | printed label of every selected sounding |
///
/// Returns the paths written, in table order.
///
/// # Errors
///
/// Returns [`IoError`] if any file cannot be written.
pub fn save_report(
    prefix: impl AsRef<Path>,
    report: &SelectionReport,
    source: &PointSet,
) -> Result<Vec<PathBuf>, IoError> {
    let prefix = prefix.as_ref();
    let path = |suffix: &str| {
        let mut name = prefix.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    let unsafe_points: Vec<&Vertex> = report
        .safety_violations
        .iter()
        .filter_map(|v| source.vertices().get(v.source))
        .collect();
    let crowded: Vec<&Vertex> = conflicting_points(&report.legibility_conflicts)
        .into_iter()
        .filter_map(|i| report.soundings.get(i))
        .collect();

    let written = [
        path("_selection.txt"),
        path("_safety.txt"),
        path("_legibility.txt"),
        path("_initial_tin.wkt"),
        path("_final_tin.wkt"),
        path("_labels.wkt"),
    ];
    save_soundings(&written[0], &report.soundings)?;
    save_soundings(&written[1], unsafe_points)?;
    save_soundings(&written[2], crowded)?;
    save_mesh_wkt(&written[3], &report.initial_mesh)?;
    save_mesh_wkt(&written[4], &report.final_mesh)?;
    save_wkt_polygons(&written[5], &report.labels)?;
    Ok(written.to_vec())
}

struct WktCursor<'a> {
    text: &'a str,
    pos: usize,
}

impl WktCursor<'_> {
    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.rest().is_empty()
    }

    fn error(&self, message: impl Into<String>) -> IoError {
        IoError::Wkt {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    /// Whitespace and `;` between geometries.
    fn skip_separators(&mut self) {
        let trimmed = self.rest().trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        self.pos = self.text.len() - trimmed.len();
    }

    fn keyword(&mut self) -> &str {
        self.skip_ws();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.rest().len());
        self.pos += len;
        &self.text[start..self.pos]
    }

    fn empty_marker(&mut self) -> bool {
        self.skip_ws();
        let is_empty = self
            .rest()
            .get(..5)
            .is_some_and(|w| w.eq_ignore_ascii_case("EMPTY"));
        if is_empty {
            self.pos += 5;
        }
        is_empty
    }

    fn expect(&mut self, c: char) -> Result<(), IoError> {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn comma(&mut self) -> bool {
        self.skip_ws();
        if self.rest().starts_with(',') {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Result<f64, IoError> {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .unwrap_or(self.rest().len());
        let token = &self.rest()[..len];
        let value = token
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number {token:?}")))?;
        self.pos += len;
        Ok(value)
    }

    /// `x y [z [m]]`; extra ordinates are ignored.
    fn coordinate(&mut self) -> Result<(f64, f64), IoError> {
        let x = self.number()?;
        let y = self.number()?;
        loop {
            self.skip_ws();
            let more = self
                .rest()
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.');
            if !more {
                return Ok((x, y));
            }
            self.number()?;
        }
    }

    fn ring(&mut self) -> Result<LineString<f64>, IoError> {
        self.expect('(')?;
        let mut coords = vec![self.coordinate()?];
        while self.comma() {
            coords.push(self.coordinate()?);
        }
        self.expect(')')?;
        if coords.len() < 3 {
            return Err(self.error("ring needs at least three coordinates"));
        }
        Ok(LineString::from(coords))
    }

    fn polygon(&mut self) -> Result<Polygon<f64>, IoError> {
        self.expect('(')?;
        let exterior = self.ring()?;
        let mut interiors = Vec::new();
        while self.comma() {
            interiors.push(self.ring()?);
        }
        self.expect(')')?;
        Ok(Polygon::new(exterior, interiors))
    }

    fn polygon_or_empty(&mut self) -> Result<Option<Polygon<f64>>, IoError> {
        if self.empty_marker() {
            return Ok(None);
        }
        self.polygon().map(Some)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::point_set::VertexStore;
    use crate::sounding;

    #[test]
    fn test_parse_soundings() {
        let text = "# survey\n0,0,5.2,A1\n\n10, 0, 6 ,3\n20,5,,,35,3\n";
        let points = parse_soundings(text).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points.vertex(0).unwrap().quality(), Some(AccuracyCategory::A1));
        assert_eq!(points.vertex(1).unwrap().quality(), Some(AccuracyCategory::B));
        let rock = points.vertex(2).unwrap();
        assert_eq!(rock.depth(), 0.0);
        assert_eq!(rock.feature(), Some(Feature::new(FeatureType::Rock, Some(3))));
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse_soundings("0,0,1\n0,zero,1\n").unwrap_err();
        assert!(matches!(err, IoError::Sounding { line: 2, .. }), "{err}");
        assert!(parse_soundings("1,2\n").is_err());
        assert!(parse_soundings("1,2,3,Q\n").is_err());
        assert!(parse_soundings("1,2,,\n").is_err());
        assert!(parse_soundings("1,2,NaN\n").is_err());
    }

    #[test]
    fn test_write_soundings() {
        let vertices = vec![
            sounding!(1.5, 2.0, 3.25),
            sounding!(0.0, 0.0, 4.0, AccuracyCategory::C),
        ];
        let mut out = Vec::new();
        write_soundings(&mut out, &vertices).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "1.5,2,3.25\n0,0,4,4\n");
        let back = parse_soundings(&text).unwrap();
        assert_eq!(back.vertices(), vertices.as_slice());
    }

    #[test]
    fn test_parse_polygon_with_hole() {
        let text = "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 2))";
        let polygons = parse_wkt_polygons(text).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].exterior().0.len(), 5);
        assert_eq!(polygons[0].interiors().len(), 1);
    }

    #[test]
    fn test_parse_multipolygon_and_several_lines() {
        let text = "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))\n\
                    polygon ((0 0 1, 2 0 1, 2 2 1, 0 0 1))\n\
                    POLYGON EMPTY\n";
        let polygons = parse_wkt_polygons(text).unwrap();
        assert_eq!(polygons.len(), 3);
    }

    #[test]
    fn test_wkt_errors() {
        assert!(matches!(
            parse_wkt_polygons("LINESTRING (0 0, 1 1)"),
            Err(IoError::Wkt { .. })
        ));
        assert!(parse_wkt_polygons("POLYGON ((0 0, 1 0))").is_err());
        assert!(parse_wkt_polygons("POLYGON ((0 0, 1 0, 1 1, 0 0)").is_err());
    }

    #[test]
    fn test_mesh_dump() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(sounding!(0.0, 0.0, 1.0));
        let b = mesh.add_vertex(sounding!(1.0, 0.0, 1.0));
        let c = mesh.add_vertex(sounding!(0.0, 1.0, 1.0));
        mesh.add_triangle([a, b, c]).unwrap();
        let mut out = Vec::new();
        write_mesh_wkt(&mut out, &mesh).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(parse_wkt_polygons(&text).unwrap().len(), 1);
    }
}
