// KMZ trace reader - Validates the archive and extracts the pipeline path
use crate::domain::error::ProfileError;
use crate::domain::trace::RawCoordinate;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Altitudes within this band of zero, or of each other, count as absent.
const ELEVATION_TOLERANCE_M: f64 = 0.1;

/// Ceiling on the inflated size of the KML document.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTrace {
    pub coordinates: Vec<RawCoordinate>,
    pub has_elevations: bool,
    pub total_distance_m: f64,
    pub metadata: TraceMetadata,
    pub warnings: Vec<String>,
}

/// What a single pass over the KML document found.
#[derive(Debug, Default)]
struct KmlScan {
    root: Option<String>,
    name: Option<String>,
    description: Option<String>,
    path_coordinates: Option<String>,
}

/// Check the container without extracting coordinates.
pub fn validate(container: &[u8]) -> ValidationReport {
    validate_within(container, DEFAULT_MAX_DOCUMENT_BYTES)
}

pub fn validate_within(container: &[u8], max_document_bytes: u64) -> ValidationReport {
    load(container, max_document_bytes).1
}

pub fn parse(container: &[u8]) -> Result<ParsedTrace, ProfileError> {
    parse_within(container, DEFAULT_MAX_DOCUMENT_BYTES)
}

pub fn parse_within(
    container: &[u8],
    max_document_bytes: u64,
) -> Result<ParsedTrace, ProfileError> {
    let (scan, report) = load(container, max_document_bytes);
    let scan = match scan {
        Some(scan) if report.is_valid => scan,
        _ => return Err(ProfileError::InvalidTrace(report.errors)),
    };

    let mut warnings = report.warnings;
    let path = scan.path_coordinates.as_deref().unwrap_or("");
    let (coordinates, skipped) = parse_coordinates(path);
    if skipped > 0 {
        warnings.push(format!("skipped {} malformed coordinate tuple(s)", skipped));
    }
    if coordinates.is_empty() {
        return Err(ProfileError::EmptyTrace);
    }

    let has_elevations = has_elevations(&coordinates);
    let total_distance_m = calculate_distance(&coordinates);
    tracing::debug!(
        "Parsed {} coordinates ({} skipped), {:.0} m, elevations in file: {}",
        coordinates.len(),
        skipped,
        total_distance_m,
        has_elevations
    );

    Ok(ParsedTrace {
        coordinates,
        has_elevations,
        total_distance_m,
        metadata: TraceMetadata {
            name: scan.name,
            description: scan.description,
        },
        warnings,
    })
}

/// True only when altitudes are present and actually vary.
pub fn has_elevations(coordinates: &[RawCoordinate]) -> bool {
    let altitudes = coordinates.iter().map(RawCoordinate::altitude_or_zero);
    let any_set = altitudes.clone().any(|a| a.abs() > ELEVATION_TOLERANCE_M);
    let (min, max) = altitudes.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), a| {
        (lo.min(a), hi.max(a))
    });
    any_set && max - min > ELEVATION_TOLERANCE_M
}

pub fn calculate_distance(coordinates: &[RawCoordinate]) -> f64 {
    coordinates
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

fn is_kml_entry(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".kml")
}

fn load(container: &[u8], max_document_bytes: u64) -> (Option<KmlScan>, ValidationReport) {
    let mut report = ValidationReport::default();

    let mut archive = match ZipArchive::new(Cursor::new(container)) {
        Ok(archive) => archive,
        Err(e) => {
            report.errors.push(format!("not a valid KMZ archive: {}", e));
            return (None, report);
        }
    };

    let mut candidates = Vec::new();
    for index in 0..archive.len() {
        match archive.by_index_raw(index) {
            Ok(entry) if is_kml_entry(entry.name()) => {
                candidates.push((index, entry.name().to_string()))
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping unreadable archive entry {}: {}", index, e),
        }
    }

    let Some((index, entry_name)) = candidates.first().cloned() else {
        report.errors.push("archive contains no KML document".to_string());
        return (None, report);
    };
    if candidates.len() > 1 {
        report.warnings.push(format!(
            "archive contains {} KML documents, using '{}'",
            candidates.len(),
            entry_name
        ));
    }
    tracing::debug!("Reading trace document '{}'", entry_name);

    let mut entry = match archive.by_index(index) {
        Ok(entry) => entry,
        Err(e) => {
            report.errors.push(format!("cannot read '{}': {}", entry_name, e));
            return (None, report);
        }
    };
    let too_large = format!(
        "'{}' exceeds the {} byte document limit",
        entry_name, max_document_bytes
    );
    if entry.size() > max_document_bytes {
        report.errors.push(too_large);
        return (None, report);
    }

    // The declared size can lie, so the read itself is capped too.
    let mut raw = Vec::new();
    let mut capped = entry.by_ref().take(max_document_bytes.saturating_add(1));
    if let Err(e) = capped.read_to_end(&mut raw) {
        report.errors.push(format!("cannot read '{}': {}", entry_name, e));
        return (None, report);
    }
    if raw.len() as u64 > max_document_bytes {
        report.errors.push(too_large);
        return (None, report);
    }
    let text = match String::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            report.errors.push(format!("cannot read '{}': {}", entry_name, e));
            return (None, report);
        }
    };

    match scan_document(&text) {
        Ok(scan) => {
            if scan.root.as_deref() != Some("kml") {
                report.warnings.push(format!(
                    "document root is '{}' rather than 'kml'",
                    scan.root.as_deref().unwrap_or_default()
                ));
            }
            report.is_valid = true;
            (Some(scan), report)
        }
        Err(e) => {
            report.errors.push(format!("'{}' is not well-formed XML: {}", entry_name, e));
            (None, report)
        }
    }
}

/// Walk the whole document once, checking well-formedness and capturing the
/// first LineString's coordinates plus name/description metadata.
fn scan_document(xml: &str) -> Result<KmlScan, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut scan = KmlScan::default();
    let mut stack: Vec<String> = Vec::new();
    let mut root_closed = false;
    let mut text_buf = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(format!("{} at byte {}", e, reader.buffer_position())),
        };
        match event {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if stack.is_empty() {
                    if root_closed {
                        return Err(format!("second root element '{}'", name));
                    }
                    scan.root = Some(name.clone());
                }
                stack.push(name);
                text_buf.clear();
            }
            Event::Empty(ref e) => {
                if stack.is_empty() {
                    if root_closed {
                        return Err("second root element".to_string());
                    }
                    scan.root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    root_closed = true;
                }
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match stack.pop() {
                    Some(open) if open == name => {}
                    Some(open) => {
                        return Err(format!("'{}' closed by '{}'", open, name));
                    }
                    None => return Err(format!("unexpected closing tag '{}'", name)),
                }
                capture_text(&mut scan, &stack, &name, &text_buf);
                text_buf.clear();
                if stack.is_empty() {
                    root_closed = true;
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|err| err.to_string())?;
                if stack.is_empty() && !text.trim().is_empty() {
                    return Err(format!(
                        "text outside the root element at byte {}",
                        reader.buffer_position()
                    ));
                }
                text_buf.push_str(&text);
            }
            Event::CData(ref e) => {
                if stack.is_empty() {
                    return Err(format!(
                        "CDATA outside the root element at byte {}",
                        reader.buffer_position()
                    ));
                }
                text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element '{}'", open));
    }
    if scan.root.is_none() {
        return Err("document has no root element".to_string());
    }

    Ok(scan)
}

fn capture_text(scan: &mut KmlScan, parents: &[String], element: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match element {
        "coordinates" if scan.path_coordinates.is_none() => {
            if parents.last().map(String::as_str) == Some("LineString") {
                scan.path_coordinates = Some(text.to_string());
            }
        }
        "name" if scan.name.is_none() => scan.name = Some(text.to_string()),
        "description" if scan.description.is_none() => {
            scan.description = Some(text.to_string())
        }
        _ => {}
    }
}

/// Parse `lon,lat[,alt]` tuples; returns the coordinates and the count skipped.
fn parse_coordinates(text: &str) -> (Vec<RawCoordinate>, usize) {
    let mut coordinates = Vec::new();
    let mut skipped = 0;

    for tuple in text.split_whitespace() {
        let mut parts = tuple.split(',').map(|p| p.trim().parse::<f64>());
        let lon = parts.next().and_then(Result::ok).filter(|v| v.is_finite());
        let lat = parts.next().and_then(Result::ok).filter(|v| v.is_finite());
        let altitude = parts.next().and_then(Result::ok).filter(|v| v.is_finite());

        match (lat, lon) {
            (Some(latitude), Some(longitude)) => {
                coordinates.push(RawCoordinate::new(latitude, longitude, altitude))
            }
            _ => skipped += 1,
        }
    }

    (coordinates, skipped)
}


#[cfg(test)]
mod tests {
    use super::test_support::{build_kmz, kml_with_coordinates};
    use super::*;

    #[test]
    fn test_parse_reads_lon_lat_alt_order() {
        let kml = kml_with_coordinates(
            "-68.629742,-38.233023,545 -68.627113,-38.23531,535\n-68.6249,-38.2371",
        );
        let trace = parse(&build_kmz(&[("doc.kml", kml.as_str())])).unwrap();

        assert_eq!(trace.coordinates.len(), 3);
        assert_eq!(trace.coordinates[0].latitude, -38.233023);
        assert_eq!(trace.coordinates[0].longitude, -68.629742);
        assert_eq!(trace.coordinates[1].altitude, Some(535.0));
        assert_eq!(trace.coordinates[2].altitude, None);
        assert_eq!(trace.coordinates[2].altitude_or_zero(), 0.0);
        assert!(trace.has_elevations);
        assert_eq!(trace.total_distance_m, calculate_distance(&trace.coordinates));
        assert_eq!(trace.metadata.name.as_deref(), Some("Acueducto Norte"));
        assert_eq!(trace.metadata.description.as_deref(), Some("Traza <b>principal</b>"));
        assert!(trace.warnings.is_empty());
    }

    #[test]
    fn test_parse_skips_short_tuples() {
        let kml = kml_with_coordinates("-68.62,-38.23,0 -68.61 abc,def -68.60,-38.21,x");
        let trace = parse(&build_kmz(&[("doc.kml", kml.as_str())])).unwrap();

        assert_eq!(trace.coordinates.len(), 2);
        assert_eq!(trace.coordinates[1].altitude, None);
        assert_eq!(trace.warnings, vec!["skipped 2 malformed coordinate tuple(s)".to_string()]);
    }

    #[test]
    fn test_parse_uses_first_line_string_only() {
        let kml = r#"<kml><Document>
            <Placemark><Point><coordinates>1,1,1</coordinates></Point></Placemark>
            <Placemark><LineString>
                <coordinates>-68.62,-38.23,10 -68.61,-38.22,20</coordinates>
            </LineString></Placemark>
            <Placemark><LineString><coordinates>0,0 1,1 2,2</coordinates></LineString></Placemark>
        </Document></kml>"#;
        let trace = parse(&build_kmz(&[("doc.kml", kml)])).unwrap();
        assert_eq!(trace.coordinates.len(), 2);
        assert_eq!(trace.coordinates[0].altitude, Some(10.0));
    }

    #[test]
    fn test_empty_path_is_empty_trace() {
        let kml = kml_with_coordinates("   ");
        assert_eq!(parse(&build_kmz(&[("doc.kml", kml.as_str())])), Err(ProfileError::EmptyTrace));

        let kml = kml_with_coordinates("garbage,tuple only");
        assert_eq!(parse(&build_kmz(&[("doc.kml", kml.as_str())])), Err(ProfileError::EmptyTrace));
    }

    #[test]
    fn test_validate_rejects_non_archive() {
        let report = validate(b"definitely not a zip");
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("not a valid KMZ archive"));
        assert!(matches!(parse(b"nope"), Err(ProfileError::InvalidTrace(_))));
    }

    #[test]
    fn test_validate_requires_kml_document() {
        let report = validate(&build_kmz(&[("files/icon.png", "png")]));
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec!["archive contains no KML document".to_string()]);
    }

    #[test]
    fn test_validate_rejects_malformed_xml() {
        let broken = "<kml><Document><LineString></Document></kml>";
        let report = validate(&build_kmz(&[("doc.kml", broken)]));
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("not well-formed"));

        let unclosed = "<kml><Document>";
        assert!(!validate(&build_kmz(&[("doc.kml", unclosed)])).is_valid);
    }

    #[test]
    fn test_validate_rejects_text_outside_root() {
        let leading = "garbage <kml><Document></Document></kml>";
        let report = validate(&build_kmz(&[("doc.kml", leading)]));
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("text outside the root element"));

        let trailing = "<kml><Document></Document></kml> trailing";
        assert!(!validate(&build_kmz(&[("doc.kml", trailing)])).is_valid);

        let cdata = "<kml><Document></Document></kml><![CDATA[x]]>";
        assert!(!validate(&build_kmz(&[("doc.kml", cdata)])).is_valid);

        let padded = "\n  <kml><Document></Document></kml>\n\n";
        assert!(validate(&build_kmz(&[("doc.kml", padded)])).is_valid);
    }

    #[test]
    fn test_validate_warns_on_non_kml_root() {
        let kml = "<Document><name>Linea</name></Document>";
        let report = validate(&build_kmz(&[("doc.kml", kml)]));

        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert_eq!(
            report.warnings,
            vec!["document root is 'Document' rather than 'kml'".to_string()]
        );
    }

    #[test]
    fn test_document_size_limit() {
        let kml = kml_with_coordinates("-68.62,-38.23,0 -68.61,-38.22,0");
        let kmz = build_kmz(&[("doc.kml", kml.as_str())]);
        let size = kml.len() as u64;

        assert!(validate_within(&kmz, size).is_valid);
        assert!(parse_within(&kmz, size).is_ok());

        let report = validate_within(&kmz, size - 1);
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![format!("'doc.kml' exceeds the {} byte document limit", size - 1)]
        );
        assert!(matches!(
            parse_within(&kmz, size - 1),
            Err(ProfileError::InvalidTrace(_))
        ));
    }

    #[test]
    fn test_highly_compressible_document_is_capped() {
        let filler = "<!-- padding -->".repeat(64 * 1024);
        let kml = format!("<kml><Document>{}</Document></kml>", filler);
        let kmz = build_kmz(&[("doc.kml", kml.as_str())]);

        let report = validate_within(&kmz, 64 * 1024);
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("byte document limit"));
    }

    #[test]
    fn test_multiple_documents_warn_and_use_first() {
        let first = kml_with_coordinates("-68.62,-38.23,0 -68.61,-38.22,0");
        let second = kml_with_coordinates("1,1 2,2 3,3");
        let kmz = build_kmz(&[("doc.kml", first.as_str()), ("extra/Other.KML", second.as_str())]);

        let report = validate(&kmz);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("'doc.kml'"));

        let trace = parse(&kmz).unwrap();
        assert_eq!(trace.coordinates.len(), 2);
        assert_eq!(trace.warnings, report.warnings);
    }

    #[test]
    fn test_has_elevations_needs_varying_altitudes() {
        let at = |alt: Option<f64>| RawCoordinate::new(-38.0, -68.0, alt);

        assert!(!has_elevations(&[at(Some(0.0)), at(None), at(Some(0.0))]));
        assert!(!has_elevations(&[at(Some(500.0)), at(Some(500.05)), at(Some(500.0))]));
        assert!(!has_elevations(&[at(Some(0.05)), at(Some(-0.04))]));
        assert!(has_elevations(&[at(Some(500.0)), at(Some(480.0))]));
        assert!(has_elevations(&[at(None), at(Some(12.0))]));
    }

    #[test]
    fn test_distance_of_short_traces_is_zero() {
        assert_eq!(calculate_distance(&[]), 0.0);
        assert_eq!(calculate_distance(&[RawCoordinate::new(-38.0, -68.0, None)]), 0.0);
    }
}
