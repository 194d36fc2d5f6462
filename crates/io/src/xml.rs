//! XML codec for bibliographic records.
//!
//! Event-based writer and reader over a `<bibdata>` grammar covering the
//! whole model, including relation `<bibitem>`s nested recursively. The
//! reader is lenient about element order but strict about values: a bad
//! date or an unknown enum token is an error, an unknown element is
//! ignored.

use std::fmt;
use std::io::Write;

use chrono::NaiveDate;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use bib3gpp_model::{
    BibDate, BiblioNote, BibliographicRecord, Contributor, DocIdentifier, DocStatus, Entity,
    Organization, Person, Relation, Release, TypedLink, WorkGroup,
};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum XmlError {
    /// Writer or encoding failure.
    Write(String),
    /// Low-level XML syntax error.
    Parse(String),
    /// Well-formed XML that does not describe a record.
    Malformed(String),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(msg) => write!(f, "XML write error: {msg}"),
            Self::Parse(msg) => write!(f, "XML parse error: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed record XML: {msg}"),
        }
    }
}

impl std::error::Error for XmlError {}

fn werr<E: fmt::Display>(e: E) -> XmlError {
    XmlError::Write(e.to_string())
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

pub fn to_string(record: &BibliographicRecord) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_record(&mut writer, "bibdata", record)?;
    String::from_utf8(writer.into_inner()).map_err(werr)
}

fn write_record<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    record: &BibliographicRecord,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(tag);
    start.push_attribute(("type", "standard"));
    writer.write_event(Event::Start(start)).map_err(werr)?;

    if let Some(fetched) = &record.fetched {
        write_text(writer, "fetched", &fetched.to_string())?;
    }
    if let Some(title) = &record.title {
        write_text(writer, "title", title)?;
    }
    if let Some(abstract_text) = &record.abstract_text {
        write_text(writer, "abstract", abstract_text)?;
    }
    if let Some(status) = &record.status {
        writer
            .write_event(Event::Start(BytesStart::new("status")))
            .map_err(werr)?;
        write_text(writer, "stage", &status.stage.to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("status")))
            .map_err(werr)?;
    }
    for docid in &record.docid {
        write_typed_text(writer, "docidentifier", &docid.scheme, &docid.id)?;
    }
    write_text(writer, "docnumber", &record.docnumber)?;
    for date in &record.dates {
        let mut start = BytesStart::new("date");
        start.push_attribute(("type", date.kind.to_string().as_str()));
        writer.write_event(Event::Start(start)).map_err(werr)?;
        write_text(writer, "on", &date.on.to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("date")))
            .map_err(werr)?;
    }
    for link in &record.links {
        write_typed_text(writer, "link", &link.kind, &link.url)?;
    }
    for contributor in &record.contributors {
        write_contributor(writer, contributor)?;
    }
    for note in &record.notes {
        write_typed_text(writer, "note", &note.kind.to_string(), &note.content)?;
    }
    for relation in &record.relations {
        let mut start = BytesStart::new("relation");
        start.push_attribute(("type", relation.kind.as_str()));
        writer.write_event(Event::Start(start)).map_err(werr)?;
        if let Some(description) = &relation.description {
            write_text(writer, "description", description)?;
        }
        write_record(writer, "bibitem", &relation.record)?;
        writer
            .write_event(Event::End(BytesEnd::new("relation")))
            .map_err(werr)?;
    }
    write_ext(writer, record)?;

    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(werr)?;
    Ok(())
}

fn write_contributor<W: Write>(
    writer: &mut Writer<W>,
    contributor: &Contributor,
) -> Result<(), XmlError> {
    writer
        .write_event(Event::Start(BytesStart::new("contributor")))
        .map_err(werr)?;
    for role in &contributor.roles {
        let mut el = BytesStart::new("role");
        el.push_attribute(("type", role.as_str()));
        writer.write_event(Event::Empty(el)).map_err(werr)?;
    }
    match &contributor.entity {
        Entity::Organization(org) => write_organization(writer, org)?,
        Entity::Person(person) => {
            writer
                .write_event(Event::Start(BytesStart::new("person")))
                .map_err(werr)?;
            write_text(writer, "name", &person.name)?;
            for affiliation in &person.affiliations {
                writer
                    .write_event(Event::Start(BytesStart::new("affiliation")))
                    .map_err(werr)?;
                write_organization(writer, affiliation)?;
                writer
                    .write_event(Event::End(BytesEnd::new("affiliation")))
                    .map_err(werr)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("person")))
                .map_err(werr)?;
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new("contributor")))
        .map_err(werr)?;
    Ok(())
}

fn write_organization<W: Write>(
    writer: &mut Writer<W>,
    org: &Organization,
) -> Result<(), XmlError> {
    writer
        .write_event(Event::Start(BytesStart::new("organization")))
        .map_err(werr)?;
    write_text(writer, "name", &org.name)?;
    if let Some(abbreviation) = &org.abbreviation {
        write_text(writer, "abbreviation", abbreviation)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("organization")))
        .map_err(werr)?;
    Ok(())
}

fn write_ext<W: Write>(
    writer: &mut Writer<W>,
    record: &BibliographicRecord,
) -> Result<(), XmlError> {
    let has_ext = record.doctype.is_some()
        || !record.editorial_group.is_empty()
        || record.radio_technology.is_some()
        || record.common_ims_spec
        || record.release.is_some();
    if !has_ext {
        return Ok(());
    }

    writer
        .write_event(Event::Start(BytesStart::new("ext")))
        .map_err(werr)?;
    if let Some(doctype) = &record.doctype {
        write_text(writer, "doctype", doctype)?;
    }
    if !record.editorial_group.is_empty() {
        writer
            .write_event(Event::Start(BytesStart::new("editorialgroup")))
            .map_err(werr)?;
        for group in &record.editorial_group {
            write_typed_text(
                writer,
                "technical-committee",
                &group.kind.to_string(),
                &group.name,
            )?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("editorialgroup")))
            .map_err(werr)?;
    }
    if let Some(tech) = &record.radio_technology {
        write_text(writer, "radiotechnology", &tech.to_string())?;
    }
    if record.common_ims_spec {
        write_text(writer, "common-ims-spec", "true")?;
    }
    if let Some(release) = &record.release {
        write_release(writer, release)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("ext")))
        .map_err(werr)?;
    Ok(())
}

fn write_release<W: Write>(writer: &mut Writer<W>, release: &Release) -> Result<(), XmlError> {
    writer
        .write_event(Event::Start(BytesStart::new("release")))
        .map_err(werr)?;
    write_opt_text(writer, "version2G", &release.version2g)?;
    write_opt_text(writer, "version3G", &release.version3g)?;
    if release.defunct {
        write_text(writer, "defunct", "true")?;
    }
    write_opt_text(writer, "wpm-code-2G", &release.wpm_code_2g)?;
    write_opt_text(writer, "wpm-code-3G", &release.wpm_code_3g)?;
    write_opt_text(writer, "freeze-meeting", &release.freeze_meeting)?;
    write_opt_text(writer, "freeze-stage1-meeting", &release.freeze_stage1_meeting)?;
    write_opt_text(writer, "freeze-stage2-meeting", &release.freeze_stage2_meeting)?;
    write_opt_text(writer, "freeze-stage3-meeting", &release.freeze_stage3_meeting)?;
    write_opt_text(writer, "close-meeting", &release.close_meeting)?;
    if let Some(start) = &release.project_start {
        write_text(writer, "project-start", &start.to_string())?;
    }
    if let Some(end) = &release.project_end {
        write_text(writer, "project-end", &end.to_string())?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("release")))
        .map_err(werr)?;
    Ok(())
}

fn write_opt_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &Option<String>,
) -> Result<(), XmlError> {
    if let Some(value) = value {
        write_text(writer, tag, value)?;
    }
    Ok(())
}

fn write_text<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<(), XmlError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(werr)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(werr)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(werr)?;
    Ok(())
}

fn write_typed_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    kind: &str,
    text: &str,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(tag);
    start.push_attribute(("type", kind));
    writer.write_event(Event::Start(start)).map_err(werr)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(werr)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(werr)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

pub fn from_str(xml: &str) -> Result<BibliographicRecord, XmlError> {
    let root = parse_tree(xml)?;
    if root.name != "bibdata" {
        return Err(XmlError::Malformed(format!(
            "expected <bibdata> root, found <{}>",
            root.name
        )));
    }
    record_from_element(&root)
}

/// Lightweight element tree; the grammar is small enough that building the
/// tree and mapping it afterwards beats threading reader state around.
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<String> {
        let text = self.child(name)?.text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

fn parse_tree(xml: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<Element> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(element_from(e)),
            Ok(Event::Empty(ref e)) => {
                let element = element_from(e);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text
                        .push_str(&unescape_text(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Parse("unbalanced closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::Eof) => {
                return Err(XmlError::Parse("unexpected end of document".into()));
            }
            Ok(_) => {}
            Err(e) => return Err(XmlError::Parse(e.to_string())),
        }
        buf.clear();
    }
}

fn element_from(e: &BytesStart) -> Element {
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).to_string(),
            unescape_text(&String::from_utf8_lossy(&attr.value)),
        ));
    }
    Element {
        name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
        attrs,
        text: String::new(),
        children: Vec::new(),
    }
}

/// Resolve the five predefined entities. The writer escapes nothing else.
fn unescape_text(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn record_from_element(el: &Element) -> Result<BibliographicRecord, XmlError> {
    let mut record = BibliographicRecord {
        docnumber: el.child_text("docnumber").unwrap_or_default(),
        title: el.child_text("title"),
        abstract_text: el.child_text("abstract"),
        ..BibliographicRecord::default()
    };

    if let Some(fetched) = el.child_text("fetched") {
        record.fetched = Some(parse_date(&fetched)?);
    }
    if let Some(stage) = el.child("status").and_then(|s| s.child_text("stage")) {
        record.status = Some(DocStatus {
            stage: stage.parse().map_err(XmlError::Malformed)?,
        });
    }
    for docid in el.children_named("docidentifier") {
        record.docid.push(DocIdentifier {
            scheme: docid.attr("type").unwrap_or_default().to_string(),
            id: docid.text.trim().to_string(),
        });
    }
    for date in el.children_named("date") {
        let kind = date
            .attr("type")
            .ok_or_else(|| XmlError::Malformed("<date> without type".into()))?
            .parse()
            .map_err(XmlError::Malformed)?;
        let on = date
            .child_text("on")
            .ok_or_else(|| XmlError::Malformed("<date> without <on>".into()))?;
        record.dates.push(BibDate {
            kind,
            on: parse_date(&on)?,
        });
    }
    for link in el.children_named("link") {
        record.links.push(TypedLink {
            kind: link.attr("type").unwrap_or("src").to_string(),
            url: link.text.trim().to_string(),
        });
    }
    for contributor in el.children_named("contributor") {
        record.contributors.push(contributor_from_element(contributor)?);
    }
    for note in el.children_named("note") {
        record.notes.push(BiblioNote {
            kind: note
                .attr("type")
                .ok_or_else(|| XmlError::Malformed("<note> without type".into()))?
                .parse()
                .map_err(XmlError::Malformed)?,
            content: note.text.trim().to_string(),
        });
    }
    for relation in el.children_named("relation") {
        let related = relation
            .child("bibitem")
            .ok_or_else(|| XmlError::Malformed("<relation> without <bibitem>".into()))?;
        record.relations.push(Relation {
            kind: relation.attr("type").unwrap_or_default().to_string(),
            record: Box::new(record_from_element(related)?),
            description: relation.child_text("description"),
        });
    }
    if let Some(ext) = el.child("ext") {
        read_ext(ext, &mut record)?;
    }

    Ok(record)
}

fn contributor_from_element(el: &Element) -> Result<Contributor, XmlError> {
    let roles = el
        .children_named("role")
        .filter_map(|role| role.attr("type"))
        .map(str::to_string)
        .collect();

    let entity = if let Some(org) = el.child("organization") {
        Entity::Organization(organization_from_element(org)?)
    } else if let Some(person) = el.child("person") {
        let mut affiliations = Vec::new();
        for affiliation in person.children_named("affiliation") {
            let org = affiliation.child("organization").ok_or_else(|| {
                XmlError::Malformed("<affiliation> without <organization>".into())
            })?;
            affiliations.push(organization_from_element(org)?);
        }
        Entity::Person(Person {
            name: person
                .child_text("name")
                .ok_or_else(|| XmlError::Malformed("<person> without <name>".into()))?,
            affiliations,
        })
    } else {
        return Err(XmlError::Malformed(
            "<contributor> without <organization> or <person>".into(),
        ));
    };

    Ok(Contributor { entity, roles })
}

fn organization_from_element(el: &Element) -> Result<Organization, XmlError> {
    Ok(Organization {
        name: el
            .child_text("name")
            .ok_or_else(|| XmlError::Malformed("<organization> without <name>".into()))?,
        abbreviation: el.child_text("abbreviation"),
    })
}

fn read_ext(ext: &Element, record: &mut BibliographicRecord) -> Result<(), XmlError> {
    record.doctype = ext.child_text("doctype");
    if let Some(groups) = ext.child("editorialgroup") {
        for committee in groups.children_named("technical-committee") {
            record.editorial_group.push(WorkGroup {
                name: committee.text.trim().to_string(),
                kind: committee
                    .attr("type")
                    .ok_or_else(|| {
                        XmlError::Malformed("<technical-committee> without type".into())
                    })?
                    .parse()
                    .map_err(XmlError::Malformed)?,
            });
        }
    }
    if let Some(tech) = ext.child_text("radiotechnology") {
        record.radio_technology = Some(tech.parse().map_err(XmlError::Malformed)?);
    }
    record.common_ims_spec = ext.child_text("common-ims-spec").as_deref() == Some("true");
    if let Some(release) = ext.child("release") {
        record.release = Some(release_from_element(release)?);
    }
    Ok(())
}

fn release_from_element(el: &Element) -> Result<Release, XmlError> {
    let mut release = Release {
        version2g: el.child_text("version2G"),
        version3g: el.child_text("version3G"),
        defunct: el.child_text("defunct").as_deref() == Some("true"),
        wpm_code_2g: el.child_text("wpm-code-2G"),
        wpm_code_3g: el.child_text("wpm-code-3G"),
        freeze_meeting: el.child_text("freeze-meeting"),
        freeze_stage1_meeting: el.child_text("freeze-stage1-meeting"),
        freeze_stage2_meeting: el.child_text("freeze-stage2-meeting"),
        freeze_stage3_meeting: el.child_text("freeze-stage3-meeting"),
        close_meeting: el.child_text("close-meeting"),
        ..Release::default()
    };
    if let Some(start) = el.child_text("project-start") {
        release.project_start = Some(parse_date(&start)?);
    }
    if let Some(end) = el.child_text("project-end") {
        release.project_end = Some(parse_date(&end)?);
    }
    Ok(release)
}

fn parse_date(s: &str) -> Result<NaiveDate, XmlError> {
    s.parse()
        .map_err(|_| XmlError::Malformed(format!("cannot parse date '{s}'")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bib3gpp_model::{DateKind, RadioTechnology, Stage, WorkGroupKind};

    fn full_record() -> BibliographicRecord {
        let publisher = Organization {
            name: "3rd Generation Partnership Project".into(),
            abbreviation: Some("3GPP".into()),
        };
        let mut subordinate = BibliographicRecord {
            docnumber: "TS 24.228:REL-5/5.6.0".into(),
            ..BibliographicRecord::default()
        };
        subordinate.dates.push(BibDate {
            kind: DateKind::Created,
            on: NaiveDate::from_ymd_opt(2003, 6, 18).unwrap(),
        });

        BibliographicRecord {
            docnumber: "TS 24.228:REL-5/5.5.0".into(),
            docid: vec![
                DocIdentifier {
                    scheme: "3GPP".into(),
                    id: "3GPP TS 24.228:REL-5/5.5.0".into(),
                },
                DocIdentifier {
                    scheme: "rapporteurId".into(),
                    id: "X0029".into(),
                },
            ],
            title: Some("Signalling flows for the IP multimedia call control".into()),
            abstract_text: Some("Example flows of <session> control & media".into()),
            doctype: Some("TS".into()),
            status: Some(DocStatus {
                stage: Stage::Published,
            }),
            links: vec![TypedLink {
                kind: "src".into(),
                url: "https://www.3gpp.org/ftp/Specs/archive/24_series/24.228/24228-550.zip"
                    .into(),
            }],
            dates: vec![
                BibDate {
                    kind: DateKind::Created,
                    on: NaiveDate::from_ymd_opt(2003, 3, 14).unwrap(),
                },
                BibDate {
                    kind: DateKind::Confirmed,
                    on: NaiveDate::from_ymd_opt(2003, 9, 1).unwrap(),
                },
            ],
            contributors: vec![
                Contributor::organization(publisher.clone(), "publisher"),
                Contributor::person(
                    Person {
                        name: "Jane Doe".into(),
                        affiliations: vec![Organization {
                            name: "ACME Telecom".into(),
                            abbreviation: None,
                        }],
                    },
                    "author",
                ),
            ],
            relations: vec![Relation {
                kind: Relation::ADOPTED_AS.into(),
                record: Box::new(subordinate),
                description: Some("equivalent".into()),
            }],
            editorial_group: vec![
                WorkGroup {
                    name: "C1".into(),
                    kind: WorkGroupKind::Prime,
                },
                WorkGroup {
                    name: "C3".into(),
                    kind: WorkGroupKind::Other,
                },
            ],
            radio_technology: Some(RadioTechnology::G3),
            common_ims_spec: true,
            release: Some(Release {
                version2g: Some("5.x.y".into()),
                freeze_meeting: Some("SP-16".into()),
                project_start: NaiveDate::from_ymd_opt(2000, 12, 15),
                ..Release::default()
            }),
            notes: vec![BiblioNote {
                kind: bib3gpp_model::NoteKind::Remark,
                content: "Moved to CT1 at CN#23".into(),
            }],
            fetched: NaiveDate::from_ymd_opt(2026, 8, 6),
        }
    }

    #[test]
    fn full_record_round_trips() {
        let record = full_record();
        let xml = to_string(&record).unwrap();
        let parsed = from_str(&xml).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn escaped_text_survives_round_trip() {
        let record = full_record();
        let xml = to_string(&record).unwrap();
        assert!(xml.contains("&lt;session&gt; control &amp; media"));
        let parsed = from_str(&xml).unwrap();
        assert_eq!(parsed.abstract_text, record.abstract_text);
    }

    #[test]
    fn minimal_record_round_trips() {
        let record = BibliographicRecord {
            docnumber: "TR 21.900:REL-99/3.0.0".into(),
            ..BibliographicRecord::default()
        };
        let xml = to_string(&record).unwrap();
        assert!(!xml.contains("<ext>"));
        let parsed = from_str(&xml).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn nested_relation_preserves_subordinate_fields() {
        let record = full_record();
        let xml = to_string(&record).unwrap();
        let parsed = from_str(&xml).unwrap();
        let related = &parsed.relations[0].record;
        assert_eq!(related.docnumber, "TS 24.228:REL-5/5.6.0");
        assert_eq!(related.dates.len(), 1);
        assert!(related.relations.is_empty());
    }

    #[test]
    fn rejects_wrong_root() {
        let err = from_str("<other/>").unwrap_err();
        assert!(err.to_string().contains("expected <bibdata>"));
    }

    #[test]
    fn rejects_bad_date() {
        let xml = r#"<bibdata type="standard"><docnumber>x</docnumber><date type="created"><on>not-a-date</on></date></bibdata>"#;
        let err = from_str(xml).unwrap_err();
        assert!(err.to_string().contains("cannot parse date"));
    }

    #[test]
    fn unknown_elements_are_ignored() {
        let xml = r#"<bibdata type="standard"><docnumber>TS 1.2</docnumber><future-field>x</future-field></bibdata>"#;
        let record = from_str(xml).unwrap();
        assert_eq!(record.docnumber, "TS 1.2");
    }
}
