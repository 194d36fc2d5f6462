//! BibXML citation rendering (xml2rfc `<reference>` grammar).
//!
//! Write-only: the citation grammar has no place for relations or
//! affiliations, so citation files are never read back (see `Store::load`).

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use bib3gpp_model::{BibliographicRecord, Entity};

use crate::xml::XmlError;

pub fn to_string(record: &BibliographicRecord) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut reference = BytesStart::new("reference");
    reference.push_attribute(("anchor", record.output_key().as_str()));
    if let Some(link) = record.links.first() {
        reference.push_attribute(("target", link.url.as_str()));
    }
    writer.write_event(Event::Start(reference)).map_err(err)?;

    write_front(&mut writer, record)?;

    let mut series = BytesStart::new("seriesInfo");
    series.push_attribute(("name", "3GPP"));
    series.push_attribute(("value", record.docnumber.as_str()));
    writer.write_event(Event::Empty(series)).map_err(err)?;

    for link in &record.links {
        let mut format = BytesStart::new("format");
        format.push_attribute(("type", "HTML"));
        format.push_attribute(("target", link.url.as_str()));
        writer.write_event(Event::Empty(format)).map_err(err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("reference")))
        .map_err(err)?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
}

fn write_front(
    writer: &mut Writer<Vec<u8>>,
    record: &BibliographicRecord,
) -> Result<(), XmlError> {
    writer
        .write_event(Event::Start(BytesStart::new("front")))
        .map_err(err)?;

    writer
        .write_event(Event::Start(BytesStart::new("title")))
        .map_err(err)?;
    let title = record.title.as_deref().unwrap_or(&record.docnumber);
    writer
        .write_event(Event::Text(BytesText::new(title)))
        .map_err(err)?;
    writer
        .write_event(Event::End(BytesEnd::new("title")))
        .map_err(err)?;

    for contributor in &record.contributors {
        match &contributor.entity {
            Entity::Organization(org) => {
                writer
                    .write_event(Event::Start(BytesStart::new("author")))
                    .map_err(err)?;
                let mut el = BytesStart::new("organization");
                if let Some(abbreviation) = &org.abbreviation {
                    el.push_attribute(("abbrev", abbreviation.as_str()));
                }
                writer.write_event(Event::Start(el)).map_err(err)?;
                writer
                    .write_event(Event::Text(BytesText::new(&org.name)))
                    .map_err(err)?;
                writer
                    .write_event(Event::End(BytesEnd::new("organization")))
                    .map_err(err)?;
                writer
                    .write_event(Event::End(BytesEnd::new("author")))
                    .map_err(err)?;
            }
            Entity::Person(person) => {
                let mut el = BytesStart::new("author");
                el.push_attribute(("fullname", person.name.as_str()));
                writer.write_event(Event::Empty(el)).map_err(err)?;
            }
        }
    }

    if let Some(date) = record.dates.first() {
        let mut el = BytesStart::new("date");
        el.push_attribute(("day", date.on.format("%-d").to_string().as_str()));
        el.push_attribute(("month", date.on.format("%B").to_string().as_str()));
        el.push_attribute(("year", date.on.format("%Y").to_string().as_str()));
        writer.write_event(Event::Empty(el)).map_err(err)?;
    }

    if let Some(abstract_text) = &record.abstract_text {
        writer
            .write_event(Event::Start(BytesStart::new("abstract")))
            .map_err(err)?;
        writer
            .write_event(Event::Start(BytesStart::new("t")))
            .map_err(err)?;
        writer
            .write_event(Event::Text(BytesText::new(abstract_text)))
            .map_err(err)?;
        writer
            .write_event(Event::End(BytesEnd::new("t")))
            .map_err(err)?;
        writer
            .write_event(Event::End(BytesEnd::new("abstract")))
            .map_err(err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("front")))
        .map_err(err)?;
    Ok(())
}

fn err<E: std::fmt::Display>(e: E) -> XmlError {
    XmlError::Write(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bib3gpp_model::{
        BibDate, Contributor, DateKind, Organization, Person, TypedLink,
    };
    use chrono::NaiveDate;

    #[test]
    fn renders_reference_with_series_and_date() {
        let record = BibliographicRecord {
            docnumber: "TS 24.228:REL-5/5.5.0".into(),
            title: Some("Signalling flows".into()),
            dates: vec![BibDate {
                kind: DateKind::Created,
                on: NaiveDate::from_ymd_opt(2003, 3, 14).unwrap(),
            }],
            contributors: vec![
                Contributor::organization(
                    Organization {
                        name: "3rd Generation Partnership Project".into(),
                        abbreviation: Some("3GPP".into()),
                    },
                    "publisher",
                ),
                Contributor::person(
                    Person {
                        name: "Jane Doe".into(),
                        affiliations: vec![],
                    },
                    "author",
                ),
            ],
            links: vec![TypedLink {
                kind: "src".into(),
                url: "https://example.com/24228-550.zip".into(),
            }],
            ..BibliographicRecord::default()
        };

        let xml = to_string(&record).unwrap();
        assert!(xml.contains(r#"<reference anchor="TS_24.228_REL-5_5.5.0""#));
        assert!(xml.contains("<title>Signalling flows</title>"));
        assert!(xml.contains(r#"abbrev="3GPP""#));
        assert!(xml.contains(r#"<author fullname="Jane Doe"/>"#));
        assert!(xml.contains(r#"<date day="14" month="March" year="2003"/>"#));
        assert!(xml.contains(r#"<seriesInfo name="3GPP" value="TS 24.228:REL-5/5.5.0"/>"#));
        assert!(xml.contains(r#"target="https://example.com/24228-550.zip""#));
    }

    #[test]
    fn untitled_record_falls_back_to_docnumber() {
        let record = BibliographicRecord {
            docnumber: "TR 21.900:REL-99/3.0.0".into(),
            ..BibliographicRecord::default()
        };
        let xml = to_string(&record).unwrap();
        assert!(xml.contains("<title>TR 21.900:REL-99/3.0.0</title>"));
    }
}
