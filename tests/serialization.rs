//! Properties that hold for both wire formats.

use chrono::NaiveDate;
use redmine_client::serialization::{JsonSerializer, XmlSerializer};
use redmine_client::{
    Entity, Error, Format, IdentifiableName, Issue, IssueCategory, IssueCustomField, Project,
    RedmineSerializer, TimeEntry, Upload, User,
};

const FORMATS: [Format; 2] = [Format::Xml, Format::Json];

fn round_trip<T: Entity + PartialEq + std::fmt::Debug>(entity: &T) {
    for format in FORMATS {
        let payload = format.serialize(entity).unwrap();
        let back: T = format
            .deserialize(&payload)
            .unwrap_or_else(|e| panic!("{format}: {e}\n{payload}"));
        assert_eq!(&back, entity, "{format} round trip of {payload}");
    }
}

fn sample_issue() -> Issue {
    Issue {
        project: Some(IdentifiableName::new(1)),
        tracker: Some(IdentifiableName::new(2)),
        priority: Some(IdentifiableName::new(4)),
        parent: Some(IdentifiableName::new(40)),
        subject: "Ünïcode & <markup> survive".to_string(),
        description: Some("line one\nline two".to_string()),
        start_date: NaiveDate::from_ymd_opt(2024, 2, 29),
        done_ratio: Some(30),
        estimated_hours: Some(1.25),
        is_private: Some(false),
        custom_fields: vec![
            IssueCustomField::single(1, "prod"),
            IssueCustomField::multiple(2, ["1.0", "1.1"]),
            IssueCustomField::multiple(3, Vec::<String>::new()),
        ],
        uploads: vec![Upload {
            content_type: Some("text/plain".to_string()),
            ..Upload::attach("7.abc", "notes.txt")
        }],
        ..Issue::default()
    }
}

#[test]
fn test_entities_round_trip_in_both_formats() {
    round_trip(&sample_issue());

    round_trip(&Project {
        name: "Core".to_string(),
        identifier: "core".to_string(),
        description: Some("Main project".to_string()),
        is_public: Some(true),
        parent: Some(IdentifiableName::new(3)),
        custom_fields: vec![IssueCustomField::single(9, "internal")],
        ..Project::default()
    });

    round_trip(&User {
        login: "jsmith".to_string(),
        firstname: "John".to_string(),
        lastname: "Smith".to_string(),
        mail: "jsmith@example.com".to_string(),
        admin: Some(false),
        ..User::default()
    });

    round_trip(&TimeEntry {
        issue: Some(IdentifiableName::new(42)),
        activity: Some(IdentifiableName::new(9)),
        hours: 1.5,
        comments: Some("Review".to_string()),
        spent_on: NaiveDate::from_ymd_opt(2024, 1, 31),
        ..TimeEntry::default()
    });

    round_trip(&IssueCategory {
        name: "UI".to_string(),
        assigned_to: Some(IdentifiableName::new(5)),
        ..IssueCategory::default()
    });
}

#[test]
fn test_server_assigned_fields_are_not_written() {
    let issue = Issue {
        id: Some(1),
        author: Some(IdentifiableName::named(2, "Admin")),
        subject: "s".to_string(),
        ..Issue::default()
    };

    for format in FORMATS {
        let payload = format.serialize(&issue).unwrap();
        assert!(!payload.contains("author"), "{format}: {payload}");
        assert!(!payload.contains("\"id\""), "{format}: {payload}");
        assert!(!payload.contains("<id>"), "{format}: {payload}");
    }
}

#[test]
fn test_xml_has_single_root_and_no_declaration() {
    let payload = XmlSerializer.serialize(&sample_issue()).unwrap();

    assert!(payload.starts_with("<issue>"));
    assert!(payload.ends_with("</issue>"));
    assert!(!payload.contains("<?xml"));
}

#[test]
fn test_count_agrees_with_paged_total() {
    let payloads = [
        (
            Format::Json,
            r#"{"issues":[{"id":1},{"id":2}],"total_count":40,"offset":0,"limit":2}"#,
        ),
        (
            Format::Json,
            r#"{"issues":[{"id":1},{"id":2},{"id":3}],"total_count":0}"#,
        ),
        (Format::Json, r#"{"issues":[]}"#),
        (
            Format::Xml,
            r#"<issues type="array" total_count="40" offset="0" limit="2"><issue><id>1</id></issue><issue><id>2</id></issue></issues>"#,
        ),
        (
            Format::Xml,
            r#"<issues type="array"><issue><id>1</id></issue><issue><id>2</id></issue><issue><id>3</id></issue></issues>"#,
        ),
        (Format::Xml, r#"<issues type="array"/>"#),
    ];

    for (format, payload) in payloads {
        let page = format.deserialize_paged::<Issue>(payload).unwrap();
        let count = format.count::<Issue>(payload).unwrap();
        assert_eq!(count, page.total_count, "{format}: {payload}");
    }
}

#[test]
fn test_zero_total_count_is_backfilled() {
    let json = JsonSerializer
        .deserialize_paged::<Issue>(r#"{"issues":[{"id":1},{"id":2},{"id":3}],"total_count":0}"#)
        .unwrap();
    assert_eq!(json.total_count, 3);

    let xml = XmlSerializer
        .deserialize_paged::<Issue>(
            r#"<issues total_count="0"><issue><id>1</id></issue><issue><id>2</id></issue><issue><id>3</id></issue></issues>"#,
        )
        .unwrap();
    assert_eq!(xml.total_count, 3);
}

#[test]
fn test_custom_field_arity_on_the_wire() {
    let issue = Issue {
        subject: "s".to_string(),
        custom_fields: vec![
            IssueCustomField::single(1, "a"),
            IssueCustomField::multiple(2, ["b", "c"]),
        ],
        ..Issue::default()
    };

    let json = JsonSerializer.serialize(&issue).unwrap();
    assert!(json.contains(r#"{"id":1,"value":"a"}"#), "{json}");
    assert!(json.contains(r#"{"id":2,"multiple":true,"value":["b","c"]}"#), "{json}");

    let xml = XmlSerializer.serialize(&issue).unwrap();
    assert!(
        xml.contains(r#"<custom_field id="1"><value>a</value></custom_field>"#),
        "{xml}"
    );
    assert!(
        xml.contains(r#"<value type="array"><value>b</value><value>c</value></value>"#),
        "{xml}"
    );
}

#[test]
fn test_malformed_payloads_are_deserialization_errors() {
    let cases = [
        (Format::Json, r#"{"issue": {"id": "#),
        (Format::Xml, "<issue><id>1</id>"),
        (Format::Xml, ""),
        (Format::Xml, "<project><id>1</id></project>"),
    ];

    for (format, payload) in cases {
        match format.deserialize::<Issue>(payload) {
            Err(Error::Deserialization { format: name, .. }) => {
                assert_eq!(name, format.to_string())
            }
            other => panic!("{format} {payload:?}: expected Deserialization, got {other:?}"),
        }
    }
}

#[test]
fn test_empty_json_payload_yields_default() {
    assert_eq!(JsonSerializer.deserialize::<Issue>("").unwrap(), Issue::default());
    assert_eq!(
        JsonSerializer.deserialize::<Issue>(r#"{"unrelated": 1}"#).unwrap(),
        Issue::default()
    );
}
