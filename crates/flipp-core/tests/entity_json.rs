//! JSON shape of the entities printed by the CLI.

use chrono::Utc;
use pretty_assertions::assert_eq;

use flipp_core::entities::{Image, Source};
use flipp_core::enums::Passband;

#[test]
fn source_serializes_with_coordinates() {
    let source = Source {
        id: "src-0011223344556677".into(),
        ra: 180.0,
        dec: -1.5,
        name: String::new(),
        classification: String::new(),
        created_at: Utc::now(),
    };
    let value = serde_json::to_value(&source).unwrap();
    assert_eq!(value["ra"], 180.0);
    assert_eq!(value["dec"], -1.5);
    assert_eq!(value["name"], "");

    let back: Source = serde_json::from_value(value).unwrap();
    assert_eq!(back, source);
}

#[test]
fn image_passband_uses_storage_string() {
    let image = Image {
        id: "img-0011223344556677".into(),
        path: "20200102/sn2020abc_20200102.5000_k_clear_cal.fit".into(),
        telescope: "kait".into(),
        passband: Passband::Clear.to_string(),
        mjd: 58850.5,
        created_at: Utc::now(),
    };
    let value = serde_json::to_value(&image).unwrap();
    assert_eq!(value["passband"], "clear");
    assert_eq!(value["telescope"], "kait");
}
