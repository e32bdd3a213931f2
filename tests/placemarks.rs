use coordbot::{
    kml::{parse_kml_file, ParseError},
    Location,
};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/placemarks.kml");

#[test]
fn sample_file() {
    let locations = parse_kml_file(SAMPLE).unwrap();

    let titles: Vec<_> = locations.keys().map(String::as_str).collect();
    assert_eq!(
        titles,
        vec![
            "St Mary & St Nicholas Church",
            "Sydney Opera House",
            "Tower Bridge"
        ]
    );
    assert_eq!(
        locations["Tower Bridge"],
        Location::new(51.505456, -0.075417)
    );
    assert_eq!(
        locations["Sydney Opera House"],
        Location::new(-33.856784, 151.215256)
    );
}

#[test]
fn missing_file() {
    let err = parse_kml_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/nope.kml"))
        .unwrap_err();
    assert!(matches!(err, ParseError::Open { .. }));
}
