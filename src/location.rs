use std::{collections::BTreeMap, fmt::Display, num::ParseFloatError, str::FromStr};

/// Article titles mapped to the location they should be tagged with.
pub type Locations = BTreeMap<String, Location>;

/// A point in decimal degrees.
///
/// Parsed from the KML coordinate order `lon,lat[,alt]`; the altitude is checked but dropped.
///
/// ```
/// use std::str::FromStr;
/// use coordbot::Location;
///
/// let loc = Location::from_str("-0.1,51.5").unwrap();
/// assert_eq!(loc, Location::new(51.5, -0.1));
///
/// let with_alt = Location::from_str(" -0.1, 51.5 ,12 ").unwrap();
/// assert_eq!(loc, with_alt);
///
/// assert!(Location::from_str("51.5").is_err());
/// assert!(Location::from_str("a,b").is_err());
/// assert!(Location::from_str("1,2,3,4").is_err());
/// assert!(Location::from_str("").is_err());
/// assert!(Location::from_str("10,200").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

impl Location {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} N, {} E", self.latitude, self.longitude)
    }
}

impl FromStr for Location {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(',').map(str::trim).collect();
        let (lon, lat) = match fields.as_slice() {
            [lon, lat] => (lon, lat),
            [lon, lat, alt] => {
                let altitude = f64::from_str(alt).map_err(ParseLocationError::Altitude)?;
                check_range("altitude", altitude, f64::MAX)?;
                (lon, lat)
            }
            _ => return Err(ParseLocationError::FieldCount(fields.len())),
        };

        let longitude = f64::from_str(lon).map_err(ParseLocationError::Longitude)?;
        let latitude = f64::from_str(lat).map_err(ParseLocationError::Latitude)?;
        check_range("longitude", longitude, 180.0)?;
        check_range("latitude", latitude, 90.0)?;

        Ok(Self::new(latitude, longitude))
    }
}

/// `f64::from_str` also accepts `NaN` and `inf`.
fn check_range(field: &'static str, value: f64, bound: f64) -> Result<(), ParseLocationError> {
    if value.is_finite() && value.abs() <= bound {
        Ok(())
    } else {
        Err(ParseLocationError::OutOfRange {
            field,
            value: value.to_string(),
        })
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseLocationError {
    #[error("expected `lon,lat[,alt]`, found {0} fields")]
    FieldCount(usize),
    #[error("invalid longitude")]
    Longitude(#[source] ParseFloatError),
    #[error("invalid latitude")]
    Latitude(#[source] ParseFloatError),
    #[error("invalid altitude")]
    Altitude(#[source] ParseFloatError),
    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: String },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn latitude_is_second_field() {
        let loc: Location = "151.2093,-33.8688,0".parse().unwrap();
        assert_eq!(loc.latitude(), -33.8688);
        assert_eq!(loc.longitude(), 151.2093);
    }

    #[test]
    fn reports_failing_field() {
        assert!(matches!(
            "x,1".parse::<Location>(),
            Err(ParseLocationError::Longitude(_))
        ));
        assert!(matches!(
            "1,".parse::<Location>(),
            Err(ParseLocationError::Latitude(_))
        ));
        assert!(matches!(
            "1,2,high".parse::<Location>(),
            Err(ParseLocationError::Altitude(_))
        ));
    }

    #[test]
    fn rejects_non_finite_and_out_of_range() {
        for (text, field) in [
            ("NaN,1", "longitude"),
            ("1,inf", "latitude"),
            ("-infinity,1", "longitude"),
            ("10,200", "latitude"),
            ("180.5,0", "longitude"),
            ("1,2,NaN", "altitude"),
        ] {
            assert!(
                matches!(
                    text.parse::<Location>(),
                    Err(ParseLocationError::OutOfRange { field: f, .. }) if f == field
                ),
                "{text}"
            );
        }
        assert_eq!(
            "-180,90".parse::<Location>(),
            Ok(Location::new(90.0, -180.0))
        );
    }

    #[test]
    fn display_matches_console_format() {
        assert_eq!(Location::new(51.5, -0.1).to_string(), "51.5 N, -0.1 E");
    }
}
