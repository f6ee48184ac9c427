//! Crop regions, their form representation and the bounds policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Form field names of a region, in parse order.
pub const REGION_FIELD_NAMES: [&str; 4] = ["left", "top", "right", "bottom"];

/// A client-requested crop rectangle in pixel space.
///
/// Coordinates are signed: the form parser accepts any integer, and whether
/// the rectangle fits the image is decided separately by [`RegionPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CropRegion {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl CropRegion {
    /// Create a new region.
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The region covering a whole `width`x`height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, i64::from(width), i64::from(height))
    }

    /// Horizontal extent; negative when the region is inverted.
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    /// Vertical extent; negative when the region is inverted.
    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    /// Whether `0 <= left < right <= width` and `0 <= top < bottom <= height`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let (width, height) = (i64::from(width), i64::from(height));
        0 <= self.left
            && self.left < self.right
            && self.right <= width
            && 0 <= self.top
            && self.top < self.bottom
            && self.bottom <= height
    }

    /// Clamp every coordinate into the image extent.
    ///
    /// The result may still be empty or inverted.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let (width, height) = (i64::from(width), i64::from(height));
        Self {
            left: self.left.clamp(0, width),
            top: self.top.clamp(0, height),
            right: self.right.clamp(0, width),
            bottom: self.bottom.clamp(0, height),
        }
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// A region that has been checked against an image: origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Errors raised while turning client input into a usable rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("Invalid value for `{field}`: {value:?}")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("Region {region} does not fit a {width}x{height} image")]
    OutOfBounds {
        region: CropRegion,
        width: u32,
        height: u32,
    },
}

/// What to do with regions that do not fit the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegionPolicy {
    /// Refuse any region outside the image or with no area
    #[default]
    Reject,
    /// Clamp coordinates to the image, refuse only if nothing is left
    Clamp,
}

impl RegionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionPolicy::Reject => "reject",
            RegionPolicy::Clamp => "clamp",
        }
    }

    /// Resolve `region` against a `width`x`height` image.
    ///
    /// Errors carry the region as the client sent it, not the clamped one.
    pub fn apply(self, region: CropRegion, width: u32, height: u32) -> Result<PixelRect, RegionError> {
        let candidate = match self {
            RegionPolicy::Reject => region,
            RegionPolicy::Clamp => region.clamped(width, height),
        };

        let out_of_bounds = || RegionError::OutOfBounds {
            region,
            width,
            height,
        };

        if !candidate.fits_within(width, height) {
            return Err(out_of_bounds());
        }

        let to_u32 = |value: i64| u32::try_from(value).map_err(|_| out_of_bounds());
        Ok(PixelRect {
            x: to_u32(candidate.left)?,
            y: to_u32(candidate.top)?,
            width: to_u32(candidate.width())?,
            height: to_u32(candidate.height())?,
        })
    }
}

impl fmt::Display for RegionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegionPolicy {
    type Err = RegionPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(RegionPolicy::Reject),
            "clamp" => Ok(RegionPolicy::Clamp),
            _ => Err(RegionPolicyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown region policy: {0}")]
pub struct RegionPolicyParseError(String);

/// Region fields exactly as they arrived in the form, not yet parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFields {
    pub left: Option<String>,
    pub top: Option<String>,
    pub right: Option<String>,
    pub bottom: Option<String>,
}

impl RegionFields {
    /// Record a form field if `name` is one of the region fields.
    ///
    /// The first value wins when a field is repeated. Returns whether the
    /// name was recognised.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            "left" => &mut self.left,
            "top" => &mut self.top,
            "right" => &mut self.right,
            "bottom" => &mut self.bottom,
            _ => return false,
        };
        if slot.is_none() {
            *slot = Some(value.into());
        }
        true
    }

    /// Parse into a region.
    ///
    /// Absent fields default to the full extent (`0, 0, width, height`).
    /// Present fields must be base-10 integers; an empty string counts as
    /// present. Geometry is not checked here.
    pub fn parse(&self, default_width: u32, default_height: u32) -> Result<CropRegion, RegionError> {
        Ok(CropRegion {
            left: parse_coordinate("left", self.left.as_deref(), 0)?,
            top: parse_coordinate("top", self.top.as_deref(), 0)?,
            right: parse_coordinate("right", self.right.as_deref(), i64::from(default_width))?,
            bottom: parse_coordinate("bottom", self.bottom.as_deref(), i64::from(default_height))?,
        })
    }
}

fn parse_coordinate(field: &'static str, raw: Option<&str>, default: i64) -> Result<i64, RegionError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| RegionError::InvalidCoordinate {
                field,
                value: value.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(left: &str, top: &str, right: &str, bottom: &str) -> RegionFields {
        let mut fields = RegionFields::default();
        for (name, value) in REGION_FIELD_NAMES.iter().zip([left, top, right, bottom]) {
            fields.set(name, value);
        }
        fields
    }

    #[test]
    fn test_absent_fields_default_to_full_image() {
        let region = RegionFields::default().parse(640, 480).unwrap();
        assert_eq!(region, CropRegion::full(640, 480));
    }

    #[test]
    fn test_partial_fields_mix_with_defaults() {
        let mut f = RegionFields::default();
        f.set("left", "10");
        f.set("bottom", "200");
        let region = f.parse(640, 480).unwrap();
        assert_eq!(region, CropRegion::new(10, 0, 640, 200));
    }

    #[test]
    fn test_whitespace_and_sign_are_accepted() {
        let region = fields(" 10", "+5", "50 ", "-1").parse(100, 100).unwrap();
        assert_eq!(region, CropRegion::new(10, 5, 50, -1));
    }

    #[test]
    fn test_non_integer_is_rejected() {
        let err = fields("abc", "0", "10", "10").parse(100, 100).unwrap_err();
        assert_eq!(
            err,
            RegionError::InvalidCoordinate {
                field: "left",
                value: "abc".to_string()
            }
        );

        assert!(fields("0", "1.5", "10", "10").parse(100, 100).is_err());
        assert!(fields("0", "0", "", "10").parse(100, 100).is_err());
    }

    #[test]
    fn test_parser_passes_bad_geometry_through() {
        let region = fields("50", "50", "10", "10").parse(20, 20).unwrap();
        assert_eq!(region, CropRegion::new(50, 50, 10, 10));
    }

    #[test]
    fn test_first_value_wins_and_unknown_names_ignored() {
        let mut f = RegionFields::default();
        assert!(f.set("left", "1"));
        assert!(f.set("left", "2"));
        assert!(!f.set("file", "x"));
        assert_eq!(f.left.as_deref(), Some("1"));
        assert_eq!(f.top, None);
    }

    #[test]
    fn test_reject_policy() {
        let policy = RegionPolicy::Reject;
        assert_eq!(
            policy.apply(CropRegion::new(10, 10, 50, 50), 100, 100).unwrap(),
            PixelRect { x: 10, y: 10, width: 40, height: 40 }
        );
        assert!(policy.apply(CropRegion::new(-1, 0, 50, 50), 100, 100).is_err());
        assert!(policy.apply(CropRegion::new(0, 0, 101, 50), 100, 100).is_err());
        assert!(policy.apply(CropRegion::new(20, 0, 20, 50), 100, 100).is_err());
        assert!(policy.apply(CropRegion::new(30, 0, 20, 50), 100, 100).is_err());
    }

    #[test]
    fn test_clamp_policy() {
        let policy = RegionPolicy::Clamp;
        assert_eq!(
            policy.apply(CropRegion::new(-20, -5, 500, 60), 100, 80).unwrap(),
            PixelRect { x: 0, y: 0, width: 100, height: 60 }
        );

        let err = policy.apply(CropRegion::new(150, 0, 200, 10), 100, 80).unwrap_err();
        assert_eq!(
            err,
            RegionError::OutOfBounds {
                region: CropRegion::new(150, 0, 200, 10),
                width: 100,
                height: 80
            }
        );
    }

    #[test]
    fn test_full_region_fits() {
        assert!(CropRegion::full(1, 1).fits_within(1, 1));
        assert!(!CropRegion::full(0, 0).fits_within(0, 0));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("reject".parse::<RegionPolicy>().unwrap(), RegionPolicy::Reject);
        assert_eq!(" Clamp ".parse::<RegionPolicy>().unwrap(), RegionPolicy::Clamp);
        assert!("stretch".parse::<RegionPolicy>().is_err());
        assert_eq!(RegionPolicy::default(), RegionPolicy::Reject);
    }
}
