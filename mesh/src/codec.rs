//! Out-of-band codecs: the layout-descriptor string whose hash selects the
//! session channel, and the screen-position boot override.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point, Rect};
use crate::layout::{Layout, LayoutError, Screen};

/// Prefix of an encoded layout descriptor.
const LAYOUT_PREFIX: &str = "vfl1.";

/// Prefix of an encoded screen-position override.
const POSITION_PREFIX: &str = "pos1.";

/// Errors that can occur while decoding boot-configuration strings
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input does not start with the expected prefix
    #[error("Missing `{expected}` prefix")]
    MissingPrefix { expected: &'static str },

    /// Percent-decoding failed
    #[error("Payload is not valid percent-encoded UTF-8")]
    UrlDecode,

    /// JSON payload did not match the schema
    #[error("Payload failed schema validation: {0}")]
    Schema(#[from] serde_json::Error),

    /// Decoded layout violated a layout invariant
    #[error("Decoded layout is invalid: {0}")]
    InvalidLayout(#[from] LayoutError),

    /// Screen position was not one of the accepted encodings
    #[error("Unrecognized screen position encoding")]
    InvalidPosition,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorRect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorScreen {
    id: String,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scale: Option<f64>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Descriptor {
    v: u32,
    frame: DescriptorRect,
    screens: Vec<DescriptorScreen>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PositionPayload {
    x: f64,
    y: f64,
}

/// Renders a layout as `vfl1.<urlencoded-JSON>`.
pub fn encode_layout(layout: &Layout) -> Result<String, CodecError> {
    let descriptor = Descriptor {
        v: layout.version,
        frame: DescriptorRect {
            x: layout.frame.x,
            y: layout.frame.y,
            w: layout.frame.w,
            h: layout.frame.h,
        },
        screens: layout
            .screens
            .iter()
            .map(|s| DescriptorScreen {
                id: s.id.clone(),
                x: s.rect.x,
                y: s.rect.y,
                w: s.rect.w,
                h: s.rect.h,
                scale: s.scale,
            })
            .collect(),
    };
    let json = serde_json::to_string(&descriptor)?;
    Ok(format!("{}{}", LAYOUT_PREFIX, urlencoding::encode(&json)))
}

/// Parses a `vfl1.` descriptor. Strict: a wrong prefix, malformed payload,
/// or a layout that fails validation all error.
pub fn decode_layout(input: &str) -> Result<Layout, CodecError> {
    let payload = input
        .strip_prefix(LAYOUT_PREFIX)
        .ok_or(CodecError::MissingPrefix {
            expected: LAYOUT_PREFIX,
        })?;
    let json = urlencoding::decode(payload).map_err(|_| CodecError::UrlDecode)?;
    let descriptor: Descriptor = serde_json::from_str(&json)?;
    let layout = Layout {
        version: descriptor.v,
        frame: Rect::new(
            descriptor.frame.x,
            descriptor.frame.y,
            descriptor.frame.w,
            descriptor.frame.h,
        ),
        screens: descriptor
            .screens
            .into_iter()
            .map(|s| Screen {
                id: s.id,
                rect: Rect::new(s.x, s.y, s.w, s.h),
                scale: s.scale,
            })
            .collect(),
    };
    layout.validate()?;
    Ok(layout)
}

/// Renders a screen-position override as `pos1.<urlencoded-JSON>`.
pub fn encode_screen_position(position: &Point) -> Result<String, CodecError> {
    let payload = PositionPayload {
        x: position.x,
        y: position.y,
    };
    let json = serde_json::to_string(&payload)?;
    Ok(format!("{}{}", POSITION_PREFIX, urlencoding::encode(&json)))
}

/// Parses a screen-position override. Accepts the prefixed form
/// `pos1.<urlencoded-JSON>`, bare JSON, or a comma-separated `x,y` pair.
pub fn decode_screen_position(input: &str) -> Result<Point, CodecError> {
    if let Some(payload) = input.strip_prefix(POSITION_PREFIX) {
        let json = urlencoding::decode(payload).map_err(|_| CodecError::UrlDecode)?;
        let position: PositionPayload = serde_json::from_str(&json)?;
        return Ok(Point::new(position.x, position.y));
    }
    if let Ok(position) = serde_json::from_str::<PositionPayload>(input) {
        return Ok(Point::new(position.x, position.y));
    }
    if let Some((x, y)) = input.split_once(',') {
        if let (Ok(x), Ok(y)) = (x.trim().parse::<f64>(), y.trim().parse::<f64>()) {
            return Ok(Point::new(x, y));
        }
    }
    Err(CodecError::InvalidPosition)
}
