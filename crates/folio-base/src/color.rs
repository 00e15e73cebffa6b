use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 24-bit sRGB colour written as `0xRRGGBB`, or `"#rrggbb"` in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HexColor(pub u32);

impl HexColor {
    pub const WHITE: Self = Self(0xffffff);

    pub const fn rgb(self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        ]
    }

    pub fn to_linear(self) -> [f32; 3] {
        self.rgb().map(srgb_to_linear)
    }

    pub fn parse(text: &str) -> Option<Self> {
        let digits = text
            .trim()
            .strip_prefix('#')
            .or_else(|| text.trim().strip_prefix("0x"))
            .unwrap_or(text.trim());
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self)
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) if value <= 0xffffff => Ok(Self(value)),
            Raw::Number(value) => Err(serde::de::Error::custom(format!(
                "colour {value:#x} exceeds 0xffffff"
            ))),
            Raw::Text(text) => Self::parse(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid colour {text:?}"))),
        }
    }
}

pub fn srgb_to_linear(value: u8) -> f32 {
    let c = value as f32 / 255.0;
    c.powf(2.2)
}
